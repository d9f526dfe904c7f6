//! Wire codec for PEEK, POKE and EXECUTE commands.
//!
//! Every field is a big-endian 32-bit word; the first word is the type tag.

use crate::LinkError;

/// Largest chunk of one peek or poke, in 32-bit words.
///
/// A poke chunk plus its two header words fills the 61-word payload.
pub const CHUNK_WORDS: usize = 59;
/// Largest chunk of one peek or poke, in bytes.
pub const CHUNK_BYTES: usize = CHUNK_WORDS * 4;

/// Wire type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandType {
    /// Unknown or malformed command.
    Invalid = 0,
    /// Read memory.
    Peek = 1,
    /// Write memory.
    Poke = 2,
    /// Start execution.
    Execute = 3,
}

impl CommandType {
    /// Wire tag.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decodes a wire tag; unknown tags map to [`Self::Invalid`].
    #[must_use]
    pub const fn from_u32(tag: u32) -> Self {
        match tag {
            1 => Self::Peek,
            2 => Self::Poke,
            3 => Self::Execute,
            _ => Self::Invalid,
        }
    }
}

/// A decoded command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Unknown tag or truncated message; ignored by receivers.
    Invalid,
    /// Reply with `length_words` words starting at `address`.
    Peek {
        /// First byte address.
        address: u32,
        /// Words requested.
        length_words: u32,
    },
    /// Store `data` starting at `address`.
    Poke {
        /// First byte address.
        address: u32,
        /// Bytes to store.
        data: Vec<u8>,
    },
    /// Begin executing at `address`.
    Execute {
        /// Entry address.
        address: u32,
    },
}

fn word_at(bytes: &[u8], index: usize) -> Option<u32> {
    let start = index * 4;
    let word = bytes.get(start..start + 4)?;
    Some(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
}

impl Command {
    /// Wire type of this command.
    #[must_use]
    pub const fn kind(&self) -> CommandType {
        match self {
            Self::Invalid => CommandType::Invalid,
            Self::Peek { .. } => CommandType::Peek,
            Self::Poke { .. } => CommandType::Poke,
            Self::Execute { .. } => CommandType::Execute,
        }
    }

    /// Serializes the command.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.kind().as_u32().to_be_bytes().to_vec();
        match self {
            Self::Invalid => {}
            Self::Peek {
                address,
                length_words,
            } => {
                out.extend_from_slice(&address.to_be_bytes());
                out.extend_from_slice(&length_words.to_be_bytes());
            }
            Self::Poke { address, data } => {
                out.extend_from_slice(&address.to_be_bytes());
                out.extend_from_slice(data);
            }
            Self::Execute { address } => out.extend_from_slice(&address.to_be_bytes()),
        }
        out
    }

    /// Parses a message strictly.
    ///
    /// Trailing bytes after a peek or execute are padding and are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidCommand`] for unknown tags and for
    /// messages too short for their tag.
    pub fn parse(bytes: &[u8]) -> Result<Self, LinkError> {
        let tag = word_at(bytes, 0).ok_or(LinkError::InvalidCommand { tag: 0 })?;
        let invalid = LinkError::InvalidCommand { tag };
        match CommandType::from_u32(tag) {
            CommandType::Invalid => Err(invalid),
            CommandType::Peek => Ok(Self::Peek {
                address: word_at(bytes, 1).ok_or(invalid)?,
                length_words: word_at(bytes, 2).ok_or(invalid)?,
            }),
            CommandType::Poke => Ok(Self::Poke {
                address: word_at(bytes, 1).ok_or(invalid)?,
                data: bytes[8..].to_vec(),
            }),
            CommandType::Execute => Ok(Self::Execute {
                address: word_at(bytes, 1).ok_or(invalid)?,
            }),
        }
    }

    /// Decodes a message, mapping anything unparseable to [`Self::Invalid`].
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        Self::parse(bytes).unwrap_or(Self::Invalid)
    }
}

/// Splits `length` bytes into chunk lengths of at most [`CHUNK_BYTES`].
pub fn chunk_lengths(length: usize) -> impl Iterator<Item = usize> {
    (0..length.div_ceil(CHUNK_BYTES))
        .map(move |index| (length - index * CHUNK_BYTES).min(CHUNK_BYTES))
}
