use thiserror::Error;

/// Failures surfaced by the mailbox link and the command protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LinkError {
    /// The peer did not move its state register within the wait policy.
    ///
    /// The handshake is left mid-cycle; both parties must reopen the
    /// channel before it can be used again.
    #[error("peer did not answer after {polls} polls")]
    ChannelTimeout {
        /// Polls spent waiting.
        polls: u64,
    },
    /// A message does not fit in one mailbox payload.
    #[error("payload of {len} bytes exceeds the {max}-byte mailbox")]
    PayloadTooLarge {
        /// Requested payload length in bytes.
        len: usize,
        /// Mailbox capacity in bytes.
        max: usize,
    },
    /// The peer published a length larger than the payload area.
    #[error("mailbox length field of {words} words exceeds {max} words")]
    MalformedLength {
        /// Published length in words.
        words: u32,
        /// Payload capacity in words.
        max: usize,
    },
    /// A peek or poke length is not a whole number of 32-bit words.
    #[error("length {len} is not a multiple of 4 bytes")]
    UnalignedLength {
        /// Offending length in bytes.
        len: usize,
    },
    /// A peek reply did not carry exactly the requested bytes.
    #[error("expected a {expected}-byte reply, received {received} bytes")]
    UnexpectedReply {
        /// Bytes requested by the chunk.
        expected: usize,
        /// Bytes actually received.
        received: usize,
    },
    /// A message did not decode to a known command.
    #[error("unrecognized command (type tag {tag})")]
    InvalidCommand {
        /// Type tag found in the message, zero when the message was too short.
        tag: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::LinkError;

    #[test]
    fn messages_name_the_offending_values() {
        assert_eq!(
            LinkError::ChannelTimeout { polls: 12 }.to_string(),
            "peer did not answer after 12 polls"
        );
        assert_eq!(
            LinkError::PayloadTooLarge { len: 300, max: 244 }.to_string(),
            "payload of 300 bytes exceeds the 244-byte mailbox"
        );
        assert_eq!(
            LinkError::InvalidCommand { tag: 9 }.to_string(),
            "unrecognized command (type tag 9)"
        );
    }
}
