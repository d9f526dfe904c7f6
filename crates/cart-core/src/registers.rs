//! Status and configuration registers exposed to the external controller.

use thiserror::Error;

/// Byte offset of the read-only log write index.
pub const REG_LOG_INDEX: u32 = 0x00;
/// Byte offset of the deadline threshold, in cycles.
pub const REG_LOG_THRESHOLD: u32 = 0x04;
/// Byte offset of the first-word override value.
pub const REG_HEADER_OVERRIDE: u32 = 0x08;

/// Register-file access failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RegisterError {
    /// No register lives at the offset.
    #[error("no register at offset {offset:#04x}")]
    UnknownOffset {
        /// Offending byte offset.
        offset: u32,
    },
    /// The register cannot be written.
    #[error("register at offset {offset:#04x} is read-only")]
    ReadOnly {
        /// Offending byte offset.
        offset: u32,
    },
}

/// Named register of the status/config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Register {
    /// Current log write index, synchronized into the reader's domain.
    LogIndex,
    /// Deadline threshold in cycles (default 6).
    LogThreshold,
    /// First-word override value (0 disables).
    HeaderOverride,
}

impl Register {
    /// Resolves a byte offset.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::UnknownOffset`] for offsets with no register.
    pub const fn from_offset(offset: u32) -> Result<Self, RegisterError> {
        match offset {
            REG_LOG_INDEX => Ok(Self::LogIndex),
            REG_LOG_THRESHOLD => Ok(Self::LogThreshold),
            REG_HEADER_OVERRIDE => Ok(Self::HeaderOverride),
            _ => Err(RegisterError::UnknownOffset { offset }),
        }
    }

    /// Byte offset of the register.
    #[must_use]
    pub const fn offset(self) -> u32 {
        match self {
            Self::LogIndex => REG_LOG_INDEX,
            Self::LogThreshold => REG_LOG_THRESHOLD,
            Self::HeaderOverride => REG_HEADER_OVERRIDE,
        }
    }

    /// Returns `true` when the controller may write the register.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::LogIndex)
    }
}

#[cfg(test)]
mod tests {
    use super::{Register, RegisterError, REG_HEADER_OVERRIDE, REG_LOG_INDEX, REG_LOG_THRESHOLD};

    #[test]
    fn offsets_resolve_to_their_registers() {
        for register in [
            Register::LogIndex,
            Register::LogThreshold,
            Register::HeaderOverride,
        ] {
            assert_eq!(Register::from_offset(register.offset()), Ok(register));
        }
        assert_eq!(
            [REG_LOG_INDEX, REG_LOG_THRESHOLD, REG_HEADER_OVERRIDE],
            [0x00, 0x04, 0x08]
        );
    }

    #[test]
    fn unknown_offset_is_rejected() {
        assert_eq!(
            Register::from_offset(0x0C),
            Err(RegisterError::UnknownOffset { offset: 0x0C })
        );
        assert_eq!(
            RegisterError::ReadOnly { offset: 0 }.to_string(),
            "register at offset 0x00 is read-only"
        );
    }

    #[test]
    fn only_the_log_index_is_read_only() {
        assert!(!Register::LogIndex.is_writable());
        assert!(Register::LogThreshold.is_writable());
        assert!(Register::HeaderOverride.is_writable());
    }
}
