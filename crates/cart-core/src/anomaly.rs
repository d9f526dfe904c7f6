use thiserror::Error;

/// Coarse grouping of bus anomalies for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AnomalyClass {
    /// Backing-store timing problem.
    Timing,
    /// Beat addressed to a region that does not service it.
    Routing,
    /// Strobe sequence abandoned and resynchronized.
    Protocol,
}

/// Stable taxonomy of conditions the bridge absorbs locally.
///
/// None of these cross the bus boundary; they are counted and, for deadline
/// misses, recorded in the log ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum AnomalyCode {
    /// Store read latency exceeded the configured deadline.
    #[error("backing-store read exceeded its deadline")]
    DeadlineMiss = 0x01,
    /// Store request abandoned after the configured bounded wait.
    #[error("backing-store request timed out")]
    StoreTimeout = 0x02,
    /// Read from an address no region services.
    #[error("read from unmapped address")]
    UnmappedRead = 0x03,
    /// Write to an address no region services.
    #[error("write to unmapped address")]
    UnmappedWrite = 0x04,
    /// Write to the console-readable mailbox window.
    #[error("write to read-only window")]
    ReadOnlyWrite = 0x05,
    /// Read from the console-writable mailbox window.
    #[error("read from write-only window")]
    WriteOnlyRead = 0x06,
    /// Address strobes abandoned an access mid-sequence.
    #[error("bus protocol resynchronized")]
    ProtocolResync = 0x07,
}

impl AnomalyCode {
    /// Converts to the stable byte code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte code back into an anomaly.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::DeadlineMiss),
            0x02 => Some(Self::StoreTimeout),
            0x03 => Some(Self::UnmappedRead),
            0x04 => Some(Self::UnmappedWrite),
            0x05 => Some(Self::ReadOnlyWrite),
            0x06 => Some(Self::WriteOnlyRead),
            0x07 => Some(Self::ProtocolResync),
            _ => None,
        }
    }

    /// Returns the diagnostics class for this anomaly.
    #[must_use]
    pub const fn class(self) -> AnomalyClass {
        match self {
            Self::DeadlineMiss | Self::StoreTimeout => AnomalyClass::Timing,
            Self::UnmappedRead | Self::UnmappedWrite | Self::ReadOnlyWrite | Self::WriteOnlyRead => {
                AnomalyClass::Routing
            }
            Self::ProtocolResync => AnomalyClass::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnomalyClass, AnomalyCode};

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x07 {
            let anomaly = AnomalyCode::from_u8(code).expect("defined taxonomy code");
            assert_eq!(anomaly.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(AnomalyCode::from_u8(0x00).is_none());
        assert!(AnomalyCode::from_u8(0xFF).is_none());
    }

    #[test]
    fn class_mapping_matches_taxonomy() {
        assert_eq!(AnomalyCode::DeadlineMiss.class(), AnomalyClass::Timing);
        assert_eq!(AnomalyCode::StoreTimeout.class(), AnomalyClass::Timing);
        assert_eq!(AnomalyCode::UnmappedWrite.class(), AnomalyClass::Routing);
        assert_eq!(AnomalyCode::WriteOnlyRead.class(), AnomalyClass::Routing);
        assert_eq!(AnomalyCode::ProtocolResync.class(), AnomalyClass::Protocol);
    }

    #[test]
    fn display_text_is_human_readable() {
        assert_eq!(
            AnomalyCode::DeadlineMiss.to_string(),
            "backing-store read exceeded its deadline"
        );
    }
}
