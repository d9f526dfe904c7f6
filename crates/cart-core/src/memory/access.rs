//! Per-region access policy and byte-lane helpers.

use crate::{AnomalyCode, MemoryRegion};

/// Direction of one bus beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessDirection {
    /// Console reads a 16-bit word from the device.
    Read,
    /// Console writes a 16-bit word to the device.
    Write,
}

/// Validates that `region` services beats in `direction`.
///
/// Reads are serviced by the custom, store and mailbox-read windows; writes
/// by the custom, store and mailbox-write windows. Rejected beats are not
/// errors on the bus: reads return the idle value and writes are dropped.
///
/// # Errors
///
/// Returns the [`AnomalyCode`] that is counted for the rejected beat.
pub const fn validate_access(
    region: MemoryRegion,
    direction: AccessDirection,
) -> Result<(), AnomalyCode> {
    match (region, direction) {
        (
            MemoryRegion::Custom | MemoryRegion::BackingStore | MemoryRegion::MailboxRead,
            AccessDirection::Read,
        )
        | (
            MemoryRegion::Custom | MemoryRegion::BackingStore | MemoryRegion::MailboxWrite,
            AccessDirection::Write,
        ) => Ok(()),
        (MemoryRegion::MailboxWrite, AccessDirection::Read) => Err(AnomalyCode::WriteOnlyRead),
        (MemoryRegion::MailboxRead, AccessDirection::Write) => Err(AnomalyCode::ReadOnlyWrite),
        (MemoryRegion::Unmapped, AccessDirection::Read) => Err(AnomalyCode::UnmappedRead),
        (MemoryRegion::Unmapped, AccessDirection::Write) => Err(AnomalyCode::UnmappedWrite),
    }
}

/// Reverses the two byte lanes of a bus word.
///
/// The backing store is little-endian per 16-bit lane while the console bus
/// is big-endian.
#[must_use]
pub const fn swap_byte_lanes(word: u16) -> u16 {
    word.swap_bytes()
}

#[cfg(test)]
mod tests {
    use super::{swap_byte_lanes, validate_access, AccessDirection};
    use crate::{AnomalyCode, MemoryRegion};
    use rstest::rstest;

    #[rstest]
    #[case(MemoryRegion::Custom, AccessDirection::Read, Ok(()))]
    #[case(MemoryRegion::Custom, AccessDirection::Write, Ok(()))]
    #[case(MemoryRegion::BackingStore, AccessDirection::Read, Ok(()))]
    #[case(MemoryRegion::BackingStore, AccessDirection::Write, Ok(()))]
    #[case(MemoryRegion::MailboxRead, AccessDirection::Read, Ok(()))]
    #[case(
        MemoryRegion::MailboxRead,
        AccessDirection::Write,
        Err(AnomalyCode::ReadOnlyWrite)
    )]
    #[case(
        MemoryRegion::MailboxWrite,
        AccessDirection::Read,
        Err(AnomalyCode::WriteOnlyRead)
    )]
    #[case(MemoryRegion::MailboxWrite, AccessDirection::Write, Ok(()))]
    #[case(
        MemoryRegion::Unmapped,
        AccessDirection::Read,
        Err(AnomalyCode::UnmappedRead)
    )]
    #[case(
        MemoryRegion::Unmapped,
        AccessDirection::Write,
        Err(AnomalyCode::UnmappedWrite)
    )]
    fn access_policy_matches_region_table(
        #[case] region: MemoryRegion,
        #[case] direction: AccessDirection,
        #[case] expected: Result<(), AnomalyCode>,
    ) {
        assert_eq!(validate_access(region, direction), expected);
    }

    #[test]
    fn lane_swap_reverses_bytes() {
        assert_eq!(swap_byte_lanes(0x8037), 0x3780);
        assert_eq!(swap_byte_lanes(swap_byte_lanes(0x1234)), 0x1234);
    }
}
