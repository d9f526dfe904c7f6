//! Cartridge address map and the pure region decoder.

/// Inclusive start of the custom (data generator / SRAM) window.
pub const CUSTOM_START: u32 = 0x0800_0000;
/// Inclusive end of the custom window.
pub const CUSTOM_END: u32 = 0x0FFF_FFFF;
/// Region-relative offset bits that are meaningful in the custom window.
pub const CUSTOM_OFFSET_MASK: u32 = 0x01FF_FFFF;

/// Base of the cartridge window that hosts the store and the mailbox.
pub const CART_WINDOW_START: u32 = 0x1000_0000;
/// Inclusive end of the cartridge window.
pub const CART_WINDOW_END: u32 = 0x1FFF_FFFF;

/// Size in bytes of the backing-store window (32 MiB).
pub const STORE_WINDOW_BYTES: u32 = 32 * 1024 * 1024;
/// Inclusive start of the backing-store window.
pub const STORE_START: u32 = CART_WINDOW_START;
/// Inclusive end of the backing-store window.
pub const STORE_END: u32 = STORE_START + STORE_WINDOW_BYTES - 1;
/// Region-relative offset bits forwarded to the backing store.
pub const STORE_OFFSET_MASK: u32 = 0x00FF_FFFF;

/// Size in bytes of each mailbox bus window.
pub const MAILBOX_WINDOW_BYTES: u32 = 0x100;
/// Inclusive start of the console-writable mailbox window.
pub const MAILBOX_WRITE_START: u32 = CART_WINDOW_START + 64 * 1024 * 1024;
/// Inclusive end of the console-writable mailbox window.
pub const MAILBOX_WRITE_END: u32 = MAILBOX_WRITE_START + MAILBOX_WINDOW_BYTES - 1;
/// Inclusive start of the console-readable mailbox window.
pub const MAILBOX_READ_START: u32 = MAILBOX_WRITE_END + 1;
/// Inclusive end of the console-readable mailbox window.
pub const MAILBOX_READ_END: u32 = MAILBOX_READ_START + MAILBOX_WINDOW_BYTES - 1;

/// Fixed 16-bit value returned for reads that no region services.
pub const UNMAPPED_READ_VALUE: u16 = 0x0000;

/// Canonical mapped-region descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u32,
    /// Inclusive end address.
    pub end: u32,
}

/// Region classification for a latched 32-bit bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryRegion {
    /// Custom window (`0x0800_0000..=0x0FFF_FFFF`).
    Custom,
    /// Backing-store window (`0x1000_0000..=0x11FF_FFFF`).
    BackingStore,
    /// Console-writable mailbox window (`0x1400_0000..=0x1400_00FF`).
    MailboxWrite,
    /// Console-readable mailbox window (`0x1400_0100..=0x1400_01FF`).
    MailboxRead,
    /// Everything else.
    Unmapped,
}

impl MemoryRegion {
    /// Returns the inclusive bounds of a mapped region.
    #[must_use]
    pub const fn bounds(self) -> Option<(u32, u32)> {
        match self {
            Self::Custom => Some((CUSTOM_START, CUSTOM_END)),
            Self::BackingStore => Some((STORE_START, STORE_END)),
            Self::MailboxWrite => Some((MAILBOX_WRITE_START, MAILBOX_WRITE_END)),
            Self::MailboxRead => Some((MAILBOX_READ_START, MAILBOX_READ_END)),
            Self::Unmapped => None,
        }
    }

    /// Returns `true` when `addr` decodes to this region.
    #[must_use]
    pub const fn contains(self, addr: u32) -> bool {
        matches!(
            (self, decode_memory_region(addr)),
            (Self::Custom, Self::Custom)
                | (Self::BackingStore, Self::BackingStore)
                | (Self::MailboxWrite, Self::MailboxWrite)
                | (Self::MailboxRead, Self::MailboxRead)
                | (Self::Unmapped, Self::Unmapped)
        )
    }

    /// Returns the region-relative offset of `addr`.
    ///
    /// The custom window only honours its low 25 bits; unmapped addresses
    /// have no offset and yield zero.
    #[must_use]
    pub const fn local_offset(self, addr: u32) -> u32 {
        match self {
            Self::Custom => addr & CUSTOM_OFFSET_MASK,
            Self::BackingStore => addr.wrapping_sub(STORE_START),
            Self::MailboxWrite => addr.wrapping_sub(MAILBOX_WRITE_START),
            Self::MailboxRead => addr.wrapping_sub(MAILBOX_READ_START),
            Self::Unmapped => 0,
        }
    }

    /// Returns the canonical descriptor for a mapped region.
    #[must_use]
    pub const fn descriptor(self) -> Option<RegionDescriptor> {
        match self.bounds() {
            Some((start, end)) => Some(RegionDescriptor {
                region: self,
                start,
                end,
            }),
            None => None,
        }
    }
}

const fn mapped(region: MemoryRegion) -> RegionDescriptor {
    match region.descriptor() {
        Some(descriptor) => descriptor,
        None => panic!("unmapped region has no descriptor"),
    }
}

/// Mapped regions in ascending address order.
pub const FIXED_MEMORY_REGIONS: [RegionDescriptor; 4] = [
    mapped(MemoryRegion::Custom),
    mapped(MemoryRegion::BackingStore),
    mapped(MemoryRegion::MailboxWrite),
    mapped(MemoryRegion::MailboxRead),
];

const _: () = assert_fixed_region_layout();

const fn assert_fixed_region_layout() {
    let mut index = 0;
    while index < FIXED_MEMORY_REGIONS.len() {
        let descriptor = FIXED_MEMORY_REGIONS[index];
        assert!(
            descriptor.start <= descriptor.end,
            "region start cannot be greater than end"
        );
        if index > 0 {
            let previous = FIXED_MEMORY_REGIONS[index - 1];
            assert!(
                previous.end < descriptor.start,
                "mapped regions must be ascending and disjoint"
            );
        }
        index += 1;
    }

    assert!(
        STORE_START >= CART_WINDOW_START && MAILBOX_READ_END <= CART_WINDOW_END,
        "store and mailbox windows must sit inside the cartridge window"
    );
    assert!(
        MAILBOX_WRITE_START > STORE_END,
        "mailbox windows must sit above the store window"
    );
}

/// Extracts the 8-bit region selector from a bus address.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn region_selector(addr: u32) -> u8 {
    (addr >> 24) as u8
}

/// Decodes a latched 32-bit bus address into its region.
///
/// First match wins: the custom selector range, then the store and mailbox
/// sub-windows of the cartridge selector range; anything else is unmapped.
#[must_use]
pub const fn decode_memory_region(addr: u32) -> MemoryRegion {
    match region_selector(addr) {
        0x08..=0x0F => MemoryRegion::Custom,
        0x10..=0x1F => match addr {
            STORE_START..=STORE_END => MemoryRegion::BackingStore,
            MAILBOX_WRITE_START..=MAILBOX_WRITE_END => MemoryRegion::MailboxWrite,
            MAILBOX_READ_START..=MAILBOX_READ_END => MemoryRegion::MailboxRead,
            _ => MemoryRegion::Unmapped,
        },
        _ => MemoryRegion::Unmapped,
    }
}

/// A latched bus address assembled from two 16-bit halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusAddress(u32);

impl BusAddress {
    /// Wraps a raw address, forcing 16-bit word alignment.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw & !1)
    }

    /// Concatenates the high half latched first with the low half latched second.
    #[must_use]
    pub const fn from_halves(high: u16, low: u16) -> Self {
        Self::new(((high as u32) << 16) | low as u32)
    }

    /// Raw 32-bit value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Address of the following 16-bit word.
    #[must_use]
    pub const fn next_word(self) -> Self {
        Self(self.0.wrapping_add(2))
    }

    /// Decoded region.
    #[must_use]
    pub const fn region(self) -> MemoryRegion {
        decode_memory_region(self.0)
    }

    /// Region-relative offset.
    #[must_use]
    pub const fn local_offset(self) -> u32 {
        self.region().local_offset(self.0)
    }
}

impl From<BusAddress> for u32 {
    fn from(addr: BusAddress) -> Self {
        addr.0
    }
}
