//! Address map, access policy and custom-window sources.

/// Region access policy and byte-lane helpers.
pub mod access;
/// Custom-window data sources.
pub mod custom;
/// Fixed address map and region decoder.
pub mod map;

pub use access::{swap_byte_lanes, validate_access, AccessDirection};
pub use custom::{CustomSource, PatternSource, SramSource};
pub use map::{
    decode_memory_region, region_selector, BusAddress, MemoryRegion, RegionDescriptor,
    CART_WINDOW_END, CART_WINDOW_START, CUSTOM_END, CUSTOM_OFFSET_MASK, CUSTOM_START,
    FIXED_MEMORY_REGIONS, MAILBOX_READ_END, MAILBOX_READ_START, MAILBOX_WINDOW_BYTES,
    MAILBOX_WRITE_END, MAILBOX_WRITE_START, STORE_END, STORE_OFFSET_MASK, STORE_START,
    STORE_WINDOW_BYTES, UNMAPPED_READ_VALUE,
};
