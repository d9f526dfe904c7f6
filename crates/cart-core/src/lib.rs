//! Bus-side core of the cartridge bridge.

/// Pin synchronizers, the sampled pin view and the tri-state bus value.
pub mod signal;
pub use signal::{
    BusDirection, BusInputs, BusPins, BusSampler, Synchronizer, TriStateBus, SYNC_STAGES,
};

/// Address map, region decoder and access policy.
pub mod memory;
pub use memory::{
    decode_memory_region, region_selector, swap_byte_lanes, validate_access, AccessDirection,
    BusAddress, CustomSource, MemoryRegion, PatternSource, RegionDescriptor, SramSource,
    CART_WINDOW_END, CART_WINDOW_START, CUSTOM_END, CUSTOM_OFFSET_MASK, CUSTOM_START,
    FIXED_MEMORY_REGIONS, MAILBOX_READ_END, MAILBOX_READ_START, MAILBOX_WINDOW_BYTES,
    MAILBOX_WRITE_END, MAILBOX_WRITE_START, STORE_END, STORE_OFFSET_MASK, STORE_START,
    STORE_WINDOW_BYTES, UNMAPPED_READ_VALUE,
};

/// Taxonomy of locally absorbed bus anomalies.
pub mod anomaly;
pub use anomaly::{AnomalyClass, AnomalyCode};

/// Saturating anomaly counters.
pub mod diag;
pub use diag::DiagCounters;

/// Deadline-miss log ring.
pub mod log_ring;
pub use log_ring::{LogEntry, LogRevision, LogRing};

/// Backing-store port and a simulated store.
pub mod store;
pub use store::{
    BackingStore, SimulatedStore, StoreCommand, StoreOp, StoreResponse, STORE_ADDRESSABLE_BYTES,
};

/// Store request arbiter.
pub mod arbiter;
pub use arbiter::{Arbiter, Completion, DEFAULT_DEADLINE_CYCLES, N64_BOOT_HEADER};

/// Public configuration and per-tick output types.
pub mod api;
pub use api::{BridgeConfig, BusOutput};

/// Status and configuration register file.
pub mod registers;
pub use registers::{
    Register, RegisterError, REG_HEADER_OVERRIDE, REG_LOG_INDEX, REG_LOG_THRESHOLD,
};

/// Bus access state machine.
pub mod state;
pub use state::{AccessAction, AccessState};

/// Mailbox shared window.
pub mod mailbox;
pub use mailbox::{
    Block, MailboxState, MailboxWindow, SharedMailbox, BLOCK_WORDS, LENGTH_OFFSET, MAILBOX_WORDS,
    PAYLOAD_BYTES, PAYLOAD_OFFSET, PAYLOAD_WORDS, RX_LENGTH, RX_PAYLOAD, RX_STATE, RX_STATE_RECV,
    STATE_OFFSET, STATE_RECV_OFFSET, TX_LENGTH, TX_PAYLOAD, TX_STATE, TX_STATE_RECV,
};

/// The clocked bridge controller.
pub mod bridge;
pub use bridge::CartBridge;

/// Console-side pin driver for exercising a bridge.
pub mod testbench;
pub use testbench::{BusMaster, DEFAULT_STROBE_TICKS, HOLD_TICKS};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
