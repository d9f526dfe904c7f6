//! Pin synchronization and the shared address/data line model.

/// Pin bundle and the double-registering bus sampler.
pub mod sampler;
/// Fixed-latency two-stage synchronizer.
pub mod sync;
/// Value-with-enable model of the multiplexed lines.
pub mod tristate;

pub use sampler::{BusInputs, BusPins, BusSampler};
pub use sync::{Synchronizer, SYNC_STAGES};
pub use tristate::{BusDirection, TriStateBus};
