//! Public configuration and per-tick output contracts of the bridge.

use crate::{AccessState, LogRevision, TriStateBus, DEFAULT_DEADLINE_CYCLES};

/// Top-level configuration for a bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BridgeConfig {
    /// Store read latency, in cycles, beyond which a log entry is appended.
    pub log_threshold: u32,
    /// First-word override value; zero disables the override.
    pub header_override: u32,
    /// Log ring depth.
    pub log_revision: LogRevision,
    /// Cycles after which an unanswered store request is abandoned.
    ///
    /// `None` waits forever.
    pub store_timeout: Option<u32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_threshold: DEFAULT_DEADLINE_CYCLES,
            header_override: 0,
            log_revision: LogRevision::Standard,
            store_timeout: None,
        }
    }
}

impl BridgeConfig {
    /// Number of log ring slots implied by [`Self::log_revision`].
    #[must_use]
    pub const fn log_capacity(&self) -> usize {
        self.log_revision.capacity()
    }
}

/// Externally visible result of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusOutput {
    /// Address/data lines as driven (or released) by the bridge.
    pub ad: TriStateBus,
    /// Access state after the tick.
    pub state: AccessState,
    /// Single-cycle strobe raised when a log entry was appended.
    pub log_strobe: bool,
}
