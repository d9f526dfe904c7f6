//! Saturating diagnostic counters for absorbed bus anomalies.

use crate::AnomalyCode;

/// Counters visible to the external controller alongside the log ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagCounters {
    /// The most recent anomaly, if any.
    pub last_anomaly: Option<AnomalyCode>,
    /// Bus address of the access that raised the most recent anomaly.
    pub last_anomaly_address: u32,
    /// Store reads that exceeded the deadline.
    pub deadline_misses: u32,
    /// Store requests abandoned by the bounded wait.
    pub store_timeouts: u32,
    /// Reads answered with the idle value.
    pub unserviced_reads: u32,
    /// Writes dropped without effect.
    pub dropped_writes: u32,
    /// Accesses abandoned by an early address strobe.
    pub resyncs: u32,
    /// Completed 16-bit beats of any direction.
    pub beats: u32,
}

impl DiagCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one anomaly raised by the access at `address`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record(&mut self, code: AnomalyCode, address: u32) {
        self.last_anomaly = Some(code);
        self.last_anomaly_address = address;
        let counter = match code {
            AnomalyCode::DeadlineMiss => &mut self.deadline_misses,
            AnomalyCode::StoreTimeout => &mut self.store_timeouts,
            AnomalyCode::UnmappedRead | AnomalyCode::WriteOnlyRead => &mut self.unserviced_reads,
            AnomalyCode::UnmappedWrite | AnomalyCode::ReadOnlyWrite => &mut self.dropped_writes,
            AnomalyCode::ProtocolResync => &mut self.resyncs,
        };
        *counter = counter.saturating_add(1);
    }

    /// Counts one completed beat.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_beat(&mut self) {
        self.beats = self.beats.saturating_add(1);
    }

    /// Resets every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
