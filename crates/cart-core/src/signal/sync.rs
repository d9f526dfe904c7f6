//! Two-stage synchronizer for externally sourced signals.

/// Number of register stages between a raw pin and its first use.
///
/// Every externally sourced signal is observed exactly this many ticks after
/// it changes at the pin.
pub const SYNC_STAGES: usize = 2;

/// Fixed-latency delay line modelling a double-registered input.
///
/// A value pushed on tick `t` is returned by the push on tick `t + SYNC_STAGES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Synchronizer<T: Copy> {
    stages: [T; SYNC_STAGES],
}

impl<T: Copy> Synchronizer<T> {
    /// Creates a synchronizer with every stage holding `initial`.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(initial: T) -> Self {
        Self {
            stages: [initial; SYNC_STAGES],
        }
    }

    /// Clocks `raw` into the first stage and returns the value leaving the last.
    pub fn push(&mut self, raw: T) -> T {
        let out = self.stages[SYNC_STAGES - 1];
        self.stages.copy_within(0..SYNC_STAGES - 1, 1);
        self.stages[0] = raw;
        out
    }

    /// Returns the value that the next push will emit, without clocking.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn observed(&self) -> T {
        self.stages[SYNC_STAGES - 1]
    }

    /// Forces every stage to `value`.
    pub fn fill(&mut self, value: T) {
        self.stages = [value; SYNC_STAGES];
    }
}
