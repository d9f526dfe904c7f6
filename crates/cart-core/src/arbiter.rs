//! Backing-store request arbiter with latency tracking and deadline logging.

use log::{trace, warn};

use crate::{
    swap_byte_lanes, BackingStore, BridgeConfig, LogEntry, LogRing, StoreCommand, StoreOp,
    StoreResponse, STORE_OFFSET_MASK,
};

/// Default deadline, in cycles, beyond which a store read is logged.
pub const DEFAULT_DEADLINE_CYCLES: u32 = 6;

/// Console boot header commonly placed in the override register.
pub const N64_BOOT_HEADER: u32 = 0x8037_4040;

/// Outcome of one outstanding store request, reported on the edge it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    /// Read data arrived (already in bus byte order).
    Read {
        /// 16-bit datum for the bus.
        data: u16,
        /// Cycles the request was outstanding.
        latency: u32,
        /// Log record appended because `latency` exceeded the deadline.
        logged: Option<LogEntry>,
    },
    /// The store committed the write.
    WriteDone,
    /// The bounded wait expired and the request was abandoned.
    TimedOut {
        /// Cycles waited before giving up.
        latency: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outstanding {
    Read,
    Write,
}

/// Sole client of the store port.
///
/// Turns one bus beat into exactly one store command, counts the cycles it
/// is outstanding and appends the count to the log ring when it exceeds
/// the configured deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbiter {
    threshold: u32,
    header_override: u32,
    timeout: Option<u32>,
    staged: Option<StoreCommand>,
    outstanding: Option<Outstanding>,
    orphaned: bool,
    latency: u32,
    waited: u32,
    log_strobe: bool,
}

impl Arbiter {
    /// Creates an idle arbiter from the bridge configuration.
    #[must_use]
    pub const fn new(config: &BridgeConfig) -> Self {
        Self {
            threshold: config.log_threshold,
            header_override: config.header_override,
            timeout: config.store_timeout,
            staged: None,
            outstanding: None,
            orphaned: false,
            latency: 0,
            waited: 0,
            log_strobe: false,
        }
    }

    /// Deadline in cycles.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Sets the deadline in cycles.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_threshold(&mut self, cycles: u32) {
        self.threshold = cycles;
    }

    /// First-word override value (zero when disabled).
    #[must_use]
    pub const fn header_override(&self) -> u32 {
        self.header_override
    }

    /// Sets the first-word override value; zero disables it.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_header_override(&mut self, value: u32) {
        self.header_override = value;
    }

    /// Cycles the current request has been outstanding.
    #[must_use]
    pub const fn latency(&self) -> u32 {
        self.latency
    }

    /// Cycles the current beat has waited since it was requested.
    ///
    /// Unlike [`Self::latency`] this includes cycles spent staged behind a
    /// late response to an abandoned request; the bounded wait applies to it.
    #[must_use]
    pub const fn waited(&self) -> u32 {
        self.waited
    }

    /// `true` for exactly the cycle in which a log entry was appended.
    #[must_use]
    pub const fn log_strobe(&self) -> bool {
        self.log_strobe
    }

    /// `true` while a request is staged or awaiting its response.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.staged.is_some() || self.outstanding.is_some()
    }

    /// Override decision for a store-relative `offset`.
    ///
    /// The first 32-bit word of the store window is shadowed by the
    /// override register while it is non-zero; its high half answers offset
    /// 0 and its low half offset 2.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn header_word(&self, offset: u32) -> Option<u16> {
        if self.header_override == 0 || offset >= 4 {
            return None;
        }
        if offset & 2 == 0 {
            Some((self.header_override >> 16) as u16)
        } else {
            Some(self.header_override as u16)
        }
    }

    /// Starts a read beat at store-relative `offset`.
    ///
    /// Returns the datum immediately when the override shadows the address;
    /// otherwise stages a store command issued on the next [`Self::clock`].
    pub fn request_read(&mut self, offset: u32) -> Option<u16> {
        if let Some(word) = self.header_word(offset) {
            trace!("header override answers offset {offset:#x} with {word:#06x}");
            return Some(word);
        }
        self.stage(offset, StoreOp::Read, Outstanding::Read);
        None
    }

    /// Starts a write beat of bus-order `data` at store-relative `offset`.
    pub fn request_write(&mut self, offset: u32, data: u16) {
        self.stage(
            offset,
            StoreOp::Write(swap_byte_lanes(data)),
            Outstanding::Write,
        );
    }

    fn stage(&mut self, offset: u32, op: StoreOp, kind: Outstanding) {
        self.staged = Some(StoreCommand {
            addr: offset & STORE_OFFSET_MASK,
            op,
        });
        self.outstanding = Some(kind);
        self.waited = 0;
    }

    fn wait_expired(&mut self) -> Option<Completion> {
        self.waited = self.waited.saturating_add(1);
        match self.timeout {
            Some(limit) if self.waited >= limit => {
                let latency = self.waited;
                warn!("store request abandoned after {latency} cycles");
                if self.staged.take().is_none() {
                    self.orphaned = true;
                }
                self.outstanding = None;
                self.latency = 0;
                self.waited = 0;
                Some(Completion::TimedOut { latency })
            }
            _ => None,
        }
    }

    /// Clocks the store port once and reports a completion, if any.
    pub fn clock(&mut self, store: &mut dyn BackingStore, log: &mut LogRing) -> Option<Completion> {
        self.log_strobe = false;

        let command = if self.orphaned {
            None
        } else {
            self.staged.take()
        };
        if command.is_some() {
            self.latency = 0;
        }
        let response = store.clock(command);

        if self.orphaned {
            if response != StoreResponse::Pending {
                trace!("absorbed response to abandoned request");
                self.orphaned = false;
            }
            if self.outstanding.is_none() {
                return None;
            }
            return self.wait_expired();
        }

        let Some(kind) = self.outstanding else {
            if response != StoreResponse::Pending {
                warn!("unsolicited store response {response:?}");
            }
            return None;
        };

        match (kind, response) {
            (_, StoreResponse::Pending) => {
                self.latency = self.latency.saturating_add(1);
                self.wait_expired()
            }
            (Outstanding::Read, StoreResponse::ReadData(raw)) => {
                let latency = self.latency;
                self.latency = 0;
                self.waited = 0;
                self.outstanding = None;
                let logged = if latency > self.threshold {
                    self.log_strobe = true;
                    let entry = log.append(latency);
                    warn!(
                        "store read took {latency} cycles (deadline {}), logged in slot {}",
                        self.threshold, entry.slot
                    );
                    Some(entry)
                } else {
                    None
                };
                Some(Completion::Read {
                    data: swap_byte_lanes(raw),
                    latency,
                    logged,
                })
            }
            (Outstanding::Write, StoreResponse::WriteAck) => {
                self.latency = 0;
                self.waited = 0;
                self.outstanding = None;
                Some(Completion::WriteDone)
            }
            (kind, response) => {
                warn!("store answered {response:?} to a {kind:?} request");
                None
            }
        }
    }

    /// Drops any staged or outstanding request.
    ///
    /// A command already accepted by the store still produces a response;
    /// it is absorbed before the next command is issued.
    pub fn reset(&mut self) {
        if self.outstanding.is_some() && self.staged.is_none() {
            self.orphaned = true;
        }
        self.staged = None;
        self.outstanding = None;
        self.latency = 0;
        self.waited = 0;
        self.log_strobe = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{Arbiter, Completion, DEFAULT_DEADLINE_CYCLES, N64_BOOT_HEADER};
    use crate::{BridgeConfig, LogEntry, LogRing, SimulatedStore};
    use rstest::rstest;

    fn run_read(arbiter: &mut Arbiter, store: &mut SimulatedStore, log: &mut LogRing) -> Completion {
        assert_eq!(arbiter.request_read(0x10), None);
        for _ in 0..1000 {
            if let Some(done) = arbiter.clock(store, log) {
                return done;
            }
        }
        panic!("read never completed");
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(DEFAULT_DEADLINE_CYCLES)]
    fn latency_within_deadline_is_not_logged(#[case] latency: u32) {
        let mut arbiter = Arbiter::new(&BridgeConfig::default());
        let mut store = SimulatedStore::new(64, latency);
        let mut log = LogRing::with_capacity(8);

        let done = run_read(&mut arbiter, &mut store, &mut log);
        assert_eq!(
            done,
            Completion::Read {
                data: 0,
                latency,
                logged: None
            }
        );
        assert_eq!(log.write_index(), 0);
        assert!(!arbiter.log_strobe());
    }

    #[rstest]
    #[case(DEFAULT_DEADLINE_CYCLES + 1)]
    #[case(20)]
    fn latency_past_deadline_logs_exactly_once(#[case] latency: u32) {
        let mut arbiter = Arbiter::new(&BridgeConfig::default());
        let mut store = SimulatedStore::new(64, latency);
        let mut log = LogRing::with_capacity(8);

        let done = run_read(&mut arbiter, &mut store, &mut log);
        assert_eq!(
            done,
            Completion::Read {
                data: 0,
                latency,
                logged: Some(LogEntry { slot: 0, latency })
            }
        );
        assert!(arbiter.log_strobe());
        assert_eq!(log.write_index(), 1);
        assert_eq!(log.read(0), Some(latency));

        assert_eq!(arbiter.clock(&mut store, &mut log), None);
        assert!(!arbiter.log_strobe());
        assert_eq!(arbiter.latency(), 0);
    }

    #[test]
    fn reads_and_writes_swap_byte_lanes() {
        let mut arbiter = Arbiter::new(&BridgeConfig::default());
        let mut store = SimulatedStore::new(64, 0);
        let mut log = LogRing::with_capacity(8);

        arbiter.request_write(0x10, 0x1234);
        assert_eq!(
            arbiter.clock(&mut store, &mut log),
            Some(Completion::WriteDone)
        );
        assert_eq!(&store.bytes()[0x10..0x12], &[0x12, 0x34]);

        let done = run_read(&mut arbiter, &mut store, &mut log);
        assert!(matches!(done, Completion::Read { data: 0x1234, .. }));
    }

    #[test]
    fn header_override_shadows_first_word_without_a_command() {
        let config = BridgeConfig {
            header_override: N64_BOOT_HEADER,
            ..BridgeConfig::default()
        };
        let mut arbiter = Arbiter::new(&config);
        assert_eq!(arbiter.request_read(0), Some(0x8037));
        assert_eq!(arbiter.request_read(2), Some(0x4040));
        assert_eq!(arbiter.header_word(4), None);
        assert!(!arbiter.is_busy());

        arbiter.set_header_override(0);
        assert_eq!(arbiter.header_word(0), None);
    }

    #[test]
    fn bounded_wait_abandons_a_stalled_request() {
        let config = BridgeConfig {
            store_timeout: Some(5),
            ..BridgeConfig::default()
        };
        let mut arbiter = Arbiter::new(&config);
        let mut store = SimulatedStore::new(64, 0);
        store.set_stalled(true);
        let mut log = LogRing::with_capacity(8);

        assert_eq!(arbiter.request_read(0x20), None);
        let mut outcome = None;
        for _ in 0..10 {
            outcome = arbiter.clock(&mut store, &mut log);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(Completion::TimedOut { latency: 5 }));
        assert!(!arbiter.is_busy());
    }

    #[test]
    fn bounded_wait_covers_a_beat_staged_behind_an_abandoned_request() {
        let config = BridgeConfig {
            store_timeout: Some(5),
            ..BridgeConfig::default()
        };
        let mut arbiter = Arbiter::new(&config);
        let mut store = SimulatedStore::new(64, 0);
        store.set_stalled(true);
        let mut log = LogRing::with_capacity(8);

        for _ in 0..2 {
            assert_eq!(arbiter.request_read(0x20), None);
            let mut outcome = None;
            for _ in 0..10 {
                outcome = arbiter.clock(&mut store, &mut log);
                if outcome.is_some() {
                    break;
                }
            }
            assert_eq!(outcome, Some(Completion::TimedOut { latency: 5 }));
            assert!(!arbiter.is_busy());
            assert_eq!(arbiter.waited(), 0);
        }
        assert_eq!(store.commands_issued(), 1);
    }

    #[test]
    fn response_to_abandoned_request_is_absorbed_before_next_issue() {
        let mut arbiter = Arbiter::new(&BridgeConfig::default());
        let mut store = SimulatedStore::new(64, 3);
        store.load(0x20, &[0xAA, 0xBB]);
        let mut log = LogRing::with_capacity(8);

        assert_eq!(arbiter.request_read(0x10), None);
        assert_eq!(arbiter.clock(&mut store, &mut log), None);
        arbiter.reset();

        assert_eq!(arbiter.request_read(0x20), None);
        let mut outcome = None;
        for _ in 0..20 {
            outcome = arbiter.clock(&mut store, &mut log);
            if outcome.is_some() {
                break;
            }
        }
        assert!(matches!(outcome, Some(Completion::Read { data: 0xAABB, latency: 3, .. })));
        assert_eq!(store.commands_issued(), 2);
    }
}
