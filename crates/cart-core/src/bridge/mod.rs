//! Cartridge bus bridge: one owned controller stepped once per clock tick.
//!
//! Each tick runs the same sequence:
//! 1. Sample the raw pins through the synchronizers
//! 2. Hold in `Init` while reset is asserted, otherwise run one transition
//! 3. Clock the store port exactly once and fold in any completion
//! 4. Drive or release the address/data lines

use log::{debug, trace};

use crate::mailbox::Block;
use crate::state::AccessAction;
use crate::{
    validate_access, AccessDirection, AccessState, AnomalyCode, Arbiter, BackingStore,
    BridgeConfig, BusAddress, BusInputs, BusOutput, BusPins, BusSampler, Completion,
    CustomSource, DiagCounters, LogRing, MemoryRegion, PatternSource, Register, RegisterError,
    SharedMailbox, SimulatedStore, Synchronizer, TriStateBus, UNMAPPED_READ_VALUE,
};

/// The bus-facing half of the device.
///
/// Owns every piece of mutable bus state: the access state machine, the
/// latched address, the arbiter and its store, the log ring, diagnostic
/// counters and the bus side of the mailbox window.
pub struct CartBridge<S: BackingStore = SimulatedStore> {
    config: BridgeConfig,
    sampler: BusSampler,
    state: AccessState,
    addr_high: u16,
    address: BusAddress,
    direction: Option<AccessDirection>,
    store_pending: bool,
    read_latch: u16,
    arbiter: Arbiter,
    log: LogRing,
    log_index: Synchronizer<u32>,
    diag: DiagCounters,
    mailbox: SharedMailbox,
    custom: Box<dyn CustomSource>,
    store: S,
    ticks: u64,
}

impl Default for CartBridge<SimulatedStore> {
    fn default() -> Self {
        Self::new(BridgeConfig::default(), SimulatedStore::default())
    }
}

impl<S: BackingStore> CartBridge<S> {
    /// Creates a bridge in power-up reset, serving the custom window from
    /// the word-index test pattern.
    #[must_use]
    pub fn new(config: BridgeConfig, store: S) -> Self {
        Self {
            config,
            sampler: BusSampler::new(),
            state: AccessState::Init,
            addr_high: 0,
            address: BusAddress::default(),
            direction: None,
            store_pending: false,
            read_latch: 0,
            arbiter: Arbiter::new(&config),
            log: LogRing::new(config.log_revision),
            log_index: Synchronizer::new(0),
            diag: DiagCounters::new(),
            mailbox: SharedMailbox::new(),
            custom: Box::new(PatternSource),
            store,
            ticks: 0,
        }
    }

    /// Replaces the custom window's data source.
    #[must_use]
    pub fn with_custom_source(mut self, source: impl CustomSource + 'static) -> Self {
        self.custom = Box::new(source);
        self
    }

    /// Attaches the bus side to an existing mailbox window.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: SharedMailbox) -> Self {
        self.mailbox = mailbox;
        self
    }

    /// Current configuration, including register writes made since creation.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current access state.
    #[must_use]
    pub const fn state(&self) -> AccessState {
        self.state
    }

    /// Address of the current (or most recent) beat.
    #[must_use]
    pub const fn address(&self) -> BusAddress {
        self.address
    }

    /// Ticks clocked since creation.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Deadline-miss log.
    #[must_use]
    pub const fn log(&self) -> &LogRing {
        &self.log
    }

    /// Anomaly counters.
    #[must_use]
    pub const fn diag(&self) -> &DiagCounters {
        &self.diag
    }

    /// Clears the anomaly counters.
    pub fn reset_diagnostics(&mut self) {
        self.diag.reset();
    }

    /// Handle to the mailbox window for the other party.
    #[must_use]
    pub const fn mailbox(&self) -> &SharedMailbox {
        &self.mailbox
    }

    /// Request arbiter.
    #[must_use]
    pub const fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mutable backing store, for preloading images or changing latency.
    #[allow(clippy::missing_const_for_fn)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Log write index as seen from the register file's clock domain.
    #[must_use]
    pub fn log_index(&self) -> u32 {
        self.log_index.observed()
    }

    /// Reads a status/config register.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::UnknownOffset`] when no register lives at
    /// `offset`.
    pub fn read_register(&self, offset: u32) -> Result<u32, RegisterError> {
        Ok(match Register::from_offset(offset)? {
            Register::LogIndex => self.log_index(),
            Register::LogThreshold => self.arbiter.threshold(),
            Register::HeaderOverride => self.arbiter.header_override(),
        })
    }

    /// Writes a status/config register.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::UnknownOffset`] for unknown offsets and
    /// [`RegisterError::ReadOnly`] for the log index.
    pub fn write_register(&mut self, offset: u32, value: u32) -> Result<(), RegisterError> {
        match Register::from_offset(offset)? {
            Register::LogIndex => return Err(RegisterError::ReadOnly { offset }),
            Register::LogThreshold => {
                self.config.log_threshold = value;
                self.arbiter.set_threshold(value);
            }
            Register::HeaderOverride => {
                self.config.header_override = value;
                self.arbiter.set_header_override(value);
            }
        }
        debug!("register {offset:#04x} <- {value:#010x}");
        Ok(())
    }

    /// Clocks the bridge once with the raw pin levels for this tick.
    pub fn tick(&mut self, pins: &BusPins) -> BusOutput {
        self.ticks = self.ticks.wrapping_add(1);
        let inputs = self.sampler.sample(pins);
        let index = u32::try_from(self.log.write_index()).unwrap_or(u32::MAX);
        self.log_index.push(index);

        if inputs.running {
            self.step(inputs);
        } else {
            self.hold_in_reset();
        }

        if let Some(completion) = self.arbiter.clock(&mut self.store, &mut self.log) {
            self.complete(completion);
        }

        BusOutput {
            ad: self.output(),
            state: self.state,
            log_strobe: self.arbiter.log_strobe(),
        }
    }

    fn hold_in_reset(&mut self) {
        if self.state != AccessState::Init {
            debug!("reset asserted in {:?}", self.state);
        }
        self.arbiter.reset();
        self.state = AccessState::Init;
        self.direction = None;
        self.store_pending = false;
    }

    fn step(&mut self, inputs: BusInputs) {
        let (next, action) = self.state.transition(inputs, self.store_pending);
        if next != self.state {
            trace!("{:?} -> {next:?}", self.state);
        }
        self.state = next;
        match action {
            AccessAction::Hold => {}
            AccessAction::LatchHigh(high) => self.addr_high = high,
            AccessAction::LatchLow(low) => {
                self.address = BusAddress::from_halves(self.addr_high, low);
                self.direction = None;
                trace!(
                    "latched {:#010x} ({:?})",
                    self.address.get(),
                    self.address.region()
                );
            }
            AccessAction::BeginRead => self.begin_read(),
            AccessAction::BeginWrite(data) => self.begin_write(data),
            AccessAction::Advance => self.address = self.address.next_word(),
            AccessAction::Terminate => self.direction = None,
            AccessAction::Resync => {
                debug!("address strobes out of order, resynchronizing");
                self.direction = None;
                self.diag.record(AnomalyCode::ProtocolResync, self.address.get());
            }
        }
    }

    fn begin_read(&mut self) {
        self.direction = Some(AccessDirection::Read);
        let region = self.address.region();
        let offset = self.address.local_offset();
        if let Err(code) = validate_access(region, AccessDirection::Read) {
            debug!("{code} at {:#010x}", self.address.get());
            self.diag.record(code, self.address.get());
            self.finish_read(UNMAPPED_READ_VALUE);
            return;
        }
        let word = match region {
            MemoryRegion::BackingStore => match self.arbiter.request_read(offset) {
                Some(word) => word,
                None => {
                    self.store_pending = true;
                    return;
                }
            },
            MemoryRegion::Custom => self.custom.read16(offset),
            MemoryRegion::MailboxRead => self
                .mailbox
                .with(|window| window.bus_read16(Block::Tx, offset)),
            MemoryRegion::MailboxWrite | MemoryRegion::Unmapped => UNMAPPED_READ_VALUE,
        };
        self.finish_read(word);
    }

    fn begin_write(&mut self, data: u16) {
        self.direction = Some(AccessDirection::Write);
        let region = self.address.region();
        let offset = self.address.local_offset();
        if let Err(code) = validate_access(region, AccessDirection::Write) {
            debug!("{code} at {:#010x}, dropping {data:#06x}", self.address.get());
            self.diag.record(code, self.address.get());
            self.finish_write();
            return;
        }
        match region {
            MemoryRegion::BackingStore => {
                self.arbiter.request_write(offset, data);
                self.store_pending = true;
                return;
            }
            MemoryRegion::Custom => self.custom.write16(offset, data),
            MemoryRegion::MailboxWrite => self
                .mailbox
                .with(|window| window.bus_write16(Block::Rx, offset, data)),
            MemoryRegion::MailboxRead | MemoryRegion::Unmapped => {}
        }
        self.finish_write();
    }

    fn finish_read(&mut self, word: u16) {
        self.read_latch = word;
        self.state = AccessState::WaitReadBeat;
        self.diag.record_beat();
    }

    fn finish_write(&mut self) {
        self.state = AccessState::WaitWriteBeat;
        self.diag.record_beat();
    }

    fn complete(&mut self, completion: Completion) {
        if !self.store_pending {
            return;
        }
        self.store_pending = false;
        match completion {
            Completion::Read { data, logged, .. } => {
                if logged.is_some() {
                    self.diag
                        .record(AnomalyCode::DeadlineMiss, self.address.get());
                }
                self.finish_read(data);
            }
            Completion::WriteDone => self.finish_write(),
            Completion::TimedOut { .. } => {
                self.diag
                    .record(AnomalyCode::StoreTimeout, self.address.get());
                self.direction = None;
                self.state = AccessState::Start;
            }
        }
    }

    fn output(&self) -> TriStateBus {
        let reading = self.direction == Some(AccessDirection::Read);
        match self.state {
            AccessState::WaitReadWrite | AccessState::WaitReadBeat if reading => {
                TriStateBus::driven(self.read_latch)
            }
            _ => TriStateBus::floating(),
        }
    }
}
