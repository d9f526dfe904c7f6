use crate::BusInputs;

/// Phase of the bus access state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessState {
    /// Held while reset is asserted.
    #[default]
    Init,
    /// Idle between transactions.
    Start,
    /// Both address strobes seen; high half on the bus.
    WaitAddrHigh,
    /// High half latched; waiting for both strobes to drop.
    WaitAddrLow,
    /// Address latched; waiting for a read or write strobe.
    WaitReadWrite,
    /// Read datum presented; waiting for the read strobe to release.
    WaitReadBeat,
    /// Write committed; waiting for the write strobe to release.
    WaitWriteBeat,
}

/// Side effect requested by one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessAction {
    /// Nothing to do.
    Hold,
    /// Latch the high address half.
    LatchHigh(u16),
    /// Latch the low address half and assemble the address.
    LatchLow(u16),
    /// Start a read beat at the current address.
    BeginRead,
    /// Start a write beat of the sampled datum at the current address.
    BeginWrite(u16),
    /// Beat released; move to the next 16-bit word.
    Advance,
    /// Access closed by an address strobe.
    Terminate,
    /// Strobes arrived out of order; abandon the transaction.
    Resync,
}

impl AccessState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Init,
        Self::Start,
        Self::WaitAddrHigh,
        Self::WaitAddrLow,
        Self::WaitReadWrite,
        Self::WaitReadBeat,
        Self::WaitWriteBeat,
    ];

    /// Returns `true` while an address has been latched and beats may run.
    #[must_use]
    pub const fn is_data_phase(self) -> bool {
        matches!(
            self,
            Self::WaitReadWrite | Self::WaitReadBeat | Self::WaitWriteBeat
        )
    }

    /// Transition for one tick with reset released.
    ///
    /// `beat_in_flight` holds the machine in `WaitReadWrite` while a store
    /// request is outstanding; completion promotes it to a beat state.
    #[must_use]
    pub const fn transition(self, inputs: BusInputs, beat_in_flight: bool) -> (Self, AccessAction) {
        match self {
            Self::Init => (Self::Start, AccessAction::Hold),
            Self::Start if inputs.both_strobes() => (Self::WaitAddrHigh, AccessAction::Hold),
            Self::WaitAddrHigh if inputs.no_strobe() => (Self::Start, AccessAction::Resync),
            Self::WaitAddrHigh if !inputs.both_strobes() => {
                (Self::WaitAddrLow, AccessAction::LatchHigh(inputs.ad))
            }
            Self::WaitAddrLow if inputs.no_strobe() => {
                (Self::WaitReadWrite, AccessAction::LatchLow(inputs.ad))
            }
            Self::WaitAddrLow if inputs.both_strobes() => (Self::Start, AccessAction::Resync),
            Self::WaitReadWrite if beat_in_flight => (Self::WaitReadWrite, AccessAction::Hold),
            Self::WaitReadWrite if inputs.read => (Self::WaitReadWrite, AccessAction::BeginRead),
            Self::WaitReadWrite if inputs.write => {
                (Self::WaitReadWrite, AccessAction::BeginWrite(inputs.ad))
            }
            Self::WaitReadWrite if inputs.aleh => (Self::Start, AccessAction::Terminate),
            Self::WaitReadBeat if !inputs.read => (Self::WaitReadWrite, AccessAction::Advance),
            Self::WaitWriteBeat if !inputs.write => (Self::WaitReadWrite, AccessAction::Advance),
            Self::WaitReadBeat | Self::WaitWriteBeat if inputs.any_strobe() => {
                (Self::Start, AccessAction::Terminate)
            }
            state => (state, AccessAction::Hold),
        }
    }
}
