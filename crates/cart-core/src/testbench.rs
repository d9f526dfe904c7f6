//! Pin-level bus master that drives a bridge the way a console would.

use crate::{AccessState, BackingStore, BusOutput, BusPins, CartBridge, SYNC_STAGES};

/// Ticks each pin level is held so the bridge observes it at least once.
pub const HOLD_TICKS: usize = SYNC_STAGES + 1;

/// Default upper bound, in ticks, on one read or write strobe.
pub const DEFAULT_STROBE_TICKS: usize = 256;

/// Console-side driver producing well-formed strobe sequences.
///
/// Every level change is held for [`HOLD_TICKS`] so it crosses the
/// synchronizers before the next one. Read and write strobes are held
/// until the bridge reports the beat complete or the strobe limit expires.
pub struct BusMaster<'a, S: BackingStore> {
    bridge: &'a mut CartBridge<S>,
    pins: BusPins,
    strobe_ticks: usize,
    last: Option<BusOutput>,
}

impl<'a, S: BackingStore> BusMaster<'a, S> {
    /// Wraps `bridge` with the console holding reset asserted.
    #[must_use]
    pub fn new(bridge: &'a mut CartBridge<S>) -> Self {
        Self {
            bridge,
            pins: BusPins::IN_RESET,
            strobe_ticks: DEFAULT_STROBE_TICKS,
            last: None,
        }
    }

    /// Sets the longest a read or write strobe is held waiting for the beat.
    #[must_use]
    pub const fn with_strobe_ticks(mut self, ticks: usize) -> Self {
        self.strobe_ticks = ticks;
        self
    }

    /// The driven bridge.
    #[allow(clippy::missing_const_for_fn)]
    pub fn bridge(&mut self) -> &mut CartBridge<S> {
        &mut *self.bridge
    }

    /// Output of the most recent tick.
    #[must_use]
    pub const fn last_output(&self) -> Option<BusOutput> {
        self.last
    }

    /// Clocks one tick at the current pin levels.
    pub fn tick(&mut self) -> BusOutput {
        let output = self.bridge.tick(&self.pins);
        self.last = Some(output);
        output
    }

    fn hold(&mut self, pins: BusPins) -> BusOutput {
        self.pins = pins;
        let mut output = self.tick();
        for _ in 1..HOLD_TICKS {
            output = self.tick();
        }
        output
    }

    /// Asserts reset.
    pub fn assert_reset(&mut self) -> BusOutput {
        self.hold(BusPins {
            reset_n: false,
            ..self.pins
        })
    }

    /// Releases reset with the bus idle and waits for `Start`.
    pub fn power_on(&mut self) -> BusOutput {
        self.hold(BusPins::IDLE)
    }

    /// Runs the two-phase address latch sequence for `addr`.
    ///
    /// Follows the console's order: the high strobe drops first with the
    /// high half on the bus, then the low strobe with the low half.
    pub fn latch_address(&mut self, addr: u32) -> BusOutput {
        let [high, low] = split_address(addr);
        self.hold(BusPins {
            aleh: true,
            alel: true,
            ad: high,
            ..BusPins::IDLE
        });
        self.hold(BusPins {
            alel: true,
            ad: high,
            ..BusPins::IDLE
        });
        self.hold(BusPins {
            alel: true,
            ad: low,
            ..BusPins::IDLE
        });
        self.hold(BusPins {
            ad: low,
            ..BusPins::IDLE
        })
    }

    /// Pulses the read strobe once and returns the datum the bridge drove.
    ///
    /// Returns `None` when the bridge never completed the beat within the
    /// strobe limit or left the bus floating.
    pub fn read_beat(&mut self) -> Option<u16> {
        self.pins = BusPins {
            read_n: false,
            ..BusPins::IDLE
        };
        let mut output = self.tick();
        let mut held = 1;
        while output.state != AccessState::WaitReadBeat && held < self.strobe_ticks {
            output = self.tick();
            held += 1;
        }
        let datum = if output.state == AccessState::WaitReadBeat {
            output.ad.driven_value()
        } else {
            None
        };
        self.hold(BusPins::IDLE);
        datum
    }

    /// Pulses the write strobe once with `data` on the bus.
    ///
    /// Returns `true` when the bridge completed the beat within the strobe
    /// limit.
    pub fn write_beat(&mut self, data: u16) -> bool {
        self.pins = BusPins {
            write_n: false,
            ad: data,
            ..BusPins::IDLE
        };
        let mut output = self.tick();
        let mut held = 1;
        while output.state != AccessState::WaitWriteBeat && held < self.strobe_ticks {
            output = self.tick();
            held += 1;
        }
        let done = output.state == AccessState::WaitWriteBeat;
        self.hold(BusPins::IDLE);
        done
    }

    /// Closes the access with a lone high address strobe pulse.
    pub fn end_access(&mut self) -> BusOutput {
        self.hold(BusPins {
            aleh: true,
            ..BusPins::IDLE
        });
        self.hold(BusPins::IDLE)
    }

    /// Reads `words` consecutive 16-bit words starting at `addr`.
    pub fn read_burst(&mut self, addr: u32, words: usize) -> Vec<Option<u16>> {
        self.latch_address(addr);
        let data = (0..words).map(|_| self.read_beat()).collect();
        self.end_access();
        data
    }

    /// Writes consecutive 16-bit words starting at `addr`.
    ///
    /// Returns the number of beats the bridge completed.
    pub fn write_burst(&mut self, addr: u32, data: &[u16]) -> usize {
        self.latch_address(addr);
        let done = data.iter().filter(|word| self.write_beat(**word)).count();
        self.end_access();
        done
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn split_address(addr: u32) -> [u16; 2] {
    [(addr >> 16) as u16, addr as u16]
}
