//! Bus sampler: brings the raw cartridge pins into the local clock domain.

use crate::signal::sync::Synchronizer;

/// Raw pin levels presented by the console on one tick.
///
/// `read_n`, `write_n` and `reset_n` are active-low; the address-latch
/// strobes are active-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusPins {
    /// High-half address-latch strobe (ALEH).
    pub aleh: bool,
    /// Low-half address-latch strobe (ALEL).
    pub alel: bool,
    /// Read strobe, asserted low.
    pub read_n: bool,
    /// Write strobe, asserted low.
    pub write_n: bool,
    /// Cold reset, asserted low.
    pub reset_n: bool,
    /// Multiplexed address/data lines as driven by the console.
    pub ad: u16,
}

impl BusPins {
    /// Quiescent pins with reset released.
    pub const IDLE: Self = Self {
        aleh: false,
        alel: false,
        read_n: true,
        write_n: true,
        reset_n: true,
        ad: 0,
    };

    /// Quiescent pins with reset held.
    pub const IN_RESET: Self = Self {
        reset_n: false,
        ..Self::IDLE
    };
}

impl Default for BusPins {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Synchronized view of the pins as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusInputs {
    /// Synchronized ALEH level.
    pub aleh: bool,
    /// Synchronized ALEL level.
    pub alel: bool,
    /// `true` while the read strobe is asserted (pin low).
    pub read: bool,
    /// `true` while the write strobe is asserted (pin low).
    pub write: bool,
    /// `true` while reset is released (pin high).
    pub running: bool,
    /// Synchronized address/data sample.
    pub ad: u16,
}

impl BusInputs {
    /// Both address strobes asserted.
    #[must_use]
    pub const fn both_strobes(self) -> bool {
        self.aleh && self.alel
    }

    /// Either address strobe asserted.
    #[must_use]
    pub const fn any_strobe(self) -> bool {
        self.aleh || self.alel
    }

    /// Neither address strobe asserted.
    #[must_use]
    pub const fn no_strobe(self) -> bool {
        !self.aleh && !self.alel
    }
}

/// Double-registers every externally sourced pin.
#[derive(Debug, Clone)]
pub struct BusSampler {
    aleh: Synchronizer<bool>,
    alel: Synchronizer<bool>,
    read_n: Synchronizer<bool>,
    write_n: Synchronizer<bool>,
    reset_n: Synchronizer<bool>,
    ad: Synchronizer<u16>,
}

impl Default for BusSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSampler {
    /// Creates a sampler whose pipeline holds the power-up (in reset) pin state.
    #[must_use]
    pub fn new() -> Self {
        let pins = BusPins::IN_RESET;
        Self {
            aleh: Synchronizer::new(pins.aleh),
            alel: Synchronizer::new(pins.alel),
            read_n: Synchronizer::new(pins.read_n),
            write_n: Synchronizer::new(pins.write_n),
            reset_n: Synchronizer::new(pins.reset_n),
            ad: Synchronizer::new(pins.ad),
        }
    }

    /// Clocks one tick of raw pins in and returns the synchronized view.
    pub fn sample(&mut self, pins: &BusPins) -> BusInputs {
        BusInputs {
            aleh: self.aleh.push(pins.aleh),
            alel: self.alel.push(pins.alel),
            read: !self.read_n.push(pins.read_n),
            write: !self.write_n.push(pins.write_n),
            running: self.reset_n.push(pins.reset_n),
            ad: self.ad.push(pins.ad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BusPins, BusSampler};

    #[test]
    fn power_up_view_is_in_reset() {
        let mut sampler = BusSampler::new();
        let view = sampler.sample(&BusPins::IDLE);
        assert!(!view.running);
        assert!(!view.read);
        assert!(!view.write);
    }

    #[test]
    fn active_low_strobes_are_inverted_after_two_ticks() {
        let mut sampler = BusSampler::new();
        let pins = BusPins {
            read_n: false,
            ad: 0xCAFE,
            ..BusPins::IDLE
        };
        sampler.sample(&pins);
        sampler.sample(&pins);
        let view = sampler.sample(&pins);
        assert!(view.read);
        assert!(!view.write);
        assert!(view.running);
        assert_eq!(view.ad, 0xCAFE);
    }

    #[test]
    fn strobe_helpers_classify_latch_phases() {
        let mut sampler = BusSampler::new();
        let pins = BusPins {
            aleh: true,
            alel: true,
            ..BusPins::IDLE
        };
        sampler.sample(&pins);
        sampler.sample(&pins);
        let view = sampler.sample(&pins);
        assert!(view.both_strobes());
        assert!(view.any_strobe());
        assert!(!view.no_strobe());
    }
}
