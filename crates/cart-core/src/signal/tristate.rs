//! Single-value model of the shared multiplexed address/data lines.

/// Who is driving the shared lines from the device's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusDirection {
    /// The device samples the lines; another agent drives them.
    Input,
    /// The device drives the lines with its output value.
    Output,
    /// Nobody on the device side drives the lines.
    #[default]
    Floating,
}

/// A 16-bit line group carrying a value plus a direction flag.
///
/// Replaces one tri-state buffer per line with a single value-with-enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TriStateBus {
    value: u16,
    direction: BusDirection,
}

impl TriStateBus {
    /// Lines released by the device.
    #[must_use]
    pub const fn floating() -> Self {
        Self {
            value: 0,
            direction: BusDirection::Floating,
        }
    }

    /// Lines driven by the device with `value` (output enable asserted).
    #[must_use]
    pub const fn driven(value: u16) -> Self {
        Self {
            value,
            direction: BusDirection::Output,
        }
    }

    /// Lines sampled by the device while another agent drives `value`.
    #[must_use]
    pub const fn sampled(value: u16) -> Self {
        Self {
            value,
            direction: BusDirection::Input,
        }
    }

    /// Current direction flag.
    #[must_use]
    pub const fn direction(self) -> BusDirection {
        self.direction
    }

    /// Returns `true` when the device output enable is asserted.
    #[must_use]
    pub const fn output_enabled(self) -> bool {
        matches!(self.direction, BusDirection::Output)
    }

    /// Value driven by the device, or `None` when it is not driving.
    #[must_use]
    pub const fn driven_value(self) -> Option<u16> {
        match self.direction {
            BusDirection::Output => Some(self.value),
            BusDirection::Input | BusDirection::Floating => None,
        }
    }

    /// Resolves the wire level seen by an observer given the other agent's drive.
    ///
    /// Device output wins; an undriven bus reads as `pull`.
    #[must_use]
    pub const fn resolve(self, other: Option<u16>, pull: u16) -> u16 {
        match (self.driven_value(), other) {
            (Some(value), _) | (None, Some(value)) => value,
            (None, None) => pull,
        }
    }
}
