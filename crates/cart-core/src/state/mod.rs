//! Bus access state machine.

/// Access states and their reset-free transition function.
pub mod access_state;

pub use access_state::{AccessAction, AccessState};
