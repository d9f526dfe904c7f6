//! Synchronous backing-store interface and a latency-variable simulation.

use log::warn;

use crate::STORE_OFFSET_MASK;

/// Bytes addressable through the store port (the 24-bit offset space).
pub const STORE_ADDRESSABLE_BYTES: usize = STORE_OFFSET_MASK as usize + 1;

/// Direction and payload of one single-beat store command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StoreOp {
    /// Fetch one 16-bit lane.
    Read,
    /// Store one 16-bit lane, already in store byte order.
    Write(u16),
}

/// Command presented on the store port for exactly one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StoreCommand {
    /// Byte address within the store.
    pub addr: u32,
    /// Requested operation.
    pub op: StoreOp,
}

/// Port status sampled on one clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StoreResponse {
    /// No response this cycle.
    Pending,
    /// Command accepted and read data valid.
    ReadData(u16),
    /// Command accepted and write committed.
    WriteAck,
}

/// A synchronous store with a command/response handshake.
///
/// The store never fails a request; it may take an unbounded number of
/// cycles to respond.
pub trait BackingStore: Send {
    /// Advances one clock edge. `command` is the command-valid pulse for
    /// this cycle, if any.
    fn clock(&mut self, command: Option<StoreCommand>) -> StoreResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    command: StoreCommand,
    remaining: u32,
}

/// Byte-addressed RAM answering each command after a configurable delay.
///
/// A command issued on one `clock` call is answered on the call `latency`
/// edges later (zero means the same call). Lanes are little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedStore {
    memory: Vec<u8>,
    latency: u32,
    stalled: bool,
    in_flight: Option<InFlight>,
    commands: u64,
}

impl Default for SimulatedStore {
    fn default() -> Self {
        Self::new(STORE_ADDRESSABLE_BYTES, 2)
    }
}

impl SimulatedStore {
    /// Allocates a zeroed store of `capacity` bytes (rounded up to a lane).
    #[must_use]
    pub fn new(capacity: usize, latency: u32) -> Self {
        Self {
            memory: vec![0; capacity.max(2).next_multiple_of(2)],
            latency,
            stalled: false,
            in_flight: None,
            commands: 0,
        }
    }

    /// Response delay applied to commands issued from now on.
    #[must_use]
    pub const fn latency(&self) -> u32 {
        self.latency
    }

    /// Changes the response delay for subsequent commands.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_latency(&mut self, latency: u32) {
        self.latency = latency;
    }

    /// While stalled the store accepts commands but never answers.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Number of commands accepted so far.
    #[must_use]
    pub const fn commands_issued(&self) -> u64 {
        self.commands
    }

    /// Returns `true` while a command awaits its response.
    #[must_use]
    pub const fn busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Raw store image.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.memory
    }

    /// Copies `data` into the image at `offset`, wrapping at capacity.
    pub fn load(&mut self, offset: usize, data: &[u8]) {
        let len = self.memory.len();
        for (index, byte) in data.iter().enumerate() {
            self.memory[(offset + index) % len] = *byte;
        }
    }

    fn lane(&self, addr: u32) -> usize {
        (addr as usize & !1) % self.memory.len()
    }

    fn execute(&mut self, command: StoreCommand) -> StoreResponse {
        let index = self.lane(command.addr);
        match command.op {
            StoreOp::Read => StoreResponse::ReadData(u16::from_le_bytes([
                self.memory[index],
                self.memory[index + 1],
            ])),
            StoreOp::Write(value) => {
                self.memory[index..index + 2].copy_from_slice(&value.to_le_bytes());
                StoreResponse::WriteAck
            }
        }
    }
}

impl BackingStore for SimulatedStore {
    fn clock(&mut self, command: Option<StoreCommand>) -> StoreResponse {
        if let Some(command) = command {
            if self.in_flight.is_some() {
                warn!("store busy; dropped command at {:#08x}", command.addr);
            } else {
                self.in_flight = Some(InFlight {
                    command,
                    remaining: self.latency,
                });
                self.commands += 1;
            }
        }

        let Some(flight) = self.in_flight.as_mut() else {
            return StoreResponse::Pending;
        };
        if self.stalled {
            return StoreResponse::Pending;
        }
        if flight.remaining > 0 {
            flight.remaining -= 1;
            return StoreResponse::Pending;
        }
        let command = flight.command;
        self.in_flight = None;
        self.execute(command)
    }
}
