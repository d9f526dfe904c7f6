//! Mailbox link and command protocol for the cartridge bridge.
//!
//! The host and the console exchange messages through the bridge's shared
//! mailbox window using a four-phase handshake. On top of that channel the
//! host issues peek, poke and execute commands which a device-side server
//! dispatches to a [`CommandHandler`].

mod errors;
pub use errors::LinkError;

/// Word access to the mailbox window.
pub mod port;
pub use port::{BusPort, MailboxPort};

/// Four-phase handshake endpoints.
pub mod channel;
pub use channel::{
    pack_words, unpack_words, Endpoint, Progress, RecvTransfer, Role, SendTransfer, WaitPolicy,
};

/// Command wire format.
pub mod command;
pub use command::{chunk_lengths, Command, CommandType, CHUNK_BYTES, CHUNK_WORDS};

/// Host-side command issuer.
pub mod commander;
pub use commander::Commander;

/// Device-side command dispatcher.
pub mod server;
pub use server::{CommandHandler, CommandServer, MemoryTarget, Served};
