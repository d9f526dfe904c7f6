//! Mailbox shared window: layout, state encoding and bus routing.

/// Word layout and handshake state encoding.
pub mod layout;
/// Shared window storage and its 16-bit bus view.
pub mod window;

pub use layout::{
    Block, MailboxState, BLOCK_WORDS, LENGTH_OFFSET, MAILBOX_WORDS, PAYLOAD_BYTES,
    PAYLOAD_OFFSET, PAYLOAD_WORDS, RX_LENGTH, RX_PAYLOAD, RX_STATE, RX_STATE_RECV,
    STATE_OFFSET, STATE_RECV_OFFSET, TX_LENGTH, TX_PAYLOAD, TX_STATE, TX_STATE_RECV,
};
pub use window::{MailboxWindow, SharedMailbox};
