//! Fixed word layout of the mailbox shared window.

/// Total 32-bit words in the shared window.
pub const MAILBOX_WORDS: usize = 128;
/// Words in one half-channel block.
pub const BLOCK_WORDS: usize = 64;
/// Payload capacity of one message, in 32-bit words.
pub const PAYLOAD_WORDS: usize = 61;
/// Payload capacity of one message, in bytes.
pub const PAYLOAD_BYTES: usize = PAYLOAD_WORDS * 4;

/// Word offset of the sender-owned state register within a block.
pub const STATE_OFFSET: usize = 0;
/// Word offset of the receiver-acknowledge register within a block.
pub const STATE_RECV_OFFSET: usize = 1;
/// Word offset of the payload length (in words) within a block.
pub const LENGTH_OFFSET: usize = 2;
/// Word offset of the first payload word within a block.
pub const PAYLOAD_OFFSET: usize = 3;

/// Device-to-host state (`rx_state`).
pub const RX_STATE: usize = Block::Rx.state();
/// Device acknowledge of host messages (`rx_state_recv`).
pub const RX_STATE_RECV: usize = Block::Rx.state_recv();
/// Device-to-host length (`rx_length`).
pub const RX_LENGTH: usize = Block::Rx.length();
/// First device-to-host payload word (`rx_payload`).
pub const RX_PAYLOAD: usize = Block::Rx.payload();
/// Host-to-device state (`tx_state`).
pub const TX_STATE: usize = Block::Tx.state();
/// Host acknowledge of device messages (`tx_state_recv`).
pub const TX_STATE_RECV: usize = Block::Tx.state_recv();
/// Host-to-device length (`tx_length`).
pub const TX_LENGTH: usize = Block::Tx.length();
/// First host-to-device payload word (`tx_payload`).
pub const TX_PAYLOAD: usize = Block::Tx.payload();

const _: () = assert!(PAYLOAD_OFFSET + PAYLOAD_WORDS == BLOCK_WORDS);
const _: () = assert!(2 * BLOCK_WORDS == MAILBOX_WORDS);

/// One of the two 64-word halves of the window.
///
/// Each party writes only its own block: the device owns `Rx`, the host
/// owns `Tx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Block {
    /// Words `0..64`, written by the device.
    Rx,
    /// Words `64..128`, written by the host.
    Tx,
}

impl Block {
    /// First word of the block.
    #[must_use]
    pub const fn base(self) -> usize {
        match self {
            Self::Rx => 0,
            Self::Tx => BLOCK_WORDS,
        }
    }

    /// The other block.
    #[must_use]
    pub const fn peer(self) -> Self {
        match self {
            Self::Rx => Self::Tx,
            Self::Tx => Self::Rx,
        }
    }

    /// Absolute word offset of the block's state register.
    #[must_use]
    pub const fn state(self) -> usize {
        self.base() + STATE_OFFSET
    }

    /// Absolute word offset of the block's acknowledge register.
    #[must_use]
    pub const fn state_recv(self) -> usize {
        self.base() + STATE_RECV_OFFSET
    }

    /// Absolute word offset of the block's length register.
    #[must_use]
    pub const fn length(self) -> usize {
        self.base() + LENGTH_OFFSET
    }

    /// Absolute word offset of the block's first payload word.
    #[must_use]
    pub const fn payload(self) -> usize {
        self.base() + PAYLOAD_OFFSET
    }
}

/// Handshake state stored in the state and acknowledge registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum MailboxState {
    /// No transfer in progress.
    #[default]
    Idle = 0,
    /// Owner is writing (sender) or reading (receiver).
    Busy = 1,
    /// Owner finished its half of the transfer.
    Done = 2,
}

impl MailboxState {
    /// Register encoding.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decodes a register value; unknown values yield `None`.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Busy),
            2 => Some(Self::Done),
            _ => None,
        }
    }
}
