//! Mailbox shared memory and its bus-facing 16-bit view.

use std::sync::{Arc, Mutex, PoisonError};

use crate::mailbox::layout::{Block, BLOCK_WORDS, MAILBOX_WORDS};

/// The 128-word shared window.
///
/// Word offsets wrap modulo the window size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxWindow {
    words: [u32; MAILBOX_WORDS],
}

impl Default for MailboxWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MailboxWindow {
    /// Creates a zeroed window (both blocks idle).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; MAILBOX_WORDS],
        }
    }

    /// Reads the word at `offset`.
    #[must_use]
    pub const fn read_word(&self, offset: usize) -> u32 {
        self.words[offset % MAILBOX_WORDS]
    }

    /// Writes the word at `offset`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn write_word(&mut self, offset: usize, value: u32) {
        self.words[offset % MAILBOX_WORDS] = value;
    }

    /// Zeroes every word of `block`.
    pub fn clear_block(&mut self, block: Block) {
        let base = block.base();
        self.words[base..base + BLOCK_WORDS].fill(0);
    }

    const fn bus_word(block: Block, byte_offset: u32) -> usize {
        block.base() + ((byte_offset as usize >> 2) % BLOCK_WORDS)
    }

    /// Reads one 16-bit half of a `block` word through a bus window.
    ///
    /// Address bit 1 selects the half: clear for the high half, set for the
    /// low half.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn bus_read16(&self, block: Block, byte_offset: u32) -> u16 {
        let word = self.words[Self::bus_word(block, byte_offset)];
        if byte_offset & 2 == 0 {
            (word >> 16) as u16
        } else {
            word as u16
        }
    }

    /// Writes one 16-bit half of a `block` word through a bus window.
    #[allow(clippy::missing_const_for_fn)]
    pub fn bus_write16(&mut self, block: Block, byte_offset: u32, value: u16) {
        let index = Self::bus_word(block, byte_offset);
        let word = self.words[index];
        self.words[index] = if byte_offset & 2 == 0 {
            (word & 0x0000_FFFF) | (u32::from(value) << 16)
        } else {
            (word & 0xFFFF_0000) | u32::from(value)
        };
    }
}

/// Cloneable handle to a window shared by the bus and both mailbox parties.
#[derive(Debug, Clone, Default)]
pub struct SharedMailbox {
    inner: Arc<Mutex<MailboxWindow>>,
}

impl SharedMailbox {
    /// Creates a handle to a fresh zeroed window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the window.
    pub fn with<R>(&self, f: impl FnOnce(&mut MailboxWindow) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Reads the word at `offset`.
    #[must_use]
    pub fn read_word(&self, offset: usize) -> u32 {
        self.with(|window| window.read_word(offset))
    }

    /// Writes the word at `offset`.
    pub fn write_word(&self, offset: usize, value: u32) {
        self.with(|window| window.write_word(offset, value));
    }

    /// Copies the current window contents.
    #[must_use]
    pub fn snapshot(&self) -> MailboxWindow {
        self.with(|window| window.clone())
    }
}
