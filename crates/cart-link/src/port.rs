//! Word-level access to the mailbox window from either party.

use log::warn;

use cart_core::{
    BackingStore, BusMaster, CartBridge, MailboxWindow, SharedMailbox, BLOCK_WORDS,
    MAILBOX_READ_START, MAILBOX_WORDS, MAILBOX_WRITE_START,
};

/// 32-bit word access to the 128-word mailbox window.
pub trait MailboxPort {
    /// Reads the word at `offset`.
    fn read_word(&mut self, offset: usize) -> u32;

    /// Writes the word at `offset`.
    fn write_word(&mut self, offset: usize, value: u32);

    /// Reads `out.len()` consecutive words starting at `offset`.
    fn read_words(&mut self, offset: usize, out: &mut [u32]) {
        for (index, word) in out.iter_mut().enumerate() {
            *word = self.read_word(offset + index);
        }
    }

    /// Writes consecutive words starting at `offset`.
    fn write_words(&mut self, offset: usize, words: &[u32]) {
        for (index, word) in words.iter().enumerate() {
            self.write_word(offset + index, *word);
        }
    }
}

impl MailboxPort for MailboxWindow {
    fn read_word(&mut self, offset: usize) -> u32 {
        Self::read_word(self, offset)
    }

    fn write_word(&mut self, offset: usize, value: u32) {
        Self::write_word(self, offset, value);
    }
}

impl MailboxPort for SharedMailbox {
    fn read_word(&mut self, offset: usize) -> u32 {
        Self::read_word(self, offset)
    }

    fn write_word(&mut self, offset: usize, value: u32) {
        Self::write_word(self, offset, value);
    }

    fn read_words(&mut self, offset: usize, out: &mut [u32]) {
        self.with(|window| {
            for (index, word) in out.iter_mut().enumerate() {
                *word = window.read_word(offset + index);
            }
        });
    }

    fn write_words(&mut self, offset: usize, words: &[u32]) {
        self.with(|window| {
            for (index, word) in words.iter().enumerate() {
                window.write_word(offset + index, *word);
            }
        });
    }
}

/// Console-side port reaching the window through the cartridge bus.
///
/// Words in the tx block are read through the mailbox-read window and words
/// in the rx block are written through the mailbox-write window, each as
/// two 16-bit beats, high half first.
pub struct BusPort<'a, S: BackingStore> {
    master: BusMaster<'a, S>,
}

impl<'a, S: BackingStore> BusPort<'a, S> {
    /// Powers the bus on and wraps it.
    pub fn new(bridge: &'a mut CartBridge<S>) -> Self {
        let mut master = BusMaster::new(bridge);
        master.power_on();
        Self { master }
    }

    /// The underlying bus master.
    #[allow(clippy::missing_const_for_fn)]
    pub fn master(&mut self) -> &mut BusMaster<'a, S> {
        &mut self.master
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn window_address(window: u32, offset: usize) -> u32 {
        window + ((offset % BLOCK_WORDS) * 4) as u32
    }
}

impl<S: BackingStore> MailboxPort for BusPort<'_, S> {
    fn read_word(&mut self, offset: usize) -> u32 {
        let offset = offset % MAILBOX_WORDS;
        if offset < BLOCK_WORDS {
            warn!("rx word {offset} is not readable from the bus");
        }
        let addr = Self::window_address(MAILBOX_READ_START, offset);
        let halves = self.master.read_burst(addr, 2);
        let high = halves.first().copied().flatten().unwrap_or(0);
        let low = halves.get(1).copied().flatten().unwrap_or(0);
        (u32::from(high) << 16) | u32::from(low)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_word(&mut self, offset: usize, value: u32) {
        let offset = offset % MAILBOX_WORDS;
        if offset >= BLOCK_WORDS {
            warn!("tx word {offset} is not writable from the bus");
        }
        let addr = Self::window_address(MAILBOX_WRITE_START, offset);
        self.master
            .write_burst(addr, &[(value >> 16) as u16, value as u16]);
    }
}

#[cfg(test)]
mod tests {
    use super::{BusPort, MailboxPort};
    use cart_core::{
        AccessState, CartBridge, MailboxWindow, SharedMailbox, RX_LENGTH, TX_PAYLOAD, TX_STATE,
    };

    #[test]
    fn shared_handles_batch_words_under_one_lock() {
        let mut port = SharedMailbox::new();
        port.write_words(TX_PAYLOAD, &[1, 2, 3]);
        let mut out = [0; 3];
        port.read_words(TX_PAYLOAD, &mut out);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn plain_window_is_a_port() {
        let mut window = MailboxWindow::new();
        MailboxPort::write_word(&mut window, TX_STATE, 2);
        assert_eq!(MailboxPort::read_word(&mut window, TX_STATE), 2);
    }

    #[test]
    fn bus_port_reaches_both_blocks_through_the_bridge() {
        let mailbox = SharedMailbox::new();
        mailbox.write_word(TX_PAYLOAD, 0xCAFE_F00D);
        let mut bridge: CartBridge = CartBridge::default().with_mailbox(mailbox.clone());
        let mut port = BusPort::new(&mut bridge);

        assert_eq!(port.read_word(TX_PAYLOAD), 0xCAFE_F00D);
        port.write_word(RX_LENGTH, 0x0000_0011);
        assert_eq!(mailbox.read_word(RX_LENGTH), 0x11);
        assert_eq!(
            port.master().last_output().map(|out| out.state),
            Some(AccessState::Start)
        );
        assert_eq!(port.master().bridge().diag().beats, 4);
    }
}
