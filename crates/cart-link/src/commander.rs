//! Host-side command issuer.

use log::{debug, trace};

use crate::command::{chunk_lengths, Command, CHUNK_BYTES};
use crate::{Endpoint, LinkError, MailboxPort, Role, WaitPolicy};

/// Issues peek, poke and execute commands over the host end of the link.
///
/// Transfers longer than one chunk are split into consecutive commands at
/// increasing addresses.
#[derive(Debug)]
pub struct Commander<P: MailboxPort> {
    endpoint: Endpoint<P>,
}

fn check_aligned(len: usize) -> Result<(), LinkError> {
    if len % 4 == 0 {
        Ok(())
    } else {
        Err(LinkError::UnalignedLength { len })
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn chunk_address(address: u32, index: usize) -> u32 {
    address.wrapping_add((index * CHUNK_BYTES) as u32)
}

impl<P: MailboxPort> Commander<P> {
    /// Wraps `port` as the host endpoint and opens it.
    #[must_use]
    pub fn new(port: P) -> Self {
        Self::with_wait(port, WaitPolicy::Forever)
    }

    /// Like [`Self::new`] with a bounded wait on the device.
    #[must_use]
    pub fn with_wait(port: P, wait: WaitPolicy) -> Self {
        let mut endpoint = Endpoint::new(port, Role::Host).with_wait(wait);
        endpoint.open(false);
        Self { endpoint }
    }

    /// The host endpoint.
    #[allow(clippy::missing_const_for_fn)]
    pub fn endpoint_mut(&mut self) -> &mut Endpoint<P> {
        &mut self.endpoint
    }

    /// Reads `len` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::UnalignedLength`] when `len` is not a multiple
    /// of 4, [`LinkError::UnexpectedReply`] when a reply carries the wrong
    /// number of bytes, and any channel error.
    #[allow(clippy::cast_possible_truncation)]
    pub fn peek(&mut self, address: u32, len: usize) -> Result<Vec<u8>, LinkError> {
        check_aligned(len)?;
        let mut out = Vec::with_capacity(len);
        for (index, chunk) in chunk_lengths(len).enumerate() {
            let at = chunk_address(address, index);
            let command = Command::Peek {
                address: at,
                length_words: (chunk / 4) as u32,
            };
            self.endpoint.send(&command.encode())?;
            let reply = self.endpoint.recv()?;
            if reply.len() != chunk {
                return Err(LinkError::UnexpectedReply {
                    expected: chunk,
                    received: reply.len(),
                });
            }
            trace!("peek {at:#010x}: {chunk} bytes");
            out.extend_from_slice(&reply);
        }
        debug!("peeked {len} bytes at {address:#010x}");
        Ok(out)
    }

    /// Writes `data` starting at `address`.
    ///
    /// The final word is zero-padded when the length is not a multiple of
    /// 4, so the padding bytes are written too.
    ///
    /// # Errors
    ///
    /// Returns any channel error.
    pub fn poke(&mut self, address: u32, data: &[u8]) -> Result<(), LinkError> {
        for (index, chunk) in data.chunks(CHUNK_BYTES).enumerate() {
            let at = chunk_address(address, index);
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk.len().next_multiple_of(4), 0);
            let chunk_len = chunk.len();
            let command = Command::Poke {
                address: at,
                data: chunk,
            };
            self.endpoint.send(&command.encode())?;
            trace!("poke {at:#010x}: {} bytes", chunk_len);
        }
        debug!("poked {} bytes at {address:#010x}", data.len());
        Ok(())
    }

    /// Asks the device to start executing at `address`.
    ///
    /// # Errors
    ///
    /// Returns any channel error.
    pub fn execute(&mut self, address: u32) -> Result<(), LinkError> {
        self.endpoint.send(&Command::Execute { address }.encode())?;
        debug!("execute at {address:#010x}");
        Ok(())
    }

    /// Unwraps the port.
    #[must_use]
    pub fn into_inner(self) -> P {
        self.endpoint.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::Commander;
    use crate::{LinkError, WaitPolicy};
    use cart_core::{MailboxState, MailboxWindow, TX_LENGTH, TX_PAYLOAD, TX_STATE};
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(238)]
    fn unaligned_peeks_are_refused_before_sending(#[case] len: usize) {
        let mut commander = Commander::new(MailboxWindow::new());
        assert_eq!(
            commander.peek(0, len),
            Err(LinkError::UnalignedLength { len })
        );
        let window = commander.into_inner();
        assert_eq!(window.read_word(TX_STATE), MailboxState::Idle.as_u32());
    }

    #[test]
    fn unaligned_poke_pads_the_final_word() {
        let mut commander = Commander::with_wait(MailboxWindow::new(), WaitPolicy::Polls(4));
        assert_eq!(
            commander.poke(0x40, &[1, 2, 3, 4, 5]),
            Err(LinkError::ChannelTimeout { polls: 4 })
        );
        let window = commander.into_inner();
        assert_eq!(window.read_word(TX_LENGTH), 4);
        assert_eq!(window.read_word(TX_PAYLOAD), 2);
        assert_eq!(window.read_word(TX_PAYLOAD + 1), 0x40);
        assert_eq!(window.read_word(TX_PAYLOAD + 2), 0x0102_0304);
        assert_eq!(window.read_word(TX_PAYLOAD + 3), 0x0500_0000);
    }

    #[test]
    fn empty_peek_sends_nothing() {
        let mut commander = Commander::new(MailboxWindow::new());
        assert_eq!(commander.peek(0x10, 0), Ok(Vec::new()));
        assert_eq!(commander.into_inner().read_word(TX_LENGTH), 0);
    }

    #[test]
    fn execute_publishes_and_then_times_out_without_a_device() {
        let mut commander = Commander::with_wait(MailboxWindow::new(), WaitPolicy::Polls(10));
        assert_eq!(
            commander.execute(0x8000_0400),
            Err(LinkError::ChannelTimeout { polls: 10 })
        );
        let window = commander.endpoint_mut().port_mut();
        assert_eq!(window.read_word(TX_STATE), MailboxState::Done.as_u32());
        assert_eq!(window.read_word(TX_LENGTH), 2);
        assert_eq!(window.read_word(TX_PAYLOAD), 3);
        assert_eq!(window.read_word(TX_PAYLOAD + 1), 0x8000_0400);

        commander.endpoint_mut().open(true);
        let window = commander.into_inner();
        assert_eq!(window.read_word(TX_STATE), MailboxState::Idle.as_u32());
        assert_eq!(window.read_word(TX_PAYLOAD), 0);
    }
}
