//! Device-side command dispatcher.

use log::{debug, warn};

use crate::command::{Command, CHUNK_WORDS};
use crate::{Endpoint, LinkError, MailboxPort, Role, WaitPolicy};

/// Memory and control operations a device exposes to the commander.
pub trait CommandHandler {
    /// Returns `len` bytes starting at `address`.
    fn peek(&mut self, address: u32, len: usize) -> Vec<u8>;

    /// Stores `data` starting at `address`.
    fn poke(&mut self, address: u32, data: &[u8]);

    /// Starts execution at `address`.
    fn execute(&mut self, address: u32);
}

/// A flat byte-addressed memory that records execute requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryTarget {
    base: u32,
    memory: Vec<u8>,
    executed: Vec<u32>,
}

impl MemoryTarget {
    /// Creates `size` zeroed bytes mapped at `base`.
    #[must_use]
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            memory: vec![0; size],
            executed: Vec::new(),
        }
    }

    /// Backing bytes.
    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Execute addresses in the order they were requested.
    #[must_use]
    pub fn executed(&self) -> &[u32] {
        &self.executed
    }

    fn offset(&self, address: u32) -> Option<usize> {
        usize::try_from(address.checked_sub(self.base)?).ok()
    }
}

impl CommandHandler for MemoryTarget {
    /// Bytes outside the memory read as zero.
    fn peek(&mut self, address: u32, len: usize) -> Vec<u8> {
        let mut out = vec![0; len];
        if let Some(start) = self.offset(address) {
            let available = self.memory.len().saturating_sub(start).min(len);
            if available > 0 {
                out[..available].copy_from_slice(&self.memory[start..start + available]);
            }
        }
        out
    }

    /// Bytes outside the memory are dropped.
    fn poke(&mut self, address: u32, data: &[u8]) {
        let Some(start) = self.offset(address) else {
            warn!("poke below {:#010x} dropped", self.base);
            return;
        };
        let available = self.memory.len().saturating_sub(start).min(data.len());
        if available < data.len() {
            warn!("poke at {address:#010x} truncated to {available} bytes");
        }
        if available > 0 {
            self.memory[start..start + available].copy_from_slice(&data[..available]);
        }
    }

    fn execute(&mut self, address: u32) {
        self.executed.push(address);
    }
}

/// What one served command did.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Served {
    /// Answered a peek.
    Peek {
        /// First byte address.
        address: u32,
        /// Bytes returned.
        len: usize,
    },
    /// Applied a poke.
    Poke {
        /// First byte address.
        address: u32,
        /// Bytes stored.
        len: usize,
    },
    /// Forwarded an execute.
    Execute {
        /// Entry address.
        address: u32,
    },
    /// Dropped an invalid or oversized command without a reply.
    Ignored,
}

/// Receives commands on the device end of the link and dispatches them.
#[derive(Debug)]
pub struct CommandServer<P: MailboxPort, H: CommandHandler> {
    endpoint: Endpoint<P>,
    handler: H,
}

impl<P: MailboxPort, H: CommandHandler> CommandServer<P, H> {
    /// Wraps `port` as the device endpoint and opens it.
    #[must_use]
    pub fn new(port: P, handler: H) -> Self {
        Self::with_wait(port, handler, WaitPolicy::Forever)
    }

    /// Like [`Self::new`] with a bounded wait on the host.
    #[must_use]
    pub fn with_wait(port: P, handler: H, wait: WaitPolicy) -> Self {
        let mut endpoint = Endpoint::new(port, Role::Device).with_wait(wait);
        endpoint.open(false);
        Self { endpoint, handler }
    }

    /// The command handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Splits the server into its port and handler.
    #[must_use]
    pub fn into_parts(self) -> (P, H) {
        (self.endpoint.into_inner(), self.handler)
    }

    /// Waits for one command, runs it and replies to peeks.
    ///
    /// # Errors
    ///
    /// Returns any channel error; undecodable commands are not errors.
    pub fn serve_one(&mut self) -> Result<Served, LinkError> {
        let message = self.endpoint.recv()?;
        let served = match Command::decode(&message) {
            Command::Peek {
                address,
                length_words,
            } => match usize::try_from(length_words) {
                Ok(words) if words <= CHUNK_WORDS => {
                    let len = words * 4;
                    let reply = self.handler.peek(address, len);
                    self.endpoint.send(&reply)?;
                    Served::Peek { address, len }
                }
                _ => {
                    debug!("ignoring peek of {length_words} words");
                    Served::Ignored
                }
            },
            Command::Poke { address, data } => {
                self.handler.poke(address, &data);
                Served::Poke {
                    address,
                    len: data.len(),
                }
            }
            Command::Execute { address } => {
                self.handler.execute(address);
                Served::Execute { address }
            }
            Command::Invalid => {
                debug!("ignoring invalid command ({} bytes)", message.len());
                Served::Ignored
            }
        };
        Ok(served)
    }

    /// Serves `count` commands.
    ///
    /// # Errors
    ///
    /// Stops at the first channel error.
    pub fn serve(&mut self, count: usize) -> Result<Vec<Served>, LinkError> {
        (0..count).map(|_| self.serve_one()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandHandler, CommandServer, MemoryTarget, Served};
    use crate::{LinkError, WaitPolicy};
    use cart_core::MailboxWindow;

    #[test]
    fn memory_target_reads_zero_outside_and_drops_outside_writes() {
        let mut target = MemoryTarget::new(0x100, 8);
        target.poke(0x104, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(target.memory(), &[0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(target.peek(0x104, 8), vec![1, 2, 3, 4, 0, 0, 0, 0]);
        assert_eq!(target.peek(0x0F0, 4), vec![0; 4]);
        target.poke(0x0F0, &[9; 4]);
        assert_eq!(target.memory()[..4], [0; 4]);
    }

    #[test]
    fn serve_times_out_on_a_silent_host() {
        let mut server = CommandServer::with_wait(
            MailboxWindow::new(),
            MemoryTarget::new(0, 4),
            WaitPolicy::Polls(8),
        );
        assert_eq!(
            server.serve_one(),
            Err(LinkError::ChannelTimeout { polls: 8 })
        );
        let served: Result<Vec<Served>, LinkError> = server.serve(2);
        assert!(served.is_err());
        let (_, target) = server.into_parts();
        assert!(target.executed().is_empty());
    }
}
