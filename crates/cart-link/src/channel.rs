//! Four-phase mailbox handshake.
//!
//! Each party owns one 64-word block and only ever writes there. A sender
//! publishes through its own `state`, `length` and payload words; the
//! receiver acknowledges through its own `state_recv`. One message moves as:
//!
//! 1. Sender waits for the receiver's `state_recv` to read `Idle`
//! 2. Sender marks `Busy`, writes payload then length, marks `Done`
//! 3. Receiver sees `Done`, marks `state_recv` `Busy`, copies, marks `Done`
//! 4. Sender sees the acknowledge and returns its `state` to `Idle`
//! 5. Receiver sees `Idle` and returns its `state_recv` to `Idle`
//!
//! [`SendTransfer`] and [`RecvTransfer`] advance one observation per
//! [`poll`](SendTransfer::poll), so both parties can be interleaved
//! deterministically; [`Endpoint`] spins them to completion.

use std::thread;

use log::trace;

use cart_core::{Block, MailboxState, BLOCK_WORDS, PAYLOAD_BYTES, PAYLOAD_WORDS};

use crate::{LinkError, MailboxPort};

/// Which side of the link an endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// External controller; owns the tx block.
    Host,
    /// Console-side agent; owns the rx block.
    Device,
}

impl Role {
    /// Block this role writes.
    #[must_use]
    pub const fn own_block(self) -> Block {
        match self {
            Self::Host => Block::Tx,
            Self::Device => Block::Rx,
        }
    }

    /// Block this role only reads.
    #[must_use]
    pub const fn peer_block(self) -> Block {
        self.own_block().peer()
    }
}

/// How long an endpoint spins on the peer before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaitPolicy {
    /// Spin until the peer answers.
    #[default]
    Forever,
    /// Give up after this many unanswered polls.
    Polls(u64),
}

/// Result of one poll of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Progress<T> {
    /// Still waiting on the peer.
    Waiting,
    /// Transfer complete.
    Done(T),
}

fn read_state<P: MailboxPort + ?Sized>(port: &mut P, offset: usize) -> Option<MailboxState> {
    MailboxState::from_u32(port.read_word(offset))
}

fn write_state<P: MailboxPort + ?Sized>(port: &mut P, offset: usize, state: MailboxState) {
    port.write_word(offset, state.as_u32());
}

/// Packs bytes into big-endian payload words, zero-padding the last word.
#[must_use]
pub fn pack_words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .collect()
}

/// Unpacks big-endian payload words into bytes.
#[must_use]
pub fn unpack_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendPhase {
    AwaitReceiverIdle,
    AwaitReceiverDone,
    Finished,
}

/// One outgoing message, advanced by polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTransfer {
    role: Role,
    words: Vec<u32>,
    phase: SendPhase,
}

impl SendTransfer {
    /// Prepares `payload` for sending from `role`'s block.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::PayloadTooLarge`] when `payload` exceeds the
    /// mailbox payload area.
    pub fn new(role: Role, payload: &[u8]) -> Result<Self, LinkError> {
        if payload.len() > PAYLOAD_BYTES {
            return Err(LinkError::PayloadTooLarge {
                len: payload.len(),
                max: PAYLOAD_BYTES,
            });
        }
        Ok(Self {
            role,
            words: pack_words(payload),
            phase: SendPhase::AwaitReceiverIdle,
        })
    }

    /// Returns `true` once the payload has been published.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        !matches!(self.phase, SendPhase::AwaitReceiverIdle)
    }

    /// Makes one observation of the receiver and acts on it.
    #[allow(clippy::cast_possible_truncation)]
    pub fn poll<P: MailboxPort + ?Sized>(&mut self, port: &mut P) -> Progress<()> {
        let own = self.role.own_block();
        let peer = self.role.peer_block();
        match self.phase {
            SendPhase::AwaitReceiverIdle => {
                if read_state(port, peer.state_recv()) != Some(MailboxState::Idle) {
                    return Progress::Waiting;
                }
                write_state(port, own.state(), MailboxState::Busy);
                port.write_words(own.payload(), &self.words);
                port.write_word(own.length(), self.words.len() as u32);
                write_state(port, own.state(), MailboxState::Done);
                trace!("{:?} published {} words", self.role, self.words.len());
                self.phase = SendPhase::AwaitReceiverDone;
                Progress::Waiting
            }
            SendPhase::AwaitReceiverDone => {
                if read_state(port, peer.state_recv()) != Some(MailboxState::Done) {
                    return Progress::Waiting;
                }
                write_state(port, own.state(), MailboxState::Idle);
                trace!("{:?} send acknowledged", self.role);
                self.phase = SendPhase::Finished;
                Progress::Done(())
            }
            SendPhase::Finished => Progress::Done(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecvPhase {
    AwaitSenderDone,
    AwaitSenderIdle(Result<Vec<u8>, LinkError>),
    Finished,
}

/// One incoming message, advanced by polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecvTransfer {
    role: Role,
    phase: RecvPhase,
}

impl RecvTransfer {
    /// Prepares to receive into `role`'s acknowledge register.
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self {
            role,
            phase: RecvPhase::AwaitSenderDone,
        }
    }

    /// Makes one observation of the sender and acts on it.
    ///
    /// A published length beyond the payload area is still acknowledged so
    /// the channel stays usable; the transfer then completes with
    /// [`LinkError::MalformedLength`].
    pub fn poll<P: MailboxPort + ?Sized>(
        &mut self,
        port: &mut P,
    ) -> Progress<Result<Vec<u8>, LinkError>> {
        let own = self.role.own_block();
        let peer = self.role.peer_block();
        match self.phase {
            RecvPhase::AwaitSenderDone => {
                if read_state(port, peer.state()) != Some(MailboxState::Done) {
                    return Progress::Waiting;
                }
                write_state(port, own.state_recv(), MailboxState::Busy);
                let words = port.read_word(peer.length());
                let received = match usize::try_from(words) {
                    Ok(len) if len <= PAYLOAD_WORDS => {
                        let mut payload = vec![0; len];
                        port.read_words(peer.payload(), &mut payload);
                        Ok(unpack_words(&payload))
                    }
                    _ => Err(LinkError::MalformedLength {
                        words,
                        max: PAYLOAD_WORDS,
                    }),
                };
                write_state(port, own.state_recv(), MailboxState::Done);
                trace!("{:?} received {words} words", self.role);
                self.phase = RecvPhase::AwaitSenderIdle(received);
                Progress::Waiting
            }
            RecvPhase::AwaitSenderIdle(_) => {
                if read_state(port, peer.state()) != Some(MailboxState::Idle) {
                    return Progress::Waiting;
                }
                write_state(port, own.state_recv(), MailboxState::Idle);
                trace!("{:?} receive closed", self.role);
                match std::mem::replace(&mut self.phase, RecvPhase::Finished) {
                    RecvPhase::AwaitSenderIdle(received) => Progress::Done(received),
                    RecvPhase::AwaitSenderDone | RecvPhase::Finished => Progress::Waiting,
                }
            }
            RecvPhase::Finished => Progress::Waiting,
        }
    }
}

/// One party of the link, spinning transfers to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint<P: MailboxPort> {
    port: P,
    role: Role,
    wait: WaitPolicy,
}

impl<P: MailboxPort> Endpoint<P> {
    /// Wraps `port` for `role`, waiting forever on the peer.
    #[must_use]
    pub const fn new(port: P, role: Role) -> Self {
        Self {
            port,
            role,
            wait: WaitPolicy::Forever,
        }
    }

    /// Replaces the wait policy.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Role of this endpoint.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Underlying port.
    #[allow(clippy::missing_const_for_fn)]
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Unwraps the port.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_inner(self) -> P {
        self.port
    }

    /// Returns this endpoint's block to idle.
    ///
    /// With `reset` the whole block is zeroed first, discarding any
    /// half-finished message.
    pub fn open(&mut self, reset: bool) {
        let own = self.role.own_block();
        if reset {
            self.port.write_words(own.base(), &[0; BLOCK_WORDS]);
        }
        write_state(&mut self.port, own.state(), MailboxState::Idle);
        write_state(&mut self.port, own.state_recv(), MailboxState::Idle);
        trace!("{:?} opened (reset: {reset})", self.role);
    }

    /// Sends one message and waits for the peer's acknowledge.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::PayloadTooLarge`] for oversized payloads and
    /// [`LinkError::ChannelTimeout`] when the wait policy runs out.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        let mut transfer = SendTransfer::new(self.role, payload)?;
        self.spin(|port| transfer.poll(port))
    }

    /// Waits for one message from the peer.
    ///
    /// The payload length is always a whole number of words; senders pad.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::MalformedLength`] when the peer published an
    /// impossible length and [`LinkError::ChannelTimeout`] when the wait
    /// policy runs out.
    pub fn recv(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut transfer = RecvTransfer::new(self.role);
        self.spin(|port| transfer.poll(port))?
    }

    fn spin<T>(&mut self, mut poll: impl FnMut(&mut P) -> Progress<T>) -> Result<T, LinkError> {
        let mut polls = 0_u64;
        loop {
            if let Progress::Done(value) = poll(&mut self.port) {
                return Ok(value);
            }
            polls += 1;
            if let WaitPolicy::Polls(limit) = self.wait {
                if polls >= limit {
                    return Err(LinkError::ChannelTimeout { polls });
                }
            }
            thread::yield_now();
        }
    }
}
