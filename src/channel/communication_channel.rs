use std::time::Duration;

use super::gate::PairingGate;
use super::queue::{BoundedQueue, DEFAULT_CAPACITY};
use super::{CancelToken, ChannelError, Message};

/// Construction parameters of a [`CommunicationChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Capacity of each of the two queues.
    pub capacity: usize,
    /// How long a thread waiting on a gate tolerates an owner stuck between two halves.
    /// `None` waits forever.
    pub pair_stall_timeout: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, pair_stall_timeout: Some(Duration::from_secs(10)) }
    }
}

/// Channel between many explorers and the control actor.
///
/// Explorers to control is a plain FIFO. Control to explorers carries pairs: the control actor
/// writes both halves under the writer gate, and a single explorer reads both halves under the
/// reader gate, so a pair is never interleaved nor split between explorers.
pub struct CommunicationChannel {
    explorer_out: BoundedQueue,
    control_out: BoundedQueue,
    writer_gate: PairingGate,
    reader_gate: PairingGate,
}

impl CommunicationChannel {
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelError> {
        log::debug!("Creating communication channel with {config:?}");
        Ok(Self {
            explorer_out: BoundedQueue::new("explorer-out", config.capacity)?,
            control_out: BoundedQueue::new("control-out", config.capacity)?,
            writer_gate: PairingGate::new("writer", config.pair_stall_timeout),
            reader_gate: PairingGate::new("reader", config.pair_stall_timeout),
        })
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, ChannelError> {
        Self::new(ChannelConfig { capacity, ..ChannelConfig::default() })
    }

    // Explorers -> control

    pub fn send_to_control(&self, msg: Message, cancel: &CancelToken) -> Result<(), ChannelError> {
        self.explorer_out.put(msg, cancel)
    }

    pub fn receive_from_explorers(&self, cancel: &CancelToken) -> Result<Message, ChannelError> {
        self.explorer_out.take(cancel)
    }

    pub fn receive_from_explorers_timeout(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Message, ChannelError> {
        self.explorer_out.take_timeout(timeout, cancel)
    }

    // Control -> explorers

    /// Sends one half of a pair. Must be called twice in a row by the control actor.
    ///
    /// The END sentinel is never enqueued: it aborts whatever the writer gate holds and returns.
    pub fn send_to_explorer(&self, msg: Message, cancel: &CancelToken) -> Result<(), ChannelError> {
        if msg.is_end() {
            let discarded = self.writer_gate.abort();
            log::info!("END received on control-out, writer gate released ({discarded} half discarded)");
            return Ok(());
        }
        self.writer_gate.step(cancel, || self.control_out.put(msg, cancel))
    }

    /// Receives one half of a pair. An explorer must call it twice in a row, the two results
    /// are the two halves of the same pair.
    pub fn receive_from_control(&self, cancel: &CancelToken) -> Result<Message, ChannelError> {
        self.reader_gate.step(cancel, || self.control_out.take(cancel))
    }

    pub fn send_pair(&self, first: Message, second: Message, cancel: &CancelToken) -> Result<(), ChannelError> {
        if first.is_end() || second.is_end() {
            return Err(ChannelError::SentinelInPair);
        }
        self.send_to_explorer(first, cancel)?;
        self.send_to_explorer(second, cancel)
    }

    /// Receives both halves of a pair. Once the first half is taken, any failure on the second
    /// hands it back inside [`ChannelError::PartialPair`]. If the reader gate was not aborted in
    /// between it stays with this thread, so a following
    /// [`receive_from_control`](Self::receive_from_control) yields the missing half.
    pub fn receive_pair(&self, cancel: &CancelToken) -> Result<(Message, Message), ChannelError> {
        let first = self.receive_from_control(cancel)?;
        match self.receive_from_control(cancel) {
            Ok(second) => Ok((first, second)),
            Err(_) => Err(ChannelError::PartialPair { pending: Some(first) }),
        }
    }

    /// Gives up a half-received pair, freeing the reader gate for the other explorers.
    /// The missing half stays in the queue.
    pub fn abandon_pair(&self) -> usize { self.reader_gate.abort() }

    pub fn pending_to_control(&self) -> usize { self.explorer_out.len() }

    pub fn pending_to_explorers(&self) -> usize { self.control_out.len() }

    pub fn capacity(&self) -> usize { self.explorer_out.capacity() }

    pub fn writer_gate_free(&self) -> bool { self.writer_gate.is_free() }

    pub fn reader_gate_free(&self) -> bool { self.reader_gate.is_free() }
}

impl Default for CommunicationChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::default()).expect("default capacity is not zero")
    }
}
