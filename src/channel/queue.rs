//! Fixed capacity blocking FIFO, one per channel direction.
//! Backed by a bounded crossbeam channel whose two ends are both owned by the queue,
//! every blocking call also selects on the caller's cancel token.
use std::time::Duration;

use crossbeam_channel::{Receiver, Select, Sender};

use super::{CancelToken, ChannelError, Message};

/// Default number of messages a queue can hold.
pub const DEFAULT_CAPACITY: usize = 100_000;

pub struct BoundedQueue {
    name: &'static str,
    capacity: usize,
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

impl BoundedQueue {
    pub fn new(name: &'static str, capacity: usize) -> Result<Self, ChannelError> {
        // A zero-capacity crossbeam channel is a rendezvous, not a queue
        if capacity == 0 {
            return Err(ChannelError::InvalidCapacity(capacity));
        }
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Ok(Self { name, capacity, tx, rx })
    }

    /// Appends `msg`, blocking while the queue is full.
    /// On cancellation nothing is enqueued.
    pub fn put(&self, msg: Message, cancel: &CancelToken) -> Result<(), ChannelError> {
        if cancel.is_cancelled() {
            return Err(ChannelError::Cancelled);
        }
        let mut sel = Select::new();
        let put = sel.send(&self.tx);
        let stop = sel.recv(cancel.signal());
        let oper = sel.select();
        let index = oper.index();
        if index == put {
            log::trace!("{} <- {msg}", self.name);
            // Both ends live in self, the send cannot observe a disconnection
            oper.send(&self.tx, msg).expect("queue owns its receiver");
            Ok(())
        } else {
            debug_assert_eq!(index, stop);
            let _ = oper.recv(cancel.signal());
            log::debug!("{}: put cancelled", self.name);
            Err(ChannelError::Cancelled)
        }
    }

    /// Removes the head, blocking while the queue is empty.
    /// On cancellation the queue is left untouched.
    pub fn take(&self, cancel: &CancelToken) -> Result<Message, ChannelError> {
        self.take_inner(None, cancel)
    }

    pub fn take_timeout(&self, timeout: Duration, cancel: &CancelToken) -> Result<Message, ChannelError> {
        self.take_inner(Some(timeout), cancel)
    }

    pub fn try_take(&self) -> Option<Message> {
        self.rx.try_recv().ok().inspect(|msg| log::trace!("{} -> {msg}", self.name))
    }

    fn take_inner(&self, timeout: Option<Duration>, cancel: &CancelToken) -> Result<Message, ChannelError> {
        if cancel.is_cancelled() {
            return Err(ChannelError::Cancelled);
        }
        let mut sel = Select::new();
        let take = sel.recv(&self.rx);
        let stop = sel.recv(cancel.signal());
        let oper = match timeout {
            Some(timeout) => sel.select_timeout(timeout).map_err(|_| ChannelError::Timeout(timeout))?,
            None => sel.select(),
        };
        let index = oper.index();
        if index == take {
            let msg = oper.recv(&self.rx).expect("queue owns its sender");
            log::trace!("{} -> {msg}", self.name);
            Ok(msg)
        } else {
            debug_assert_eq!(index, stop);
            let _ = oper.recv(cancel.signal());
            log::debug!("{}: take cancelled", self.name);
            Err(ChannelError::Cancelled)
        }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn len(&self) -> usize { self.rx.len() }

    pub fn is_empty(&self) -> bool { self.rx.is_empty() }

    pub fn is_full(&self) -> bool { self.rx.is_full() }
}
