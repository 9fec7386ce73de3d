//! Cooperative cancellation for the blocking channel operations.
//! A token wraps a crossbeam channel whose only sender is dropped on cancel: from then on the
//! receiving side is always ready, so it can take part in a `Select` next to the data operation.
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Clonable cancellation signal. All clones observe the same `cancel` call.
#[derive(Debug, Clone)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self { trigger: Arc::new(Mutex::new(Some(tx))), signal: rx }
    }

    /// Wakes every thread blocked on this token. Idempotent.
    pub fn cancel(&self) {
        let sender = self.trigger.lock().unwrap_or_else(PoisonError::into_inner).take();
        if sender.is_some() {
            log::debug!("Cancel token triggered");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready (disconnected) once the token is cancelled.
    pub(crate) fn signal(&self) -> &Receiver<()> { &self.signal }
}

impl Default for CancelToken {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.signal().recv_timeout(Duration::from_millis(20)).is_err());
    }

    #[test]
    fn cancel_is_shared_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        clone.cancel(); // idempotent
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_wakes_blocked_receiver() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = std::thread::spawn(move || waiter.signal().recv().is_err());
        std::thread::sleep(Duration::from_millis(50));
        token.cancel();
        assert!(handle.join().unwrap());
    }
}
