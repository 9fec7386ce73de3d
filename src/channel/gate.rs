//! Exclusive gate that keeps a thread in possession across exactly two guarded steps.
//!
//! The gate is an explicit state machine:
//! - `Free`: nobody owns it, the slot token sits in the slot channel.
//! - `Held { completed: 0 }`: a thread took the slot and is running its first step.
//! - `Held { completed: 1 }`: the first step is done, the owner keeps the slot for the second.
//!
//! `in_step` tells an owner running a step (possibly blocked on its queue) from one parked
//! between the two halves. Only parked time counts towards the stall timeout.
//!
//! The second completed step puts the token back within the same call, so a holder with two
//! completed steps is never observable. The slot is a single `()` in a capacity-1 crossbeam
//! channel: entering means receiving it, which lets the wait be selected against a cancel token.
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Select, Sender};

use super::{CancelToken, ChannelError};

/// Number of guarded steps in a transaction.
const STEPS_PER_PAIR: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Free,
    Held { owner: ThreadId, completed: u8, in_step: bool, since: Instant },
}

pub struct PairingGate {
    name: &'static str,
    state: Mutex<GateState>,
    slot_tx: Sender<()>,
    slot_rx: Receiver<()>,
    stall_timeout: Option<Duration>,
}

impl PairingGate {
    /// `stall_timeout` bounds how long a waiter tolerates an owner sitting between its two steps.
    pub fn new(name: &'static str, stall_timeout: Option<Duration>) -> Self {
        let (slot_tx, slot_rx) = crossbeam_channel::bounded(1);
        slot_tx.send(()).expect("slot channel starts empty and connected");
        Self { name, state: Mutex::new(GateState::Free), slot_tx, slot_rx, stall_timeout }
    }

    /// Runs `op` as one step of the calling thread's transaction.
    ///
    /// A thread that does not own the gate first waits for it to be free. After the second
    /// successful step the gate is released. A cancelled first step releases the gate and
    /// returns the error unchanged, a cancelled second step keeps the gate with the caller
    /// and yields [`ChannelError::PartialPair`].
    pub fn step<R>(
        &self,
        cancel: &CancelToken,
        op: impl FnOnce() -> Result<R, ChannelError>,
    ) -> Result<R, ChannelError> {
        let me = thread::current().id();
        if self.is_held_by(me) {
            self.begin_step(me);
        } else {
            self.enter(me, cancel)?;
        }
        match op() {
            Ok(value) => {
                self.complete_step(me);
                Ok(value)
            }
            Err(err) => Err(self.interrupt_step(me, err)),
        }
    }

    /// Forces the gate back to `Free` whatever its state, waking the next waiter.
    /// Returns the number of completed steps that were discarded.
    pub fn abort(&self) -> usize {
        let mut state = self.lock_state();
        let current = *state;
        match current {
            GateState::Free => 0,
            GateState::Held { owner, completed, .. } => {
                if completed > 0 {
                    log::warn!("{} gate: aborting a half-completed pair owned by {owner:?}", self.name);
                } else {
                    log::debug!("{} gate: aborted, owner {owner:?}", self.name);
                }
                self.release(&mut state);
                usize::from(completed)
            }
        }
    }

    pub fn is_free(&self) -> bool { *self.lock_state() == GateState::Free }

    pub fn owner(&self) -> Option<ThreadId> {
        match *self.lock_state() {
            GateState::Free => None,
            GateState::Held { owner, .. } => Some(owner),
        }
    }

    /// Steps completed by the current owner, 0 when free.
    pub fn completed_steps(&self) -> usize {
        match *self.lock_state() {
            GateState::Free => 0,
            GateState::Held { completed, .. } => usize::from(completed),
        }
    }

    pub fn name(&self) -> &'static str { self.name }

    fn is_held_by(&self, thread: ThreadId) -> bool {
        matches!(*self.lock_state(), GateState::Held { owner, .. } if owner == thread)
    }

    fn begin_step(&self, me: ThreadId) {
        let mut state = self.lock_state();
        let current = *state;
        if let GateState::Held { owner, completed, since, .. } = current {
            if owner == me {
                *state = GateState::Held { owner, completed, in_step: true, since };
            }
        }
    }

    fn enter(&self, me: ThreadId, cancel: &CancelToken) -> Result<(), ChannelError> {
        loop {
            if cancel.is_cancelled() {
                return Err(ChannelError::Cancelled);
            }
            let mut sel = Select::new();
            let slot = sel.recv(&self.slot_rx);
            let stop = sel.recv(cancel.signal());
            let oper = match self.stall_timeout {
                Some(timeout) => match sel.select_deadline(self.stall_deadline(timeout)) {
                    Ok(oper) => oper,
                    Err(_) => {
                        self.check_stall(me, timeout)?;
                        continue;
                    }
                },
                None => sel.select(),
            };
            let index = oper.index();
            if index == slot {
                oper.recv(&self.slot_rx).expect("gate owns its slot sender");
                *self.lock_state() =
                    GateState::Held { owner: me, completed: 0, in_step: true, since: Instant::now() };
                log::debug!("{} gate: entered by {me:?}", self.name);
                return Ok(());
            }
            debug_assert_eq!(index, stop);
            let _ = oper.recv(cancel.signal());
            return Err(ChannelError::Cancelled);
        }
    }

    /// Earliest instant the current owner could be found stalled. Waiters sleep until then
    /// instead of polling, so they keep their registration while the owner is busy.
    fn stall_deadline(&self, timeout: Duration) -> Instant {
        match *self.lock_state() {
            GateState::Held { completed, in_step: false, since, .. } if completed > 0 => since + timeout,
            _ => Instant::now() + timeout,
        }
    }

    /// Fails when the owner has been parked between its two steps for longer than `timeout`.
    fn check_stall(&self, me: ThreadId, timeout: Duration) -> Result<(), ChannelError> {
        match *self.lock_state() {
            GateState::Held { owner, completed, in_step: false, since }
                if owner != me && completed > 0 && since.elapsed() >= timeout =>
            {
                log::error!(
                    "{} gate: {owner:?} left a pair half-done for {:?}, {me:?} gives up waiting",
                    self.name,
                    since.elapsed()
                );
                Err(ChannelError::CapacityMisuse { gate: self.name, owner: format!("{owner:?}") })
            }
            _ => Ok(()),
        }
    }

    fn complete_step(&self, me: ThreadId) {
        let mut state = self.lock_state();
        let current = *state;
        match current {
            GateState::Held { owner, completed, .. } if owner == me => {
                if completed + 1 >= STEPS_PER_PAIR {
                    self.release(&mut state);
                    log::debug!("{} gate: pair completed by {me:?}", self.name);
                } else {
                    *state =
                        GateState::Held { owner, completed: completed + 1, in_step: false, since: Instant::now() };
                }
            }
            _ => log::warn!("{} gate: {me:?} finished a step after the gate was aborted", self.name),
        }
    }

    fn interrupt_step(&self, me: ThreadId, err: ChannelError) -> ChannelError {
        let mut state = self.lock_state();
        let current = *state;
        match current {
            GateState::Held { owner, completed: 0, .. } if owner == me => {
                self.release(&mut state);
                err
            }
            GateState::Held { owner, completed, .. } if owner == me => {
                log::warn!("{} gate: {me:?} interrupted between the two halves of a pair", self.name);
                *state = GateState::Held { owner, completed, in_step: false, since: Instant::now() };
                ChannelError::PartialPair { pending: None }
            }
            _ => err,
        }
    }

    fn release(&self, state: &mut MutexGuard<'_, GateState>) {
        **state = GateState::Free;
        // The slot leaves the channel only when entering and comes back only from a held state
        self.slot_tx.try_send(()).expect("gate slot returned twice");
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
