// src/pool/round.rs

//! Synchronization pieces shared between the pool and its worker threads.

use std::any::Any;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Identity of one invocation within a pool round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Index of this invocation, in `0..thread_count`.
    pub thread_id: usize,
    /// Number of invocations taking part in the round.
    pub thread_count: usize,
}

/// Type-erased round body as seen by a worker.
pub(crate) type RoundFn = Arc<dyn Fn(ThreadInfo) + Send + Sync>;

/// What a parked worker finds when it is woken.
pub(crate) enum Mail {
    /// Nothing posted yet; keep waiting.
    Empty,
    /// Run the round once with the given identity.
    Round { job: RoundFn, info: ThreadInfo },
    /// Empty round marker: leave the worker loop.
    Shutdown,
}

/// Single-slot mailbox a worker parks on between rounds.
pub(crate) struct Mailbox {
    mail: Mutex<Mail>,
    wake: Condvar,
}

impl Mailbox {
    pub(crate) fn new() -> Self {
        Self {
            mail: Mutex::new(Mail::Empty),
            wake: Condvar::new(),
        }
    }

    pub(crate) fn post(&self, mail: Mail) {
        let mut slot = lock(&self.mail);
        *slot = mail;
        self.wake.notify_one();
    }

    /// Block until something other than [`Mail::Empty`] is posted and take it.
    pub(crate) fn wait(&self) -> Mail {
        let mut slot = lock(&self.mail);
        loop {
            match std::mem::replace(&mut *slot, Mail::Empty) {
                Mail::Empty => {
                    slot = self.wake.wait(slot).unwrap_or_else(PoisonError::into_inner);
                }
                mail => return mail,
            }
        }
    }
}

/// Completion counter the controlling thread blocks on during a round.
pub(crate) struct Completion {
    done: Mutex<usize>,
    all_done: Condvar,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            done: Mutex::new(0),
            all_done: Condvar::new(),
        }
    }

    pub(crate) fn reset(&self) {
        *lock(&self.done) = 0;
    }

    pub(crate) fn signal(&self) {
        let mut done = lock(&self.done);
        *done += 1;
        self.all_done.notify_all();
    }

    pub(crate) fn wait_for(&self, expected: usize) {
        let mut done = lock(&self.done);
        while *done < expected {
            done = self
                .all_done
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Job panics are caught before they can unwind through a held guard, so
/// poisoning only means some unrelated code panicked; the protected data is
/// plain bookkeeping and stays usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
