//! Timed mutual exclusion for a single resource.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One mutual-exclusion primitive per resource: state is free or held, with
/// at most one holder at any instant.
///
/// Built on `Mutex<bool>` + `Condvar` so the bounded wait maps directly onto
/// `wait_timeout_while`. Poisoned guards are taken over with `into_inner`;
/// the flag is only ever written under the mutex, so a panicking holder
/// cannot leave the lock mid-transition.
pub struct TimedLock {
    held: Mutex<bool>,
    freed: Condvar,
}

impl TimedLock {
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(false),
            freed: Condvar::new(),
        }
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bounded-wait acquisition: blocks the caller for at most `timeout` and
    /// returns `true` iff exclusive ownership was obtained. Timing out is an
    /// ordinary outcome of the protocol, not a failure of the lock.
    pub fn try_acquire_for(&self, timeout: Duration) -> bool {
        let flag = self.flag();
        let (mut flag, _) = self
            .freed
            .wait_timeout_while(flag, timeout, |held| *held)
            .unwrap_or_else(PoisonError::into_inner);
        if *flag {
            false
        } else {
            *flag = true;
            true
        }
    }

    /// Unbounded blocking acquisition, used only by the ordered baseline.
    pub fn acquire(&self) {
        let flag = self.flag();
        let mut flag = self
            .freed
            .wait_while(flag, |held| *held)
            .unwrap_or_else(PoisonError::into_inner);
        *flag = true;
    }

    /// Relinquishes ownership and wakes one waiter.
    pub fn release(&self) {
        *self.flag() = false;
        self.freed.notify_one();
    }

    /// Holder-state snapshot, for diagnostics and tests.
    pub fn is_held(&self) -> bool {
        *self.flag()
    }
}

impl Default for TimedLock {
    fn default() -> Self {
        Self::new()
    }
}
