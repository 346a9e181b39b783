//! The retry protocol: bounded-wait attempts, reverse-order cleanup and the
//! infinite-retry driver.

use std::time::{Duration, Instant};

use log::debug;

use crate::manager::{AcquireError, HoldToken, ResourceManager};
use crate::resource::ResourceId;

/// What one call to [`until_success`] ended up costing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptStats {
    /// Attempts driven, counting the successful one. Always >= 1.
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Infinite-retry driver: calls `attempt` with the current attempt number
/// until it reports success. There is no attempt cap and no delay between
/// attempts; the only waiting happens inside the attempt's own bounded
/// acquisitions. Livelock under sufficiently symmetric contention is an
/// accepted property of this protocol, not a bug.
pub fn until_success<F: FnMut(u64) -> bool>(mut attempt: F) -> AttemptStats {
    let started = Instant::now();
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        if attempt(attempts) {
            return AttemptStats {
                attempts,
                elapsed: started.elapsed(),
            };
        }
    }
}

/// One retry iteration's transient record: every token obtained so far, in
/// acquisition order. Dropping the attempt releases them in reverse order on
/// every exit path, panics included, so a failed attempt can never leak a
/// partial hold.
pub struct AcquisitionAttempt<'m> {
    manager: &'m ResourceManager,
    held: Vec<HoldToken>,
}

impl<'m> AcquisitionAttempt<'m> {
    pub fn new(manager: &'m ResourceManager) -> Self {
        Self {
            manager,
            held: Vec::new(),
        }
    }

    /// Bounded-wait acquisition of the next resource in the caller's order.
    /// On timeout nothing is recorded; the resources already held stay held
    /// until the attempt is dropped.
    pub fn acquire_timed(&mut self, id: ResourceId, timeout: Duration) -> Result<(), AcquireError> {
        let token = self.manager.acquire(id, timeout)?;
        self.held.push(token);
        Ok(())
    }

    /// Unbounded acquisition, for the ordered baseline.
    pub fn acquire_blocking(&mut self, id: ResourceId) {
        let token = self.manager.acquire_blocking(id);
        self.held.push(token);
    }

    /// How many resources this attempt currently holds.
    pub fn held(&self) -> usize {
        self.held.len()
    }
}

impl Drop for AcquisitionAttempt<'_> {
    fn drop(&mut self) {
        while let Some(token) = self.held.pop() {
            self.manager.release(Some(token));
        }
    }
}

/// Drives the timeout-retry protocol for one worker over a fixed order.
///
/// Per attempt: acquire each id in order under the fixed timeout, building a
/// partial hold; any timeout aborts the attempt, releases everything held in
/// reverse order and retries immediately from scratch; a full acquisition
/// runs the critical section once and terminates the loop. Timeouts never
/// escape: callers observe them only as latency and an attempt count.
pub struct RetryingAcquirer<'m> {
    manager: &'m ResourceManager,
    order: Vec<ResourceId>,
    timeout: Duration,
}

impl<'m> RetryingAcquirer<'m> {
    pub fn new(manager: &'m ResourceManager, order: Vec<ResourceId>, timeout: Duration) -> Self {
        Self {
            manager,
            order,
            timeout,
        }
    }

    fn attempt<F: FnMut()>(&self, critical: &mut F) -> bool {
        let mut attempt = AcquisitionAttempt::new(self.manager);
        for &id in &self.order {
            debug!("acquiring {:?}", id);
            if let Err(err) = attempt.acquire_timed(id, self.timeout) {
                debug!("unable to resolve all resources: {err}");
                return false;
            }
        }
        debug!("resolved all {} resources", attempt.held());
        critical();
        true
    }

    /// Retries until one attempt fully succeeds, running `critical` exactly
    /// once while every resource in the order is held.
    pub fn run_while<F: FnMut()>(&self, mut critical: F) -> AttemptStats {
        until_success(|n| {
            if n > 1 {
                debug!("retrying, attempt {n}");
            }
            self.attempt(&mut critical)
        })
    }

    pub fn run(&self) -> AttemptStats {
        self.run_while(|| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    #[test]
    fn until_success_counts_attempts() {
        let stats = until_success(|n| n == 4);
        assert_eq!(stats.attempts, 4);
    }

    #[test]
    fn attempt_drop_releases_even_on_panic() {
        let manager = ResourceManager::new(2);
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let mut attempt = AcquisitionAttempt::new(&manager);
            attempt
                .acquire_timed(ResourceId::new(0), Duration::ZERO)
                .unwrap();
            attempt
                .acquire_timed(ResourceId::new(1), Duration::ZERO)
                .unwrap();
            panic!("worker died mid-hold");
        }));
        assert!(result.is_err());
        assert!(!manager.is_held(ResourceId::new(0)));
        assert!(!manager.is_held(ResourceId::new(1)));
    }

    #[test]
    fn acquirer_retries_until_the_blocker_leaves() {
        let manager = ResourceManager::new(2);
        let critical_runs = AtomicU64::new(0);
        // taken before the acquirer starts, so the first attempt must fail
        let blocker = manager.acquire(ResourceId::new(1), Duration::ZERO).unwrap();

        let stats = thread::scope(|s| {
            let m = &manager;
            s.spawn(move || {
                thread::sleep(Duration::from_millis(150));
                m.release(Some(blocker));
            });

            let order = vec![ResourceId::new(0), ResourceId::new(1)];
            RetryingAcquirer::new(&manager, order, Duration::from_millis(20))
                .run_while(|| {
                    critical_runs.fetch_add(1, Ordering::SeqCst);
                })
        });

        assert!(stats.attempts >= 2, "expected retries, got {stats:?}");
        assert_eq!(critical_runs.load(Ordering::SeqCst), 1);
        assert!(!manager.is_held(ResourceId::new(0)));
        assert!(!manager.is_held(ResourceId::new(1)));
    }
}
