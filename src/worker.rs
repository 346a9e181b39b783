//! Workers: one logical thread of control per acquisition strategy instance.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::manager::ResourceManager;
use crate::resource::ResourceId;
use crate::retry::{AcquisitionAttempt, AttemptStats, RetryingAcquirer};

/// Which acquisition strategy a worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcquireMode {
    /// Nested unbounded blocking locks in the worker's order. Deadlock-free
    /// only when every worker shares one global total order.
    OrderedBlocking,
    /// Bounded-wait acquisition with reverse-order release on failure and
    /// unbounded immediate retry.
    TimeoutRetry,
}

/// Immutable per-worker configuration. `order` is any sequence of distinct
/// ids from the fixed set; `hold` is the time spent inside the full critical
/// section (zero in the reference behavior, scenarios use it to widen
/// contention windows).
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub name: String,
    pub order: Vec<ResourceId>,
    pub mode: AcquireMode,
    pub hold: Duration,
}

/// What a finished worker reports back to the harness.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerOutcome {
    pub name: String,
    /// Attempts driven; exactly 1 in ordered-blocking mode.
    pub attempts: u64,
    pub elapsed_ms: u64,
}

/// Runs one worker to completion. Ordered-blocking mode performs exactly one
/// nested acquisition pass; timeout-retry mode loops until a full hold.
pub fn run(manager: &ResourceManager, spec: &WorkerSpec, timeout: Duration) -> WorkerOutcome {
    debug!("worker {} starting, order {:?}", spec.name, spec.order);
    let stats = match spec.mode {
        AcquireMode::OrderedBlocking => ordered_pass(manager, spec),
        AcquireMode::TimeoutRetry => {
            RetryingAcquirer::new(manager, spec.order.clone(), timeout)
                .run_while(|| hold_for(spec.hold))
        }
    };
    info!(
        "worker {} done after {} attempt(s) in {:?}",
        spec.name, stats.attempts, stats.elapsed
    );
    WorkerOutcome {
        name: spec.name.clone(),
        attempts: stats.attempts,
        elapsed_ms: stats.elapsed.as_millis() as u64,
    }
}

fn ordered_pass(manager: &ResourceManager, spec: &WorkerSpec) -> AttemptStats {
    let started = Instant::now();
    let mut attempt = AcquisitionAttempt::new(manager);
    for &id in &spec.order {
        debug!("worker {} acquiring {:?} (blocking)", spec.name, id);
        attempt.acquire_blocking(id);
    }
    hold_for(spec.hold);
    drop(attempt);
    AttemptStats {
        attempts: 1,
        elapsed: started.elapsed(),
    }
}

fn hold_for(hold: Duration) {
    if !hold.is_zero() {
        thread::sleep(hold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource;

    #[test]
    fn ordered_pass_is_a_single_attempt() {
        let manager = ResourceManager::new(3);
        let spec = WorkerSpec {
            name: "solo".to_string(),
            order: resource::ascending(3),
            mode: AcquireMode::OrderedBlocking,
            hold: Duration::ZERO,
        };

        let outcome = run(&manager, &spec, Duration::ZERO);
        assert_eq!(outcome.attempts, 1);
        assert!(manager.resource_ids().all(|id| !manager.is_held(id)));
    }

    #[test]
    fn uncontended_retry_worker_succeeds_first_try() {
        let manager = ResourceManager::new(3);
        let spec = WorkerSpec {
            name: "solo".to_string(),
            order: resource::ascending(3),
            mode: AcquireMode::TimeoutRetry,
            hold: Duration::ZERO,
        };

        let outcome = run(&manager, &spec, Duration::from_millis(100));
        assert_eq!(outcome.attempts, 1);
        assert!(manager.resource_ids().all(|id| !manager.is_held(id)));
    }
}
