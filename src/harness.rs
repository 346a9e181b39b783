//! "Run K workers concurrently" harness with a bounded observation window.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::manager::ResourceManager;
use crate::report::RunReport;
use crate::worker::{self, WorkerOutcome, WorkerSpec};

/// Spawns one detached named thread per worker and collects their outcomes
/// over a channel. Workers that block forever, the ordered baseline's
/// hazard, simply never report; the pool itself never blocks past its
/// observation window.
pub struct WorkerPool {
    outcomes: mpsc::Receiver<WorkerOutcome>,
    names: Vec<String>,
}

impl WorkerPool {
    /// `stagger` sleeps between consecutive spawns so scenario interleavings
    /// are reproducible; the adversarial schedules depend on who locks first.
    pub fn spawn(
        manager: Arc<ResourceManager>,
        specs: Vec<WorkerSpec>,
        timeout: Duration,
        stagger: Duration,
    ) -> io::Result<Self> {
        let (tx, outcomes) = mpsc::channel();
        let mut names = Vec::with_capacity(specs.len());
        let last = specs.len().saturating_sub(1);
        for (i, spec) in specs.into_iter().enumerate() {
            names.push(spec.name.clone());
            let manager = Arc::clone(&manager);
            let tx = tx.clone();
            thread::Builder::new().name(spec.name.clone()).spawn(move || {
                let outcome = worker::run(&manager, &spec, timeout);
                // The pool may have stopped listening already.
                let _ = tx.send(outcome);
            })?;
            if i < last && !stagger.is_zero() {
                thread::sleep(stagger);
            }
        }
        Ok(Self { outcomes, names })
    }

    /// Bounded observation: collects outcomes until every worker reported or
    /// the window elapsed. Stragglers are abandoned, not joined, since
    /// joining a wedged baseline worker would block the observer forever.
    pub fn await_within(self, window: Duration) -> RunReport {
        let deadline = Instant::now() + window;
        let mut completed: Vec<WorkerOutcome> = Vec::with_capacity(self.names.len());
        while completed.len() < self.names.len() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.outcomes.recv_timeout(left) {
                Ok(outcome) => {
                    debug!("worker {} reported", outcome.name);
                    completed.push(outcome);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let stalled: Vec<String> = self
            .names
            .iter()
            .filter(|name| completed.iter().all(|o| &o.name != *name))
            .cloned()
            .collect();
        for name in &stalled {
            warn!("worker {name} did not report within {window:?}");
        }
        RunReport::new(window, completed, stalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;
    use crate::worker::AcquireMode;

    #[test]
    fn pool_collects_every_outcome() {
        let manager = Arc::new(ResourceManager::new(2));
        let specs = vec![
            WorkerSpec {
                name: "a".to_string(),
                order: vec![ResourceId::new(0)],
                mode: AcquireMode::TimeoutRetry,
                hold: Duration::ZERO,
            },
            WorkerSpec {
                name: "b".to_string(),
                order: vec![ResourceId::new(1)],
                mode: AcquireMode::TimeoutRetry,
                hold: Duration::ZERO,
            },
        ];

        let pool =
            WorkerPool::spawn(manager, specs, Duration::from_millis(100), Duration::ZERO).unwrap();
        let report = pool.await_within(Duration::from_secs(5));
        assert!(report.all_completed());
        assert_eq!(report.completed.len(), 2);
    }
}
