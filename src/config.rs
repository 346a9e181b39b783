use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::resource::{self, ResourceId};
use crate::worker::{AcquireMode, WorkerSpec};

/// Scenario configuration, fixed before anything runs. Every field has a
/// default matching the reference behavior: three resources, a 1000 ms
/// per-resource timeout and the adversarial three-worker timeout-retry trio.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunConfig {
    #[serde(default = "default_resources")]
    pub resources: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkerConfig {
    pub order: Vec<u32>,
    #[serde(default = "default_mode")]
    pub mode: AcquireMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            resources: default_resources(),
            timeout_ms: default_timeout_ms(),
            window_ms: default_window_ms(),
            hold_ms: default_hold_ms(),
            stagger_ms: default_stagger_ms(),
            workers: default_workers(),
        }
    }
}

impl RunConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        let config: RunConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config is user input: invalid orders are recoverable errors here,
    /// unlike out-of-range ids handed directly to the manager API.
    pub fn validate(&self) -> Result<()> {
        if self.resources == 0 {
            bail!("resources must be at least 1");
        }
        if self.workers.is_empty() {
            bail!("at least one worker is required");
        }
        for (i, worker) in self.workers.iter().enumerate() {
            if worker.order.is_empty() {
                bail!("worker {i} has an empty acquisition order");
            }
            let order: Vec<ResourceId> =
                worker.order.iter().copied().map(ResourceId::new).collect();
            if !resource::is_valid_order(&order, self.resources) {
                bail!(
                    "worker {i} order {:?} is not a sequence of distinct ids below {}",
                    worker.order,
                    self.resources
                );
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    /// Materializes the configured workers as specs named `worker-0..`.
    pub fn worker_specs(&self) -> Vec<WorkerSpec> {
        self.workers
            .iter()
            .enumerate()
            .map(|(i, w)| WorkerSpec {
                name: format!("worker-{i}"),
                order: w.order.iter().copied().map(ResourceId::new).collect(),
                mode: w.mode,
                hold: self.hold(),
            })
            .collect()
    }
}

fn default_resources() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_window_ms() -> u64 {
    5000
}

fn default_hold_ms() -> u64 {
    0
}

fn default_stagger_ms() -> u64 {
    0
}

fn default_mode() -> AcquireMode {
    AcquireMode::TimeoutRetry
}

// The reference adversarial scenario: three workers with asymmetric orders.
fn default_workers() -> Vec<WorkerConfig> {
    vec![
        WorkerConfig {
            order: vec![0, 1, 2],
            mode: AcquireMode::TimeoutRetry,
        },
        WorkerConfig {
            order: vec![2, 1, 0],
            mode: AcquireMode::TimeoutRetry,
        },
        WorkerConfig {
            order: vec![1, 0, 2],
            mode: AcquireMode::TimeoutRetry,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.resources, 3);
        assert_eq!(config.timeout_ms, 1000);
        assert_eq!(config.workers.len(), 3);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
            resources = 2

            [[workers]]
            order = [1, 0]

            [[workers]]
            order = [0]
            mode = "ordered-blocking"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.timeout_ms, 1000);
        assert_eq!(config.workers[0].mode, AcquireMode::TimeoutRetry);
        assert_eq!(config.workers[1].mode, AcquireMode::OrderedBlocking);
    }

    #[test]
    fn duplicate_ids_in_an_order_are_rejected() {
        let mut config = RunConfig::default();
        config.workers[0].order = vec![1, 1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_order_is_rejected() {
        let mut config = RunConfig::default();
        config.workers[0].order = vec![0, 3];
        assert!(config.validate().is_err());
    }

    #[test]
    fn worker_specs_carry_the_configured_orders() {
        let specs = RunConfig::default().worker_specs();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[1].name, "worker-1");
        assert_eq!(
            specs[1].order,
            vec![ResourceId::new(2), ResourceId::new(1), ResourceId::new(0)]
        );
    }
}
