use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use log::info;
use rand::seq::SliceRandom;

use contend::config::{RunConfig, WorkerConfig};
use contend::harness::WorkerPool;
use contend::manager::ResourceManager;
use contend::options::Options;
use contend::worker::AcquireMode;

fn main() -> anyhow::Result<ExitCode> {
    let e = env_logger::Env::new()
        .filter_or("CONTEND_LOG", "info")
        .write_style("CONTEND_LOG_STYLE");
    env_logger::init_from_env(e);

    let options = Options::parse().map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mut config = match &options.config {
        Some(path) => RunConfig::load_from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(n) = options.resources {
        config.resources = n;
    }
    if let Some(t) = options.timeout_ms {
        config.timeout_ms = t;
    }
    if let Some(w) = options.window_ms {
        config.window_ms = w;
    }
    if let Some(k) = options.workers {
        config.workers = rotated_workers(
            k,
            config.resources,
            options.mode.unwrap_or(AcquireMode::TimeoutRetry),
        );
    }
    if let Some(mode) = options.mode {
        for worker in &mut config.workers {
            worker.mode = mode;
        }
    }
    if options.shuffle {
        let mut rng = rand::rng();
        for worker in &mut config.workers {
            worker.order.shuffle(&mut rng);
        }
    }
    config.validate()?;

    let manager = Arc::new(ResourceManager::new(config.resources));
    let specs = config.worker_specs();
    info!(
        "running {} workers over {} resources (timeout {} ms, window {} ms)",
        specs.len(),
        config.resources,
        config.timeout_ms,
        config.window_ms
    );

    let pool = WorkerPool::spawn(manager, specs, config.timeout(), config.stagger())
        .context("failed to spawn workers")?;
    let report = pool.await_within(config.window());

    print!("{report}");
    report
        .save_to_file(&options.output)
        .with_context(|| format!("Failed to write report to {}", options.output))?;

    Ok(if report.all_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// K workers whose orders are rotations of the ascending order, so every
/// worker starts at a different resource and contention is guaranteed.
fn rotated_workers(k: u32, resources: u32, mode: AcquireMode) -> Vec<WorkerConfig> {
    (0..k)
        .map(|i| {
            let mut order: Vec<u32> = (0..resources).collect();
            order.rotate_left((i % resources.max(1)) as usize);
            WorkerConfig { order, mode }
        })
        .collect()
}
