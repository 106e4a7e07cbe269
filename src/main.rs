//! plane-cache console.
//!
//! Walks a synthetic N-dimensional dataset through the plane cache, visiting
//! each `--visit` position in turn and reporting what stays resident.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use plane_cache::cache::Cache;
use plane_cache::config::{Cli, Config};
use plane_cache::event::TracingListener;
use plane_cache::source::{ByteSource, SyntheticReader};
use plane_cache::updater::{CacheUpdater, UpdateReport};

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "plane_cache=debug"
    } else {
        "plane_cache=info"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("plane-cache v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;

    info!(
        policy = %config.cache.policy,
        axes = ?config.axes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
        lengths = ?config.lengths(),
        planes = config.plane_count(),
        "Configuration loaded"
    );

    // Build the synthetic source and the cache.
    let reader = SyntheticReader::new(config.plane_count(), config.source.plane_bytes)
        .with_latency(config.source.latency())
        .with_failing(config.source.failing_planes.iter().copied());
    let strategy = config.build_strategy()?;
    let cache = Cache::new(strategy, ByteSource::new(reader), config.cache.auto_update)?;
    cache.add_listener(Arc::new(TracingListener));

    let visits = if cli.visits.is_empty() {
        vec![vec![0; config.axes.len()]]
    } else {
        cli.visits.clone()
    };

    // The cache is either idle here or owned by a running updater.
    let mut idle = Some(cache);
    let mut running: Option<CacheUpdater<_>> = None;

    for pos in &visits {
        let mut cache = match running.take() {
            Some(updater) => {
                let (cache, report) = updater.stop()?;
                log_report(&report);
                cache
            }
            None => idle
                .take()
                .ok_or_else(|| anyhow::anyhow!("cache is not available"))?,
        };

        // Auto-update mode recaches here, so a failing plane surfaces now.
        if let Err(e) = cache.set_position(pos) {
            warn!(position = ?pos, error = %e, "Move failed");
        }

        if cli.background {
            running = Some(CacheUpdater::start(cache)?);
            continue;
        }

        if !cache.is_auto_update() {
            if let Err(e) = cache.recache_all() {
                warn!(error = %e, "Recache ended early");
            }
        }
        info!(
            resident = cache.resident_count(),
            planes = ?cache.resident_indices(),
            "Visited position"
        );
        idle = Some(cache);
    }

    let cache = match running.take() {
        Some(updater) => {
            let (cache, report) = updater.wait()?;
            log_report(&report);
            cache
        }
        None => idle
            .take()
            .ok_or_else(|| anyhow::anyhow!("cache is not available"))?,
    };

    info!(
        position = ?cache.position(),
        resident = cache.resident_count(),
        capacity = cache.capacity(),
        bytes = cache.resident_count() * config.source.plane_bytes,
        "Walk complete"
    );

    Ok(())
}

fn log_report(report: &UpdateReport) {
    match &report.error {
        Some(e) => warn!(
            completed = report.steps_completed,
            planned = report.planned,
            error = %e,
            "Background recache ended early"
        ),
        None if report.cancelled => info!(
            completed = report.steps_completed,
            planned = report.planned,
            "Background recache interrupted"
        ),
        None => info!(planned = report.planned, "Background recache complete"),
    }
}
