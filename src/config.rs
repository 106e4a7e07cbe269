//! Runtime configuration for plane-cache.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! It describes the dataset's axes, the caching policy, and the synthetic
//! plane source used by the console.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::raster::Position;
use crate::strategy::{CacheStrategy, Neighborhood, Order, Priority, DEFAULT_RANGE};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "plane-cache", about = "Walk an N-dimensional plane cache")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Positions to visit, in order, as comma-separated axis values (e.g. `3,0,12`).
    #[arg(long = "visit", value_parser = parse_position)]
    pub visits: Vec<Position>,

    /// Recache in a background updater instead of on the calling thread.
    #[arg(long)]
    pub background: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Parse a position written as comma-separated axis values.
pub fn parse_position(s: &str) -> std::result::Result<Position, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid axis value {part:?}: {e}"))
        })
        .collect()
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Caching policy.
    pub cache: CacheSettings,

    /// Dataset axes, fastest-varying first.
    pub axes: Vec<AxisSettings>,

    /// Synthetic plane source.
    pub source: SourceSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            axes: vec![
                AxisSettings::new("z", 10, 2),
                AxisSettings::new("c", 3, 0),
                AxisSettings::new("t", 20, 1),
            ],
            source: SourceSettings::default(),
        }
    }
}

/// Cache policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Neighborhood shape.
    pub policy: Neighborhood,

    /// Recache synchronously on every position change.
    pub auto_update: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            policy: Neighborhood::Crosshair,
            auto_update: false,
        }
    }
}

/// One dataset axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisSettings {
    /// Display name (e.g. "z", "c", "t").
    pub name: String,

    /// Number of positions along the axis.
    pub length: usize,

    /// Ranking priority.
    #[serde(default)]
    pub priority: Priority,

    /// Eligible directions.
    #[serde(default)]
    pub order: Order,

    /// Steps along the axis eligible for caching.
    #[serde(default = "default_range")]
    pub range: usize,
}

fn default_range() -> usize {
    DEFAULT_RANGE
}

impl AxisSettings {
    pub fn new(name: &str, length: usize, range: usize) -> Self {
        Self {
            name: name.to_string(),
            length,
            priority: Priority::NORMAL,
            order: Order::Centered,
            range,
        }
    }
}

/// Synthetic plane source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Bytes per plane.
    pub plane_bytes: usize,

    /// Simulated decode latency per plane, in milliseconds.
    pub latency_ms: u64,

    /// Raster indices whose decode always fails.
    pub failing_planes: Vec<usize>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            plane_bytes: 512 * 512 * 2, // 512x512 16-bit
            latency_ms: 0,
            failing_planes: Vec::new(),
        }
    }
}

impl SourceSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Axis lengths, fastest-varying first.
    pub fn lengths(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.length).collect()
    }

    /// Total number of planes in the dataset.
    pub fn plane_count(&self) -> usize {
        self.axes.iter().map(|a| a.length).product()
    }

    /// Build the configured strategy with every axis setting applied.
    pub fn build_strategy(&self) -> Result<CacheStrategy> {
        if self.axes.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "configuration declares no axes".into(),
            ));
        }
        let mut strategy = CacheStrategy::new(self.cache.policy, self.lengths())?;
        for (axis, settings) in self.axes.iter().enumerate() {
            strategy.set_priority(axis, settings.priority)?;
            strategy.set_order(axis, settings.order)?;
            strategy.set_range(axis, settings.range)?;
        }
        Ok(strategy)
    }
}
