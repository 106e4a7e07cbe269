//! plane-cache: N-dimensional plane cache.
//!
//! Keeps the neighborhood of a moving "current position" resident in memory
//! for datasets indexed by several axes (focal plane, channel, timepoint...):
//!   position → strategy load list → evict stale → load missing (nearest first)
//!
//! - [`strategy`]: which neighbors to keep, and in what order
//! - [`cache`]: resident storage and incremental recaching
//! - [`updater`]: recaching on a background thread with cancellation
//! - [`source`]: where objects come from
//! - [`event`]: lifecycle notifications

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod raster;
pub mod source;
pub mod strategy;
pub mod updater;

pub use cache::Cache;
pub use error::{CacheError, Result};
pub use event::{CacheEvent, CacheListener};
pub use source::CacheSource;
pub use strategy::{CacheStrategy, Neighborhood, Order, Priority};
pub use updater::CacheUpdater;
