//! The cache orchestrator.
//!
//! [`Cache`] owns the resident objects, the current position and the active
//! strategy and source, and reconciles the resident set with the strategy's
//! load list:
//! - [`plan`]: load list resolved to raster indices
//! - [`storage`]: slot table of resident objects
//!
//! A recache sweep first drops every resident object that is no longer on the
//! load list, then loads the missing entries nearest first. A failed load
//! never undoes the drops that preceded it.

pub mod plan;
mod storage;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::event::{CacheEvent, CacheListener, ListenerRegistry};
use crate::raster;
use crate::source::CacheSource;
use crate::strategy::CacheStrategy;

pub use plan::LoadPlan;
use storage::Storage;

/// Keeps the neighborhood of the current position resident.
pub struct Cache<T> {
    source: Option<Box<dyn CacheSource<Object = T>>>,
    strategy: Option<CacheStrategy>,
    position: Vec<usize>,
    storage: Storage<T>,
    /// Recache synchronously whenever the position changes.
    auto_update: bool,
    listeners: ListenerRegistry,
}

impl<T> Cache<T> {
    /// Create a cache over `source` ranked by `strategy`, positioned at the
    /// origin with nothing resident.
    pub fn new<S>(strategy: CacheStrategy, source: S, auto_update: bool) -> Result<Self>
    where
        S: CacheSource<Object = T> + 'static,
    {
        let count = source.count()?;
        let mut cache = Self::unconfigured(auto_update);
        cache.strategy = Some(strategy);
        cache.source = Some(Box::new(source));
        cache.reallocate(count);
        Ok(cache)
    }

    /// A cache with no source or strategy yet.
    pub fn unconfigured(auto_update: bool) -> Self {
        Self {
            source: None,
            strategy: None,
            position: Vec::new(),
            storage: Storage::with_capacity(0),
            auto_update,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Reallocate storage to the source's object count and return to the
    /// origin, discarding everything resident.
    pub fn reset(&mut self) -> Result<()> {
        let source = self.source.as_ref().ok_or_else(missing_source)?;
        if self.strategy.is_none() {
            return Err(missing_strategy());
        }
        let count = source.count()?;
        self.reallocate(count);
        Ok(())
    }

    /// Replace the source and reset storage.
    pub fn set_source<S>(&mut self, source: S) -> Result<()>
    where
        S: CacheSource<Object = T> + 'static,
    {
        let count = source.count()?;
        self.source = Some(Box::new(source));
        self.listeners.notify(CacheEvent::SourceChanged);
        if self.strategy.is_some() {
            self.reallocate(count);
        }
        Ok(())
    }

    /// Replace the strategy and reset storage.
    ///
    /// Listeners of the previous strategy move to the new one. Returns the
    /// previous strategy.
    pub fn set_strategy(&mut self, strategy: CacheStrategy) -> Result<Option<CacheStrategy>> {
        let count = self.source.as_ref().map(|s| s.count()).transpose()?;

        if let Some(old) = &self.strategy {
            for listener in old.listeners().drain() {
                strategy.add_listener(listener);
            }
        }
        for listener in self.listeners.snapshot() {
            strategy.add_listener(listener);
        }

        let previous = self.strategy.replace(strategy);
        self.listeners.notify(CacheEvent::StrategyChanged);
        if let Some(count) = count {
            self.reallocate(count);
        }
        Ok(previous)
    }

    /// Move to `pos`. In auto-update mode this also runs [`Cache::recache_all`].
    pub fn set_position(&mut self, pos: &[usize]) -> Result<()> {
        let strategy = self.strategy.as_ref().ok_or_else(missing_strategy)?;
        let index = raster::position_to_raster(strategy.lengths(), pos)?;

        self.position.clear();
        self.position.extend_from_slice(pos);
        self.listeners.notify(CacheEvent::PositionChanged(index));

        if self.auto_update {
            self.recache_all()?;
        }
        Ok(())
    }

    pub fn position(&self) -> &[usize] {
        &self.position
    }

    /// The cached object at `pos`, if resident.
    pub fn get(&self, pos: &[usize]) -> Result<Option<&T>> {
        let index = self.slot(pos)?;
        Ok(self.storage.get(index))
    }

    pub fn get_mut(&mut self, pos: &[usize]) -> Result<Option<&mut T>> {
        let index = self.slot(pos)?;
        Ok(self.storage.get_mut(index))
    }

    pub fn is_resident(&self, pos: &[usize]) -> Result<bool> {
        let index = self.slot(pos)?;
        Ok(self.storage.is_resident(index))
    }

    pub fn is_index_resident(&self, index: usize) -> bool {
        self.storage.is_resident(index)
    }

    /// Resident raster indices, ascending.
    pub fn resident_indices(&self) -> Vec<usize> {
        self.storage.resident().collect()
    }

    pub fn resident_count(&self) -> usize {
        self.storage.resident_count()
    }

    /// Number of storage slots (the source's object count at last reset).
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The strategy's load list for the current position.
    pub fn load_list(&self) -> Result<Vec<Vec<usize>>> {
        let strategy = self.strategy.as_ref().ok_or_else(missing_strategy)?;
        strategy.load_list(&self.position)
    }

    /// The load list for the current position as raster indices.
    pub fn load_plan(&self) -> Result<LoadPlan> {
        let strategy = self.strategy.as_ref().ok_or_else(missing_strategy)?;
        let capacity = self.storage.capacity();
        let indices = strategy
            .load_list(&self.position)?
            .iter()
            .map(|pos| {
                let index = raster::position_to_raster(strategy.lengths(), pos)?;
                if index >= capacity {
                    return Err(CacheError::InternalInconsistency { index, capacity });
                }
                Ok(index)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(LoadPlan::new(indices))
    }

    /// Drop everything off the load list, then load entry `n` if missing.
    ///
    /// `n` past the end of the list only performs the drops.
    pub fn recache_step(&mut self, n: usize) -> Result<()> {
        let plan = self.load_plan()?;
        self.apply_step(&plan, n)
    }

    /// Bring the resident set in line with the whole load list, nearest first.
    pub fn recache_all(&mut self) -> Result<()> {
        let plan = self.load_plan()?;
        let dropped = self.evict_stale(&plan);
        let mut loaded = 0;
        for &index in plan.indices() {
            if self.load(index)? {
                loaded += 1;
            }
        }
        debug!(
            loaded,
            dropped,
            resident = self.storage.resident_count(),
            "Recache complete"
        );
        Ok(())
    }

    /// One step of a sweep against a precomputed plan.
    pub(crate) fn apply_step(&mut self, plan: &LoadPlan, n: usize) -> Result<()> {
        self.evict_stale(plan);
        if let Some(index) = plan.get(n) {
            self.load(index)?;
        }
        Ok(())
    }

    pub fn strategy(&self) -> Option<&CacheStrategy> {
        self.strategy.as_ref()
    }

    /// Mutable access for adjusting priorities, orders and ranges.
    ///
    /// Changes take effect on the next recache.
    pub fn strategy_mut(&mut self) -> Option<&mut CacheStrategy> {
        self.strategy.as_mut()
    }

    pub fn source(&self) -> Option<&dyn CacheSource<Object = T>> {
        self.source.as_deref()
    }

    pub fn is_auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
    }

    /// Register a listener for cache and strategy events.
    pub fn add_listener(&self, listener: Arc<dyn CacheListener>) -> bool {
        if let Some(strategy) = &self.strategy {
            strategy.add_listener(listener.clone());
        }
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn CacheListener>) -> bool {
        if let Some(strategy) = &self.strategy {
            strategy.remove_listener(listener);
        }
        self.listeners.remove(listener)
    }

    /// Shared handle to the cache's listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    fn reallocate(&mut self, count: usize) {
        let dims = self.strategy.as_ref().map_or(0, CacheStrategy::dimensions);
        if let Some(strategy) = &self.strategy {
            if strategy.raster_length() != count {
                warn!(
                    strategy_positions = strategy.raster_length(),
                    source_objects = count,
                    "Strategy axis space does not match source object count"
                );
            }
        }

        let discarded = self.storage.resident_count();
        self.storage = Storage::with_capacity(count);
        self.position = vec![0; dims];
        info!(capacity = count, dimensions = dims, discarded, "Cache storage reset");
    }

    fn slot(&self, pos: &[usize]) -> Result<usize> {
        let strategy = self.strategy.as_ref().ok_or_else(missing_strategy)?;
        let index = raster::position_to_raster(strategy.lengths(), pos)?;
        let capacity = self.storage.capacity();
        if index >= capacity {
            return Err(CacheError::InternalInconsistency { index, capacity });
        }
        Ok(index)
    }

    fn evict_stale(&mut self, plan: &LoadPlan) -> usize {
        let stale = self.storage.stale(plan.members());
        for &index in &stale {
            self.storage.remove(index);
            debug!(index, "Dropped object");
            self.listeners.notify(CacheEvent::ObjectDropped(index));
        }
        stale.len()
    }

    /// Load `index` from the source unless already resident.
    fn load(&mut self, index: usize) -> Result<bool> {
        if self.storage.is_resident(index) {
            return Ok(false);
        }
        let source = self.source.as_mut().ok_or_else(missing_source)?;
        match source.get(index) {
            Ok(object) => {
                self.storage.insert(index, object);
                debug!(index, "Loaded object");
                self.listeners.notify(CacheEvent::ObjectLoaded(index));
                Ok(true)
            }
            Err(e) => {
                warn!(index, error = %e, "Failed to load object");
                Err(e)
            }
        }
    }
}

impl<T> std::fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("position", &self.position)
            .field("capacity", &self.storage.capacity())
            .field("resident", &self.storage.resident_count())
            .field("strategy", &self.strategy)
            .field("has_source", &self.source.is_some())
            .field("auto_update", &self.auto_update)
            .finish()
    }
}

fn missing_source() -> CacheError {
    CacheError::InvalidConfiguration("cache has no source".into())
}

fn missing_strategy() -> CacheError {
    CacheError::InvalidConfiguration("cache has no strategy".into())
}
