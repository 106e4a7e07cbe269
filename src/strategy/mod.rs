//! Load-list strategies.
//!
//! A [`CacheStrategy`] decides which positions around the current one should
//! be resident, and in what order. The neighborhood shape is chosen by
//! [`Neighborhood`]; ranking is shared (see [`ranking`]):
//! - [`Neighborhood::Crosshair`]: positions differing from the current one
//!   along exactly one axis
//! - [`Neighborhood::Rectangle`]: every combination of per-axis offsets
//!   within range

pub mod axis;
pub mod ranking;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::event::{CacheEvent, CacheListener, ListenerRegistry};
use crate::raster;

pub use axis::{Order, Priority};
pub use ranking::Offset;

use ranking::AxisSpace;

/// Range given to every axis of a new strategy.
pub const DEFAULT_RANGE: usize = 1;

/// Shape of the neighborhood eligible for caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Neighborhood {
    /// Only positions diverging from the current one along a single axis.
    #[default]
    Crosshair,
    /// All positions within range along every axis, diagonals included.
    Rectangle,
}

impl std::fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Neighborhood::Crosshair => write!(f, "crosshair"),
            Neighborhood::Rectangle => write!(f, "rectangle"),
        }
    }
}

/// Ranks neighbor positions for a fixed axis space.
///
/// Priority scales the cost of each step along an axis from 1 (`MAX`) to 21
/// (`MIN`), with `NORMAL` at 11. A `MAX` axis therefore reaches about ten
/// steps out before a `NORMAL` axis takes its first one.
#[derive(Debug)]
pub struct CacheStrategy {
    neighborhood: Neighborhood,
    lengths: Vec<usize>,
    priorities: Vec<Priority>,
    orders: Vec<Order>,
    ranges: Vec<usize>,
    /// Candidate offsets in final order; rebuilt on every configuration change.
    offsets: Vec<Offset>,
    listeners: ListenerRegistry,
}

impl CacheStrategy {
    /// Create a strategy over axes of the given lengths with default
    /// priority, order and range on every axis.
    pub fn new(neighborhood: Neighborhood, lengths: Vec<usize>) -> Result<Self> {
        raster::raster_length(&lengths)?;
        let dims = lengths.len();
        let mut strategy = Self {
            neighborhood,
            lengths,
            priorities: vec![Priority::NORMAL; dims],
            orders: vec![Order::Centered; dims],
            ranges: vec![DEFAULT_RANGE; dims],
            offsets: Vec::new(),
            listeners: ListenerRegistry::new(),
        };
        strategy.rebuild();
        Ok(strategy)
    }

    pub fn crosshair(lengths: Vec<usize>) -> Result<Self> {
        Self::new(Neighborhood::Crosshair, lengths)
    }

    pub fn rectangle(lengths: Vec<usize>) -> Result<Self> {
        Self::new(Neighborhood::Rectangle, lengths)
    }

    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn dimensions(&self) -> usize {
        self.lengths.len()
    }

    pub fn priorities(&self) -> &[Priority] {
        &self.priorities
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn ranges(&self) -> &[usize] {
        &self.ranges
    }

    pub fn set_priority(&mut self, axis: usize, priority: impl Into<Priority>) -> Result<()> {
        self.check_axis(axis)?;
        self.priorities[axis] = priority.into();
        self.rebuild();
        self.listeners.notify(CacheEvent::PrioritiesChanged(axis));
        Ok(())
    }

    pub fn set_order(&mut self, axis: usize, order: Order) -> Result<()> {
        self.check_axis(axis)?;
        self.orders[axis] = order;
        self.rebuild();
        self.listeners.notify(CacheEvent::OrderChanged(axis));
        Ok(())
    }

    pub fn set_range(&mut self, axis: usize, range: usize) -> Result<()> {
        self.check_axis(axis)?;
        self.ranges[axis] = range;
        self.rebuild();
        self.listeners.notify(CacheEvent::RangeChanged(axis));
        Ok(())
    }

    /// Every offset this strategy may request, nearest first.
    pub fn candidate_offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Positions to keep resident around `current`, nearest first.
    ///
    /// The first entry is always `current` itself.
    pub fn load_list(&self, current: &[usize]) -> Result<Vec<Vec<usize>>> {
        raster::validate_position(&self.lengths, current)?;
        Ok(self
            .offsets
            .iter()
            .filter_map(|offset| raster::offset_position(&self.lengths, current, offset))
            .collect())
    }

    /// Number of positions in the axis space.
    pub fn raster_length(&self) -> usize {
        self.lengths.iter().product()
    }

    pub fn add_listener(&self, listener: Arc<dyn CacheListener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn CacheListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.lengths.len() {
            return Err(CacheError::InvalidConfiguration(format!(
                "axis {axis} out of range for {} dimensions",
                self.lengths.len()
            )));
        }
        Ok(())
    }

    fn rebuild(&mut self) {
        let space = AxisSpace {
            lengths: &self.lengths,
            priorities: &self.priorities,
            orders: &self.orders,
            ranges: &self.ranges,
        };
        self.offsets = ranking::ranked_offsets(self.neighborhood, &space);
        debug!(
            neighborhood = %self.neighborhood,
            candidates = self.offsets.len(),
            "Rebuilt candidate offsets"
        );
    }
}
