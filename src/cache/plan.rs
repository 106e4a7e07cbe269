//! Load plan: the load list resolved to raster indices.

use std::collections::HashSet;

/// Raster indices that should be resident, nearest first.
#[derive(Debug, Clone, Default)]
pub struct LoadPlan {
    order: Vec<usize>,
    members: HashSet<usize>,
}

impl LoadPlan {
    pub(crate) fn new(order: Vec<usize>) -> Self {
        let members = order.iter().copied().collect();
        Self { order, members }
    }

    /// Raster index at step `n`, if the plan is that long.
    pub fn get(&self, n: usize) -> Option<usize> {
        self.order.get(n).copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.order
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn members(&self) -> &HashSet<usize> {
        &self.members
    }
}
