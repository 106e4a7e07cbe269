//! Slot table holding resident objects by raster index.

use std::collections::{BTreeSet, HashSet};

/// Fixed-size slot table.
///
/// A slot is resident exactly when it holds a value; `resident` mirrors the
/// occupied slots so sweeps touch only what is cached.
#[derive(Debug)]
pub(crate) struct Storage<T> {
    objects: Vec<Option<T>>,
    resident: BTreeSet<usize>,
}

impl<T> Storage<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut objects = Vec::with_capacity(capacity);
        objects.resize_with(capacity, || None);
        Self {
            objects,
            resident: BTreeSet::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub(crate) fn is_resident(&self, index: usize) -> bool {
        self.resident.contains(&index)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.objects.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.objects.get_mut(index).and_then(Option::as_mut)
    }

    /// Store `object` at `index`. The caller guarantees `index < capacity`.
    pub(crate) fn insert(&mut self, index: usize, object: T) {
        self.objects[index] = Some(object);
        self.resident.insert(index);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        self.resident.remove(&index);
        self.objects.get_mut(index).and_then(Option::take)
    }

    /// Resident indices, ascending.
    pub(crate) fn resident(&self) -> impl Iterator<Item = usize> + '_ {
        self.resident.iter().copied()
    }

    /// Resident indices not in `keep`, ascending.
    pub(crate) fn stale(&self, keep: &HashSet<usize>) -> Vec<usize> {
        self.resident().filter(|i| !keep.contains(i)).collect()
    }
}
