//! Deterministic in-memory plane reader.
//!
//! Produces patterned planes so callers can check which index a payload came
//! from. Latency and failures can be injected to exercise slow or broken
//! decoders.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::BoxError;
use crate::source::PlaneReader;

#[derive(Debug, Clone)]
pub struct SyntheticReader {
    plane_count: usize,
    plane_bytes: usize,
    latency: Duration,
    failing: HashSet<usize>,
    reads: Arc<AtomicUsize>,
}

impl SyntheticReader {
    pub fn new(plane_count: usize, plane_bytes: usize) -> Self {
        Self {
            plane_count,
            plane_bytes,
            latency: Duration::ZERO,
            failing: HashSet::new(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep for `latency` on every read.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every read of the given plane indices.
    pub fn with_failing(mut self, planes: impl IntoIterator<Item = usize>) -> Self {
        self.failing.extend(planes);
        self
    }

    /// Shared counter of `read_plane` calls, including failed ones.
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// The bytes this reader yields for `index`.
    pub fn expected_plane(index: usize, plane_bytes: usize) -> Vec<u8> {
        (0..plane_bytes)
            .map(|offset| (index.wrapping_mul(31).wrapping_add(offset) & 0xff) as u8)
            .collect()
    }
}

impl PlaneReader for SyntheticReader {
    fn plane_count(&self) -> usize {
        self.plane_count
    }

    fn read_plane(&mut self, index: usize) -> Result<Vec<u8>, BoxError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.failing.contains(&index) {
            return Err(format!("plane {index} failed to decode").into());
        }
        Ok(Self::expected_plane(index, self.plane_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planes_are_distinct_per_index() {
        let mut reader = SyntheticReader::new(4, 16);
        let a = reader.read_plane(1).unwrap();
        let b = reader.read_plane(2).unwrap();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert_eq!(a, SyntheticReader::expected_plane(1, 16));
        assert_eq!(reader.reads(), 2);
    }

    #[test]
    fn test_injected_failures() {
        let mut reader = SyntheticReader::new(4, 8).with_failing([3]);
        assert!(reader.read_plane(2).is_ok());
        let err = reader.read_plane(3).unwrap_err();
        assert_eq!(err.to_string(), "plane 3 failed to decode");
        assert_eq!(reader.read_counter().load(Ordering::SeqCst), 2);
    }
}
