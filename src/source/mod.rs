//! Object sources consumed by the cache.
//!
//! - [`CacheSource`]: the interface the cache pulls objects through
//! - [`ByteSource`]: adapts a [`PlaneReader`] (an external format decoder)
//! - [`FnSource`]: wraps a producer closure
//! - [`synthetic`]: deterministic in-memory reader for demos and tests

pub mod synthetic;

use bytes::Bytes;
use tracing::debug;

use crate::error::{BoxError, CacheError, Result};

pub use synthetic::SyntheticReader;

/// Produces objects by raster index.
///
/// Sources are not required to be safe for concurrent use; the cache only
/// ever calls them from one thread at a time.
pub trait CacheSource: Send {
    type Object;

    /// Number of addressable objects. Fixed for the lifetime of the source.
    fn count(&self) -> Result<usize>;

    /// Produce the object at `index`, where `index < count()`.
    fn get(&mut self, index: usize) -> Result<Self::Object>;
}

/// Narrow interface of an image plane decoder.
pub trait PlaneReader: Send {
    fn plane_count(&self) -> usize;

    fn read_plane(&mut self, index: usize) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Serves raw plane bytes from a [`PlaneReader`].
#[derive(Debug)]
pub struct ByteSource<R> {
    reader: R,
}

impl<R: PlaneReader> ByteSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn into_reader(self) -> R {
        self.reader
    }
}

impl<R: PlaneReader> CacheSource for ByteSource<R> {
    type Object = Bytes;

    fn count(&self) -> Result<usize> {
        Ok(self.reader.plane_count())
    }

    fn get(&mut self, index: usize) -> Result<Bytes> {
        let count = self.reader.plane_count();
        if index >= count {
            return Err(CacheError::InternalInconsistency {
                index,
                capacity: count,
            });
        }

        let plane = self
            .reader
            .read_plane(index)
            .map_err(|e| CacheError::source_failure(index, e))?;

        debug!(index, size = plane.len(), "Read plane");
        Ok(Bytes::from(plane))
    }
}

/// Source backed by a producer closure.
pub struct FnSource<F> {
    count: usize,
    produce: F,
}

impl<T, F> FnSource<F>
where
    F: FnMut(usize) -> std::result::Result<T, BoxError> + Send,
    T: Send,
{
    pub fn new(count: usize, produce: F) -> Self {
        Self { count, produce }
    }
}

impl<T, F> CacheSource for FnSource<F>
where
    F: FnMut(usize) -> std::result::Result<T, BoxError> + Send,
    T: Send,
{
    type Object = T;

    fn count(&self) -> Result<usize> {
        Ok(self.count)
    }

    fn get(&mut self, index: usize) -> Result<T> {
        if index >= self.count {
            return Err(CacheError::InternalInconsistency {
                index,
                capacity: self.count,
            });
        }
        (self.produce)(index).map_err(|e| CacheError::source_failure(index, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        planes: Vec<Vec<u8>>,
    }

    impl PlaneReader for Fixed {
        fn plane_count(&self) -> usize {
            self.planes.len()
        }

        fn read_plane(&mut self, index: usize) -> std::result::Result<Vec<u8>, BoxError> {
            if self.planes[index].is_empty() {
                return Err("corrupt plane".into());
            }
            Ok(self.planes[index].clone())
        }
    }

    #[test]
    fn test_byte_source_reads_planes() {
        let mut source = ByteSource::new(Fixed {
            planes: vec![vec![1, 2], vec![3, 4, 5]],
        });
        assert_eq!(source.count().unwrap(), 2);
        assert_eq!(source.get(1).unwrap(), Bytes::from_static(&[3, 4, 5]));

        assert_eq!(source.reader().plane_count(), 2);
        let reader = source.into_reader();
        assert_eq!(reader.planes[0], vec![1, 2]);
    }

    #[test]
    fn test_byte_source_wraps_reader_errors() {
        let mut source = ByteSource::new(Fixed {
            planes: vec![vec![1], vec![]],
        });
        match source.get(1) {
            Err(CacheError::SourceFailure { index, source: cause }) => {
                assert_eq!(index, 1);
                assert_eq!(cause.to_string(), "corrupt plane");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_byte_source_rejects_out_of_range() {
        let mut source = ByteSource::new(Fixed { planes: vec![vec![1]] });
        assert!(matches!(
            source.get(3),
            Err(CacheError::InternalInconsistency { index: 3, capacity: 1 })
        ));
    }

    #[test]
    fn test_fn_source() {
        let mut source = FnSource::new(4, |i| {
            if i == 2 {
                Err("unreadable".into())
            } else {
                Ok(i * 10)
            }
        });
        assert_eq!(source.count().unwrap(), 4);
        assert_eq!(source.get(3).unwrap(), 30);
        assert!(matches!(
            source.get(2),
            Err(CacheError::SourceFailure { index: 2, .. })
        ));
    }
}
