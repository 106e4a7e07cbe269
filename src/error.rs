//! Error taxonomy shared by every cache component.

use thiserror::Error;

/// Boxed error produced by external collaborators (format readers, closures).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CacheError {
    /// A required component is missing or a configuration value is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Wrong dimensionality or an out-of-range component.
    #[error("Invalid position {position:?}: {reason}")]
    InvalidPosition { position: Vec<usize>, reason: String },

    /// The source failed to produce the object for a raster index.
    #[error("Source failed to produce object {index}")]
    SourceFailure {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A raster index fell outside the allocated storage.
    #[error("Raster index {index} outside cache storage of {capacity} slots")]
    InternalInconsistency { index: usize, capacity: usize },

    /// The background updater thread could not be spawned.
    #[error("Failed to spawn updater thread: {0}")]
    UpdaterSpawn(#[from] std::io::Error),

    /// The background updater thread panicked; its cache is lost.
    #[error("Updater thread panicked")]
    UpdaterPanicked,
}

impl CacheError {
    pub(crate) fn invalid_position(position: &[usize], reason: impl Into<String>) -> Self {
        CacheError::InvalidPosition {
            position: position.to_vec(),
            reason: reason.into(),
        }
    }

    pub(crate) fn source_failure(index: usize, source: impl Into<BoxError>) -> Self {
        CacheError::SourceFailure {
            index,
            source: source.into(),
        }
    }
}
