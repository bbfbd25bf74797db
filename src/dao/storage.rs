use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
///
/// Every backend failure collapses into this one shape: the service layer
/// only needs to know the store could not be reached, not why.
#[derive(Debug, Error)]
#[error("storage backend failure: {message}")]
pub struct StorageError {
    message: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl StorageError {
    /// Wrap any backend failure.
    pub fn backend(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
