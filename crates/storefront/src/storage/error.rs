//! Storage error types.

use thiserror::Error;

/// Errors that can occur when reading or writing persisted client state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Another thread panicked while holding the storage lock.
    #[error("storage lock poisoned")]
    Poisoned,
}
