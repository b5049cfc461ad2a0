//! Error types for store persistence
//!
//! Nothing here ever escapes `StateStore::set`/`update`: the store logs these
//! at the persistence boundary and keeps the in-memory write.

use thiserror::Error;

/// Result alias for storage and codec operations
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised by storage backends and the document codec
#[derive(Debug, Error)]
pub enum StateError {
    /// The storage substrate is not reachable (no window, private mode, ...)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The substrate rejected a write (quota exceeded, I/O failure)
    #[error("storage write failed for key {key}: {message}")]
    Storage { key: String, message: String },

    /// The document could not be encoded or decoded as JSON
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem error from the native file backend
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config: {0}")]
    Config(String),
}

impl StateError {
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        StateError::Storage {
            key: key.into(),
            message: message.into(),
        }
    }
}
