//! Store error type.

use thiserror::Error;

/// Errors produced by a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,

    /// A stored value could not be encoded or decoded
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A stored value is structurally wrong for its key
    #[error("corrupt entry {key}: {message}")]
    Corrupt { key: String, message: String },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
