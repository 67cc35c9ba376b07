//! Error types for the credential store.

/// Errors that can occur while opening or operating on a user store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An operation needed a database handle but the store is not open.
    #[error("user store is not open")]
    NotOpen,

    /// SQLite rejected a statement or failed to open, commit or close.
    #[error("user store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The offline storage directory or metadata file could not be accessed.
    #[error("user store io error: {0}")]
    Io(#[from] std::io::Error),

    /// The database on disk was created with a different data version.
    #[error("database version mismatch: expected '{expected}', found '{found}'")]
    VersionMismatch {
        /// Version requested by the caller.
        expected: String,
        /// Version recorded in the metadata file.
        found: String,
    },
}
