/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A stored timestamp could not be parsed
    #[error("Invalid timestamp in {column}: {value}")]
    InvalidTimestamp { column: &'static str, value: String },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for soul_core::SoulError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(db) => db.into(),
            other => soul_core::SoulError::storage(other.to_string()),
        }
    }
}
