//! Storage error types.

use thiserror::Error;

/// Engine-level errors.
///
/// Messages carry the raw engine detail. They are meant for logs only; the
/// API layer replaces them with generic text before anything reaches a caller.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not open or reach the database.
    #[error("database connection error: {message}")]
    ConnectionError { message: String },

    /// The engine refused to compile the statement.
    #[error("failed to prepare statement: {message}")]
    PrepareError { message: String },

    /// Parameters could not be bound to the prepared statement.
    #[error("failed to bind parameters: {message}")]
    BindError { message: String },

    /// The statement failed while running.
    #[error("failed to execute statement: {message}")]
    ExecuteError { message: String },

    /// A column value could not be converted to JSON.
    #[error("failed to decode column '{column}': {message}")]
    DecodeError { column: String, message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
