//! Proxy error taxonomy.

use sqlrelay_storage::StorageError;
use thiserror::Error;

/// Protocol-agnostic classification of a [`ProxyError`].
///
/// The API layer maps each kind to an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MethodNotAllowed,
    ValidationError,
    NotFound,
    Unauthorized,
    PrepareFailed,
    ExecuteFailed,
}

/// Errors produced while handling a request.
///
/// Engine failures keep the [`StorageError`] as their source so it can be
/// logged; [`ProxyError::client_message`] never includes it.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method {method} is not allowed")]
    MethodNotAllowed { method: String },

    #[error("{path}: {reason}")]
    Validation { path: String, reason: String },

    #[error("database not found: {database}")]
    DatabaseNotFound { database: String },

    #[error("invalid secret for database: {database}")]
    InvalidSecret { database: String },

    #[error("prepare failed")]
    PrepareFailed(#[source] StorageError),

    #[error("execute failed")]
    ExecuteFailed(#[source] StorageError),
}

impl ProxyError {
    /// Creates a validation error for a field path.
    pub fn validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProxyError::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            ProxyError::Validation { .. } => ErrorKind::ValidationError,
            ProxyError::DatabaseNotFound { .. } => ErrorKind::NotFound,
            ProxyError::InvalidSecret { .. } => ErrorKind::Unauthorized,
            ProxyError::PrepareFailed(_) => ErrorKind::PrepareFailed,
            ProxyError::ExecuteFailed(_) => ErrorKind::ExecuteFailed,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Validation errors describe the offending field; everything else is a
    /// fixed string. Engine detail is never included.
    pub fn client_message(&self) -> String {
        match self {
            ProxyError::MethodNotAllowed { .. } => "Method must be POST".to_string(),
            ProxyError::Validation { .. } => self.to_string(),
            ProxyError::DatabaseNotFound { .. } => "Database not found".to_string(),
            ProxyError::InvalidSecret { .. } => "Invalid secret".to_string(),
            ProxyError::PrepareFailed(_) => "Failed to prepare statement".to_string(),
            ProxyError::ExecuteFailed(_) => "Failed to execute statement".to_string(),
        }
    }
}

/// Result type for request handling.
pub type ProxyResult<T> = Result<T, ProxyError>;
