//! Error types and result types for data-access operations.
//!
//! Every fallible operation in the workspace returns [`DataAccessResult<T>`]. Validation and
//! configuration problems are detected before any backend call is made; backend failures are
//! surfaced as [`DataAccessError::Backend`] with the status code reported by the backend, if any.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a data store through this layer.
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// The request was rejected before reaching the backend (empty input, batch too large,
    /// malformed search criteria, limit above the hard maximum, ...).
    #[error("Validation error: {0}")]
    Validation(String),
    /// The container has no schema entry, or the connection settings are incomplete.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The same key was supplied more than once to an operation that requires unique keys.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// A [`QueryTerm`](crate::term::QueryTerm) was read as a shape it does not hold.
    #[error("Type mismatch: term holds {actual}, requested {requested}")]
    TypeMismatch {
        /// The shape the term actually holds.
        actual: String,
        /// The shape the caller asked for.
        requested: String,
    },
    /// The item does not exist in the container.
    #[error("Item {id} not found in container {container}")]
    NotFound {
        id: String,
        container: String,
    },
    /// The underlying backend reported a failure.
    #[error("Backend error{}: {message}", status_suffix(.status))]
    Backend {
        /// Status code reported by the backend, when it has one.
        status: Option<u16>,
        message: String,
    },
    /// The search expression cannot be compiled (unsupported operator, bad `In` operand, ...).
    #[error("Argument error: {0}")]
    Argument(String),
    /// The search criteria payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The backend does not implement the requested capability.
    #[error("Not supported: {0}")]
    NotSupported(String),
    /// Serialization/deserialization error when converting items or configuration.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DataAccessError {
    /// Creates a backend error carrying a status code.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        DataAccessError::Backend {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns the backend status code, if this is a backend error that carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DataAccessError::Backend { status, .. } => *status,
            DataAccessError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" ({code})"))
        .unwrap_or_default()
}

/// A specialized `Result` type for data-access operations.
pub type DataAccessResult<T> = Result<T, DataAccessError>;

impl From<SerdeJsonError> for DataAccessError {
    fn from(err: SerdeJsonError) -> Self {
        DataAccessError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_backend_status_in_message() {
        let err = DataAccessError::backend(409, "conflict");
        assert_eq!(err.to_string(), "Backend error (409): conflict");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_should_render_backend_error_without_status() {
        let err = DataAccessError::Backend { status: None, message: "boom".into() };
        assert_eq!(err.to_string(), "Backend error: boom");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_should_convert_serde_json_error() {
        let err: DataAccessError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DataAccessError::Serialization(_)));
    }
}
