//! Error types for the Rechovot crates.

use std::path::{Path, PathBuf};

/// Errors that can occur while loading, searching or deleting street records.
///
/// The variants follow the failure taxonomy of the system: configuration and
/// source problems abort a load before any write, backend failures abort the
/// current operation, and bad input is rejected before the backend is
/// contacted. Value coercion never produces an error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Schema file missing or malformed, no indexable fields, bad run settings.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Source table missing, unreadable, without sheets or without data rows.
    #[error("Source error: {message}")]
    Source {
        /// Human-readable description naming the missing resource
        message: String,
    },

    /// A document or index the caller referred to does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of resource ("document", "index", ...)
        kind: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller-supplied input was rejected before contacting the backend.
    #[error("Bad input: {message}")]
    BadInput {
        /// What was wrong with the input
        message: String,
    },

    /// The search backend failed to execute a read or write.
    #[error("Backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O error tied to a filesystem path.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Convenience `Result` type alias for Rechovot operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new source error.
    pub fn source_error<S: Into<String>>(message: S) -> Self {
        Error::Source {
            message: message.into(),
        }
    }

    /// Creates a new not-found error.
    pub fn not_found<K, I>(kind: K, id: I) -> Self
    where
        K: Into<String>,
        I: Into<String>,
    {
        Error::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a new bad-input error.
    pub fn bad_input<S: Into<String>>(message: S) -> Self {
        Error::BadInput {
            message: message.into(),
        }
    }

    /// Creates a new backend error with a message.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns whether the caller is at fault (bad input or unknown id).
    ///
    /// The HTTP layer maps these to 4xx responses.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::BadInput { .. } | Error::NotFound { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::config("no indexable fields in schema");
        assert_eq!(
            err.to_string(),
            "Configuration error: no indexable fields in schema"
        );
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("document", "abc-123");
        assert_eq!(err.to_string(), "document not found: abc-123");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_bad_input_is_client_error() {
        let err = Error::bad_input("Missing id");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_backend_error_with_source() {
        let io_error = std::io::Error::other("lock busy");
        let err = Error::backend_with_source("bulk write failed", io_error);
        assert!(err.to_string().contains("bulk write failed"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_io_with_path_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::io_with_path(io_error, "/data/streets.xlsx");
        let msg = err.to_string();
        assert!(msg.contains("/data/streets.xlsx"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
