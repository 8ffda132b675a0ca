//! Error types for component-docs-mcp.
//!
//! # Boundary Note
//!
//! Errors raised by tool and resource handlers never cross the protocol
//! boundary as-is. The dispatcher surfaces only their message string, so
//! variants here must not embed stack traces or internal paths in `Display`
//! output that reaches a [`HandlerError`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while loading a documentation catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog: {path}")]
    Read {
        /// Path to the catalog file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Catalog JSON was malformed.
    #[error("failed to parse catalog: {path}")]
    Parse {
        /// Path to the catalog file (or `<built-in>`).
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Error returned by a tool or resource handler.
///
/// Only the message is kept: the dispatcher reports it verbatim as the
/// `details` of an `INTERNAL_ERROR` envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors that can occur while running the HTTP transport.
#[derive(Error, Debug)]
pub enum ServeError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address: {addr}")]
    InvalidAddress {
        /// The address string from configuration.
        addr: String,
    },

    /// Failed to bind the TCP listener.
    #[error("failed to bind on {addr}")]
    Bind {
        /// The address string.
        addr: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an IO error while serving.
    #[error("server error")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn handler_error_displays_message_only() {
        let error = HandlerError::new("boom");
        assert_eq!(error.to_string(), "boom");
        assert_eq!(error.message(), "boom");
    }

    #[test]
    fn handler_error_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = HandlerError::from(json_err);
        assert!(!error.message().is_empty());
    }

    #[test]
    fn bind_error_displays_address() {
        let error = ServeError::Bind {
            addr: "127.0.0.1:3000".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(error.to_string().contains("127.0.0.1:3000"));
    }
}
