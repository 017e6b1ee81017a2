//! Error types for the tome libraries.
//!
//! This module provides a unified error type with explicit variants for
//! transport, protocol, configuration, store, and input validation errors.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for tome operations.
///
/// This error type covers all possible failure modes in the libraries,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol errors (remote API errors, unexpected responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration errors (missing destination, missing store).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input validation errors (invalid object id, URL format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Retry budget exhausted on consecutive network failures.
    #[error("operation '{operation}' failed after {attempts} attempts")]
    RetriesExhausted {
        /// Name of the operation that kept failing.
        operation: String,
        /// Number of attempts that were made.
        attempts: u32,
    },

    /// Embedded store errors.
    #[error("store error: {message}")]
    Store {
        /// Description of the failure.
        message: String,
    },
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Local filesystem I/O error.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Protocol-level errors from remote API responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// API error code (if present).
    pub code: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Check if this is a rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Configuration errors. These are fatal and never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No output directory was provided for an export or backup.
    #[error("an output directory is required")]
    MissingOutputDirectory,

    /// The embedded store was required to exist but does not.
    #[error("store '{path}' does not exist and store creation was not requested")]
    StoreMissing { path: PathBuf },

    /// Generic configuration problem.
    #[error("{message}")]
    Other { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid object id.
    #[error("invalid object id '{value}': {reason}")]
    ObjectId { value: String, reason: String },

    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid JSON payload.
    #[error("invalid JSON: {message}")]
    Json { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidInput(InvalidInputError::Json {
            message: err.to_string(),
        })
    }
}
