//! Unified error types for docquery.
//!
//! This module provides the error hierarchy covering:
//! - Remote API errors (authentication, rate limiting, missing resources, etc.)
//! - Local setup errors (credential files, duplicate resource names)
//! - Polling errors (timeouts, cancellation, failed runs)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::thread::RunStatus;

/// Result type alias for docquery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for docquery.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Remote API error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A credential file could not be read.
    #[error("failed to read credential file {}: {source}", path.display())]
    Credentials {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// More than one remote resource carries the requested name.
    #[error("{count} {kind} resources are named '{name}'")]
    DuplicateName {
        /// Resource kind ("assistant", "vector store").
        kind: &'static str,
        /// The contested name.
        name: String,
        /// How many resources matched.
        count: usize,
    },

    /// A run reached a terminal state other than completed.
    #[error("run ended with status {status}: {message}")]
    RunFailed {
        /// Terminal status reported by the service.
        status: RunStatus,
        /// The run's last error, if the service reported one.
        message: String,
    },

    /// A poll loop exceeded its timeout.
    #[error("timed out after {waited:?} waiting for {operation}")]
    PollTimeout {
        /// What was being waited on.
        operation: String,
        /// How long the poll ran.
        waited: Duration,
    },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error.
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a credentials error for `path`.
    #[must_use]
    pub fn credentials(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Credentials {
            path: path.into(),
            source,
        }
    }

    /// Create a duplicate name error.
    #[must_use]
    pub fn duplicate_name(kind: &'static str, name: impl Into<String>, count: usize) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
            count,
        }
    }

    /// Create a poll timeout error.
    #[must_use]
    pub fn poll_timeout(operation: impl Into<String>, waited: Duration) -> Self {
        Self::PollTimeout {
            operation: operation.into(),
            waited,
        }
    }

    /// Returns `true` if this error was caused by cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error type for remote API operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiError {
    /// The error kind.
    pub kind: ApiErrorKind,
    /// Human readable message.
    pub message: String,
    /// Optional error code from the service.
    pub code: Option<String>,
}

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// Rate limit exceeded.
    RateLimited,
    /// The requested resource does not exist.
    NotFound,
    /// Invalid request parameters.
    InvalidRequest,
    /// Response did not have the expected shape.
    ResponseFormat,
    /// Network or connection error.
    Network,
    /// HTTP status error with an unparsable body.
    HttpStatus,
    /// Service-specific error.
    Provider,
    /// Internal error.
    Internal,
}

impl ApiError {
    const fn with_kind(kind: ApiErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            code: None,
        }
    }

    /// Create an authentication error.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::with_kind(ApiErrorKind::Auth, message.into())
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self::with_kind(
            ApiErrorKind::RateLimited,
            "Rate limit exceeded. Please retry after some time.".into(),
        )
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ApiErrorKind::NotFound, message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_kind(ApiErrorKind::InvalidRequest, message.into())
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::with_kind(
            ApiErrorKind::ResponseFormat,
            format!("Expected {}, got {}", expected.into(), got.into()),
        )
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(ApiErrorKind::Network, message.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::HttpStatus,
            message: format!("HTTP {status}: {}", body.into()),
            code: Some(status.to_string()),
        }
    }

    /// Create a service error with an error code.
    #[must_use]
    pub fn provider_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Provider,
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(ApiErrorKind::Internal, message.into())
    }

    /// Check if this is a retryable error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::RateLimited | ApiErrorKind::Network)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(feature = "openai")]
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}
