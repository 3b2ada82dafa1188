//! Errors surfaced by the command line and their exit codes.

use crate::config::ConfigError;

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;

/// Why a command stopped.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Credentials, client construction or provisioning failed.
    #[error("setup failed: {0}")]
    Setup(#[source] docquery::Error),

    /// The assistant or knowledge store does not exist yet.
    #[error("{kind} '{name}' not found, run `docquery provision` first")]
    NotProvisioned {
        /// Resource kind.
        kind: &'static str,
        /// Configured name.
        name: String,
    },

    /// The question could not be answered.
    #[error("query failed: {0}")]
    Query(#[source] docquery::Error),

    /// Interrupted by the user.
    #[error("cancelled")]
    Cancelled,
}

impl CliError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a library error raised before the question was sent.
    #[must_use]
    pub fn setup(err: docquery::Error) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Setup(err)
        }
    }

    /// Wrap a library error raised while answering.
    #[must_use]
    pub fn query(err: docquery::Error) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Query(err)
        }
    }

    /// Process exit code: 1 for setup, 2 for query, 130 for interrupt.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Setup(_) | Self::NotProvisioned { .. } => 1,
            Self::Query(_) => 2,
            Self::Cancelled => 130,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquery::ApiError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::config("bad").exit_code(), 1);
        assert_eq!(CliError::setup(ApiError::auth("no").into()).exit_code(), 1);
        assert_eq!(CliError::query(ApiError::rate_limited().into()).exit_code(), 2);
        assert_eq!(CliError::Cancelled.exit_code(), 130);
        let missing = CliError::NotProvisioned {
            kind: "assistant",
            name: "A".into(),
        };
        assert_eq!(missing.exit_code(), 1);
    }

    #[test]
    fn test_cancellation_wins_over_phase() {
        assert!(matches!(CliError::setup(docquery::Error::Cancelled), CliError::Cancelled));
        assert!(matches!(CliError::query(docquery::Error::Cancelled), CliError::Cancelled));
    }

    #[test]
    fn test_not_provisioned_message() {
        let err = CliError::NotProvisioned {
            kind: "vector store",
            name: "Siruta Database".into(),
        };
        assert_eq!(
            err.to_string(),
            "vector store 'Siruta Database' not found, run `docquery provision` first"
        );
    }
}
