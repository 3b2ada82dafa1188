//! Tagged result for stages whose failure must not abort the process.
//!
//! Setup stages (credentials, client construction, provisioning) return
//! [`Result`](crate::Result) and fail the whole run. The query stage instead
//! returns an [`Outcome`], and the caller decides what each variant means.

use crate::error::Error;

/// Result of a recoverable stage.
#[derive(Debug)]
#[must_use]
pub enum Outcome<T> {
    /// The stage produced a value.
    Ready(T),
    /// The stage finished without anything to report.
    Empty(String),
    /// The stage failed.
    Failed(Error),
}

impl<T> Outcome<T> {
    /// Create an empty outcome with a reason.
    pub fn empty(reason: impl Into<String>) -> Self {
        Self::Empty(reason.into())
    }

    /// Returns `true` for [`Outcome::Ready`].
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns `true` for [`Outcome::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Returns `true` for [`Outcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The produced value, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Empty(_) | Self::Failed(_) => None,
        }
    }

    /// Map the produced value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ready(value) => Outcome::Ready(f(value)),
            Self::Empty(reason) => Outcome::Empty(reason),
            Self::Failed(err) => Outcome::Failed(err),
        }
    }

    /// Convert into a `Result`, treating `Empty` as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        match self {
            Self::Ready(value) => Ok(Some(value)),
            Self::Empty(_) => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err),
        }
    }
}
