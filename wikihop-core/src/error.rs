//! Error taxonomy for the wikihop workspace.
//!
//! Two layers: [`StoreError`] covers the key/value and queue adapters and is
//! deliberately coarse (a connection-shaped failure or a codec failure at the
//! JSON boundary), while [`Error`] enumerates the workspace-wide kinds the
//! task runtime classifies for retry.

use thiserror::Error;

/// Error type for storage and queue adapter operations.
///
/// Backend crates convert their native errors into one of these two kinds so
/// that callers never depend on a concrete backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or backend interaction error (connection refused, command
    /// failure, timeout talking to the store).
    #[error("store backend error: {0}")]
    Connection(Box<dyn std::error::Error + Send + Sync>),

    /// JSON serialization or deserialization failure at the adapter boundary.
    #[error("store codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    /// Wraps an arbitrary backend error as a connection-kind failure.
    pub fn connection<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection(Box::new(err))
    }
}

/// Result type for adapter operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Workspace-wide error kinds.
///
/// `PathNotFound` and `InvalidPage` are result kinds rather than runtime
/// anomalies: the task runtime matches on them to classify outcomes without
/// inspecting arbitrary errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A title was empty after trimming, or the upstream reports the page as
    /// missing.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    /// The search drained its frontier (or hit the depth bound) without
    /// reaching the target.
    #[error("no path found from '{start}' to '{end}'")]
    PathNotFound {
        /// Title the search started from.
        start: String,
        /// Title the search was looking for.
        end: String,
    },

    /// Upstream API failure: transport error, non-2xx status, timeout, or an
    /// undecodable response body.
    #[error("wikipedia api error: {0}")]
    Upstream(String),

    /// Key/value or queue backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The search was asked to stop at the soft time limit and exited at the
    /// next safe point.
    #[error("search stopped at the soft time limit")]
    SoftTimeout,

    /// A task attempt exceeded the hard time limit and was aborted.
    #[error("task attempt aborted after {0} seconds")]
    AttemptTimeout(u64),

    /// The retry budget was exhausted; the message carries the last error.
    #[error("max retries exceeded: {0}")]
    RetriesExhausted(String),

    /// Anything unclassified.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the task runtime should retry an attempt that failed with
    /// this error.
    ///
    /// Upstream and store failures are transient by assumption; a hard
    /// timeout counts as retryable because the attempt was killed, not
    /// judged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Upstream(_) | Self::Store(_) | Self::AttemptTimeout(_)
        )
    }

    /// Stable machine-readable code for task records and HTTP envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPage(_) => "INVALID_PAGE",
            Self::PathNotFound { .. } => "PATH_NOT_FOUND",
            Self::Upstream(_) => "WIKIPEDIA_API_ERROR",
            Self::Store(_) => "CACHE_ERROR",
            Self::SoftTimeout => "SOFT_TIMEOUT",
            Self::AttemptTimeout(_) => "TASK_TIMEOUT",
            Self::RetriesExhausted(_) => "MAX_RETRIES_EXCEEDED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type for workspace operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(Error::Upstream("503".into()).is_retryable());
        assert!(Error::Store(StoreError::connection(std::io::Error::other("down"))).is_retryable());
        assert!(Error::AttemptTimeout(600).is_retryable());

        assert!(!Error::InvalidPage("Nope".into()).is_retryable());
        assert!(
            !Error::PathNotFound {
                start: "A".into(),
                end: "B".into()
            }
            .is_retryable()
        );
        assert!(!Error::SoftTimeout.is_retryable());
        assert!(!Error::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::InvalidPage("x".into()).code(), "INVALID_PAGE");
        assert_eq!(
            Error::PathNotFound {
                start: "A".into(),
                end: "B".into()
            }
            .code(),
            "PATH_NOT_FOUND"
        );
        assert_eq!(Error::RetriesExhausted("x".into()).code(), "MAX_RETRIES_EXCEEDED");
    }
}
