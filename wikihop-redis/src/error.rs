//! Error types for the Redis backend.

use redis::RedisError;
use wikihop_core::StoreError;

/// Error type for Redis backend operations.
///
/// Wraps errors from the underlying [`redis`] client. Callers outside this
/// crate see it only after conversion to [`StoreError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client: connection failures,
    /// protocol errors, authentication failures, command errors.
    #[error("redis backend error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        Self::Connection(Box::new(error))
    }
}
