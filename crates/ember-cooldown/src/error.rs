//! Error types for cooldown stores.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by cooldown stores and the cooldown interceptor.
#[derive(Debug, Error)]
pub enum CooldownError {
    /// The user has exhausted their uses for the current window.
    ///
    /// Raised by [`CooldownInterceptor`](crate::CooldownInterceptor); routable
    /// to exception handlers with `ExceptionFilter::of::<CooldownError>()`.
    #[error("user '{user_id}' is on cooldown for another {}ms", .retry_after.as_millis())]
    Active {
        /// The rate-limited user.
        user_id: String,
        /// Time left until the window closes.
        retry_after: Duration,
    },

    /// A stored record could not be encoded or decoded.
    #[error("invalid cooldown record: {0}")]
    Record(#[from] serde_json::Error),

    /// The store was configured with an unusable policy.
    #[error("invalid cooldown policy: {0}")]
    Policy(String),

    /// Redis connection or command error.
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl CooldownError {
    /// Returns `true` for [`CooldownError::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Result type for cooldown operations.
pub type CooldownResult<T> = Result<T, CooldownError>;
