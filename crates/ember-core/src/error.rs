//! Unified error types for the Ember core.
//!
//! Anything a guard, interceptor, consumer, handler or argument processor
//! "throws" travels through the framework as a [`BoxError`]. Framework-level
//! errors (build, registry and dispatch errors) live in `ember-framework`.

use thiserror::Error;

/// A thrown value: any error that can cross task boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The unsized error type matched by exception filters.
pub type DynError = dyn std::error::Error + Send + Sync + 'static;

/// A plain error carrying only a message.
///
/// Useful for hooks that want to raise something an exception handler can
/// match with [`ExceptionFilter::message`](crate::ExceptionFilter::message).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Thrown(pub String);

impl Thrown {
    /// Creates a new message-only error.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Creates a new message-only error, already boxed.
    pub fn boxed(msg: impl Into<String>) -> BoxError {
        Box::new(Self::new(msg))
    }
}

/// A thrown value shared between every exception handler that reacts to it.
pub type SharedError = std::sync::Arc<DynError>;
