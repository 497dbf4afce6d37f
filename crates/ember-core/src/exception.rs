//! Exception descriptors and the matching function.
//!
//! When a stage fails, the thrown [`BoxError`](crate::BoxError) is compared
//! against the [`ExceptionFilter`]s each exception handler declares. Three
//! kinds of descriptor exist:
//!
//! - **Message**: matches when the rendered error message contains the
//!   descriptor text as a substring.
//! - **Kind**: matches when the thrown error *is* the descriptor's concrete
//!   type. This is an exact identity check on the outermost error value; the
//!   `source()` chain is not walked and wrapper types do not match their
//!   inner error.
//! - **Predicate**: a caller-supplied function.
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_core::{ExceptionFilter, matches};
//!
//! let by_kind = ExceptionFilter::of::<std::num::ParseIntError>();
//! let by_text = ExceptionFilter::message("missing permission");
//!
//! let err: BoxError = "x".parse::<i32>().unwrap_err().into();
//! assert!(matches(err.as_ref(), &by_kind));
//! assert!(!matches(err.as_ref(), &by_text));
//! ```

use std::any::TypeId;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::error::DynError;

/// A type-erased predicate over thrown errors.
pub type ErrorPredicate = Arc<dyn Fn(&DynError) -> bool + Send + Sync>;

/// An acceptable-exception descriptor.
#[derive(Clone)]
pub enum ExceptionFilter {
    /// Substring of the thrown error's message.
    Message(String),
    /// Exact concrete error type.
    Kind {
        /// Type identity of the accepted error.
        type_id: TypeId,
        /// Type name, for diagnostics only.
        name: &'static str,
        /// Downcast check for the accepted error type.
        check: fn(&DynError) -> bool,
    },
    /// Arbitrary predicate.
    Predicate(ErrorPredicate),
}

fn is_kind<E: Error + 'static>(err: &DynError) -> bool {
    err.is::<E>()
}

impl ExceptionFilter {
    /// Accepts errors whose message contains `text`.
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    /// Accepts errors of exactly type `E`.
    pub fn of<E: Error + 'static>() -> Self {
        Self::Kind {
            type_id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            check: is_kind::<E>,
        }
    }

    /// Accepts errors of the same concrete type as `instance`.
    pub fn like<E: Error + 'static>(_instance: &E) -> Self {
        Self::of::<E>()
    }

    /// Accepts errors for which `f` returns `true`.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&DynError) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for ExceptionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(text) => f.debug_tuple("Message").field(text).finish(),
            Self::Kind { name, .. } => f.debug_tuple("Kind").field(name).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl PartialEq for ExceptionFilter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Kind { type_id: a, .. }, Self::Kind { type_id: b, .. }) => a == b,
            (Self::Predicate(a), Self::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ExceptionFilter {
    fn from(text: &str) -> Self {
        Self::message(text)
    }
}

impl From<String> for ExceptionFilter {
    fn from(text: String) -> Self {
        Self::Message(text)
    }
}

/// Decides whether `err` is accepted by `filter`.
pub fn matches(err: &DynError, filter: &ExceptionFilter) -> bool {
    match filter {
        ExceptionFilter::Message(text) => err.to_string().contains(text.as_str()),
        ExceptionFilter::Kind { check, .. } => check(err),
        ExceptionFilter::Predicate(f) => f(err),
    }
}

/// Decides whether `err` is accepted by a handler declaring `filters`.
///
/// An empty filter list is a catch-all.
pub fn accepts(err: &DynError, filters: &[ExceptionFilter]) -> bool {
    filters.is_empty() || filters.iter().any(|filter| matches(err, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, Thrown};
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("syntax error near '{0}'")]
    struct SyntaxError(String);

    #[derive(Debug, Error)]
    #[error("type error")]
    struct TypeError;

    #[derive(Debug, Error)]
    #[error("wrapped: {0}")]
    struct Wrapped(#[source] SyntaxError);

    #[test]
    fn test_kind_matches_exact_type_only() {
        let err: BoxError = Box::new(SyntaxError("}".into()));
        assert!(matches(err.as_ref(), &ExceptionFilter::of::<SyntaxError>()));
        assert!(!matches(err.as_ref(), &ExceptionFilter::of::<TypeError>()));
    }

    #[test]
    fn test_kind_does_not_walk_sources() {
        let err: BoxError = Box::new(Wrapped(SyntaxError("x".into())));
        assert!(!matches(err.as_ref(), &ExceptionFilter::of::<SyntaxError>()));
        assert!(matches(err.as_ref(), &ExceptionFilter::of::<Wrapped>()));
    }

    #[test]
    fn test_instance_descriptor() {
        let sample = TypeError;
        let err: BoxError = Box::new(TypeError);
        assert!(matches(err.as_ref(), &ExceptionFilter::like(&sample)));
    }

    #[test]
    fn test_message_substring() {
        let err = Thrown::boxed("Missing permission: BAN_MEMBERS");
        assert!(matches(err.as_ref(), &"permission".into()));
        assert!(!matches(err.as_ref(), &"KICK".into()));
    }

    #[test]
    fn test_empty_filters_catch_all() {
        let err = Thrown::boxed("anything");
        assert!(accepts(err.as_ref(), &[]));
        assert!(!accepts(err.as_ref(), &[ExceptionFilter::of::<TypeError>()]));
        assert!(accepts(
            err.as_ref(),
            &[
                ExceptionFilter::of::<TypeError>(),
                ExceptionFilter::predicate(|e| e.is::<Thrown>()),
            ]
        ));
    }
}
