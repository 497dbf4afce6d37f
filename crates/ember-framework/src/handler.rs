//! Handler functions for commands and events.
//!
//! A handler is any async function taking the shared
//! [`InvocationContext`] and returning something that implements
//! [`IntoOutput`]. The output is opaque to the pipeline: it is only handed
//! to the post-processing consumers. Returning `Err` is a thrown value and
//! is routed to the target's exception handlers like any other stage
//! failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ember_framework::{InvocationContext, Thrown};
//!
//! async fn ping(_ctx: Arc<InvocationContext>) -> &'static str {
//!     "pong"
//! }
//!
//! async fn kick(ctx: Arc<InvocationContext>) -> Result<String, Thrown> {
//!     let member = ctx.arg("member").ok_or_else(|| Thrown::new("no member"))?;
//!     Ok(format!("kicked {member}"))
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use ember_core::{BoxError, SharedError};

use crate::context::InvocationContext;

// ============================================================================
// IntoOutput
// ============================================================================

/// A value that can be returned from a handler.
pub trait IntoOutput: Send + 'static {
    /// Converts the value into the pipeline's opaque output, or a thrown value.
    fn into_output(self) -> Result<Value, BoxError>;
}

impl IntoOutput for () {
    fn into_output(self) -> Result<Value, BoxError> {
        Ok(Value::Null)
    }
}

impl IntoOutput for Value {
    fn into_output(self) -> Result<Value, BoxError> {
        Ok(self)
    }
}

impl IntoOutput for String {
    fn into_output(self) -> Result<Value, BoxError> {
        Ok(Value::String(self))
    }
}

impl IntoOutput for &'static str {
    fn into_output(self) -> Result<Value, BoxError> {
        Ok(Value::String(self.to_string()))
    }
}

impl IntoOutput for bool {
    fn into_output(self) -> Result<Value, BoxError> {
        Ok(Value::Bool(self))
    }
}

impl IntoOutput for i64 {
    fn into_output(self) -> Result<Value, BoxError> {
        Ok(Value::from(self))
    }
}

/// `None` becomes `null`.
impl<T: IntoOutput> IntoOutput for Option<T> {
    fn into_output(self) -> Result<Value, BoxError> {
        self.map_or(Ok(Value::Null), IntoOutput::into_output)
    }
}

/// `Err` is thrown.
impl<T, E> IntoOutput for Result<T, E>
where
    T: IntoOutput,
    E: Into<BoxError> + Send + 'static,
{
    fn into_output(self) -> Result<Value, BoxError> {
        match self {
            Ok(value) => value.into_output(),
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// Type-erased handlers
// ============================================================================

/// A type-erased target handler.
pub type BoxedHandler =
    Arc<dyn Fn(Arc<InvocationContext>) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// A type-erased exception handler.
pub type BoxedExceptionHandler = Arc<
    dyn Fn(Arc<InvocationContext>, SharedError) -> BoxFuture<'static, Result<Value, BoxError>>
        + Send
        + Sync,
>;

/// Converts an async function into a [`BoxedHandler`].
pub fn into_handler<F, Fut, R>(f: F) -> BoxedHandler
where
    F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutput,
{
    Arc::new(move |ctx| f(ctx).map(IntoOutput::into_output).boxed())
}

/// Converts an async function into a [`BoxedExceptionHandler`].
pub fn into_exception_handler<F, Fut, R>(f: F) -> BoxedExceptionHandler
where
    F: Fn(Arc<InvocationContext>, SharedError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutput,
{
    Arc::new(move |ctx, err| f(ctx, err).map(IntoOutput::into_output).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::Thrown;
    use serde_json::json;

    #[test]
    fn test_outputs() {
        assert_eq!(().into_output().unwrap(), Value::Null);
        assert_eq!("pong".into_output().unwrap(), json!("pong"));
        assert_eq!(Some(3_i64).into_output().unwrap(), json!(3));
        assert_eq!(None::<bool>.into_output().unwrap(), Value::Null);
    }

    #[test]
    fn test_err_is_thrown() {
        let out: Result<String, Thrown> = Err(Thrown::new("boom"));
        let err = out.into_output().unwrap_err();
        assert!(err.is::<Thrown>());

        let ok: Result<(), Thrown> = Ok(());
        assert_eq!(ok.into_output().unwrap(), Value::Null);
    }
}
