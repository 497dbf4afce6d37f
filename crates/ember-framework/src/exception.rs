//! Exception handlers and routing.
//!
//! Every command and event owns an ordered list of [`ExceptionHandler`]s.
//! When any stage of its pipeline throws, [`handle_exception`] runs every
//! handler that accepts the error, one after another, in registration
//! order. A handler that declares no exceptions accepts everything.
//!
//! Errors that no handler accepts are absorbed: the dispatch is rejected
//! but nothing propagates to the caller. An exception handler that fails
//! itself is not caught here and escapes the dispatch as
//! [`DispatchError::ExceptionHandler`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, trace};

use ember_core::{BoxError, DynError, ExceptionFilter, SharedError, accepts};

use crate::context::InvocationContext;
use crate::error::{BuildError, BuildResult, DispatchError};
use crate::handler::{BoxedExceptionHandler, IntoOutput, into_exception_handler};

/// A registered reaction to thrown values.
#[derive(Clone)]
pub struct ExceptionHandler {
    id: String,
    exceptions: Vec<ExceptionFilter>,
    handler: BoxedExceptionHandler,
}

impl ExceptionHandler {
    /// Starts building an exception handler.
    pub fn builder() -> ExceptionHandlerBuilder {
        ExceptionHandlerBuilder::default()
    }

    /// The id of the command or event this handler belongs to.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exceptions(&self) -> &[ExceptionFilter] {
        &self.exceptions
    }

    /// Returns `true` if this handler reacts to `err`.
    pub fn accepts(&self, err: &DynError) -> bool {
        accepts(err, &self.exceptions)
    }
}

impl fmt::Debug for ExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandler")
            .field("id", &self.id)
            .field("exceptions", &self.exceptions)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExceptionHandler`].
#[derive(Default)]
pub struct ExceptionHandlerBuilder {
    id: Option<String>,
    exceptions: Vec<ExceptionFilter>,
    handler: Option<BoxedExceptionHandler>,
}

impl ExceptionHandlerBuilder {
    /// Sets the id of the command or event the handler is for.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds an accepted exception.
    pub fn exception(mut self, filter: impl Into<ExceptionFilter>) -> Self {
        self.exceptions.push(filter.into());
        self
    }

    /// Adds several accepted exceptions.
    pub fn exceptions<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ExceptionFilter>,
    {
        self.exceptions.extend(filters.into_iter().map(Into::into));
        self
    }

    /// Sets the handler function.
    pub fn handler<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(Arc<InvocationContext>, SharedError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoOutput,
    {
        self.handler = Some(into_exception_handler(f));
        self
    }

    /// Validates the descriptor.
    pub fn build(self) -> BuildResult<ExceptionHandler> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(BuildError::MissingExceptionId),
        };
        let handler = self
            .handler
            .ok_or_else(|| BuildError::MissingExceptionHandler { id: id.clone() })?;
        Ok(ExceptionHandler {
            id,
            exceptions: self.exceptions,
            handler,
        })
    }

    /// Validates the descriptor, using `scope` when no id was given.
    pub(crate) fn build_scoped(mut self, scope: &str) -> BuildResult<ExceptionHandler> {
        if self.id.is_none() {
            self.id = Some(scope.to_string());
        }
        self.build()
    }
}

/// Routes a thrown value to every accepting handler in `handlers`.
///
/// Returns whether any handler ran.
pub async fn handle_exception(
    handlers: &[ExceptionHandler],
    ctx: &Arc<InvocationContext>,
    err: BoxError,
) -> Result<bool, DispatchError> {
    let err: SharedError = Arc::from(err);
    let mut handled = false;

    for handler in handlers.iter().filter(|handler| handler.accepts(&*err)) {
        handled = true;
        trace!(target_id = ctx.target().id(), error = %err, "running exception handler");
        (handler.handler)(Arc::clone(ctx), Arc::clone(&err))
            .await
            .map_err(|source| DispatchError::ExceptionHandler {
                target: ctx.target().id().to_string(),
                source,
            })?;
    }

    if !handled {
        debug!(target_id = ctx.target().id(), error = %err, "no exception handler accepted the error");
    }
    Ok(handled)
}
