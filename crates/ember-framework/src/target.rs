//! Dispatch targets.
//!
//! A [`Target`] is the shared definition behind a
//! [`Command`](crate::command::Command) or an [`Event`](crate::event::Event):
//! its identity, hooks, exception handlers and handler function. Targets
//! are cheap to clone and immutable once registered, except for exception
//! handlers appended during setup.

use std::fmt;
use std::sync::Arc;

use crate::argument::ArgumentParser;
use crate::exception::{ExceptionHandler, ExceptionHandlerBuilder};
use crate::handler::BoxedHandler;
use crate::hook::Hooks;

/// What kind of target this is, with the kind-specific identity.
#[derive(Clone)]
pub enum TargetKind {
    Command {
        /// Invocation names, first one canonical.
        names: Vec<String>,
        parser: Option<Arc<ArgumentParser>>,
    },
    Event {
        /// Platform event type tags this event subscribes to.
        types: Vec<String>,
    },
}

#[derive(Clone)]
struct TargetInner {
    id: String,
    kind: TargetKind,
    hooks: Hooks,
    exception_handlers: Vec<ExceptionHandler>,
    handler: BoxedHandler,
}

/// The shared definition of a command or event.
#[derive(Clone)]
pub struct Target {
    inner: Arc<TargetInner>,
}

impl Target {
    pub(crate) fn new(
        id: String,
        kind: TargetKind,
        hooks: Hooks,
        exception_handlers: Vec<ExceptionHandler>,
        handler: BoxedHandler,
    ) -> Self {
        Self {
            inner: Arc::new(TargetInner {
                id,
                kind,
                hooks,
                exception_handlers,
                handler,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> &TargetKind {
        &self.inner.kind
    }

    pub fn is_command(&self) -> bool {
        matches!(self.inner.kind, TargetKind::Command { .. })
    }

    pub fn is_event(&self) -> bool {
        matches!(self.inner.kind, TargetKind::Event { .. })
    }

    /// Command names; empty for events.
    pub fn names(&self) -> &[String] {
        match &self.inner.kind {
            TargetKind::Command { names, .. } => names,
            TargetKind::Event { .. } => &[],
        }
    }

    /// Event type tags; empty for commands.
    pub fn event_types(&self) -> &[String] {
        match &self.inner.kind {
            TargetKind::Event { types } => types,
            TargetKind::Command { .. } => &[],
        }
    }

    pub fn parser(&self) -> Option<&ArgumentParser> {
        match &self.inner.kind {
            TargetKind::Command { parser, .. } => parser.as_deref(),
            TargetKind::Event { .. } => None,
        }
    }

    /// Target-local hooks.
    pub fn hooks(&self) -> &Hooks {
        &self.inner.hooks
    }

    pub fn exception_handlers(&self) -> &[ExceptionHandler] {
        &self.inner.exception_handlers
    }

    pub(crate) fn handler(&self) -> &BoxedHandler {
        &self.inner.handler
    }

    /// Appends an exception handler. Clones the definition if it is shared.
    pub(crate) fn push_exception_handler(&mut self, handler: ExceptionHandler) {
        Arc::make_mut(&mut self.inner)
            .exception_handlers
            .push(handler);
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Target");
        debug.field("id", &self.inner.id);
        match &self.inner.kind {
            TargetKind::Command { names, parser } => {
                debug
                    .field("names", names)
                    .field("arguments", &parser.as_ref().map_or(0, |p| p.specs().len()));
            }
            TargetKind::Event { types } => {
                debug.field("types", types);
            }
        }
        debug
            .field("hooks", &self.inner.hooks)
            .field("exception_handlers", &self.inner.exception_handlers.len())
            .finish()
    }
}

// ============================================================================
// Shared builder state
// ============================================================================

/// Builder state common to commands and events.
#[derive(Default)]
pub(crate) struct TargetParts {
    pub(crate) id: Option<String>,
    pub(crate) hooks: Hooks,
    pub(crate) exception_handlers: Vec<ExceptionHandlerBuilder>,
    pub(crate) handler: Option<BoxedHandler>,
}

impl TargetParts {
    /// Builds the exception handlers, scoping id-less ones to `id`.
    pub(crate) fn build_exception_handlers(
        &mut self,
        id: &str,
    ) -> crate::error::BuildResult<Vec<ExceptionHandler>> {
        std::mem::take(&mut self.exception_handlers)
            .into_iter()
            .map(|builder| builder.build_scoped(id))
            .collect()
    }
}

/// Generates the builder methods shared by command and event builders.
macro_rules! target_builder_methods {
    () => {
        /// Sets the target id.
        pub fn id(mut self, id: impl Into<String>) -> Self {
            self.parts.id = Some(id.into());
            self
        }

        /// Appends a filter (guard).
        pub fn filter(mut self, filter: impl $crate::hook::Filter + 'static) -> Self {
            self.parts.hooks.push_filter(filter);
            self
        }

        /// Appends an interceptor (transformer).
        pub fn interceptor(mut self, interceptor: impl $crate::hook::Interceptor + 'static) -> Self {
            self.parts.hooks.push_interceptor(interceptor);
            self
        }

        /// Appends a consumer (post-processor).
        pub fn consumer(mut self, consumer: impl $crate::hook::Consumer + 'static) -> Self {
            self.parts.hooks.push_consumer(consumer);
            self
        }

        /// Appends an exception handler descriptor. Descriptors without an id
        /// are scoped to this target.
        pub fn exception_handler(mut self, handler: $crate::exception::ExceptionHandlerBuilder) -> Self {
            self.parts.exception_handlers.push(handler);
            self
        }

        /// Appends an exception handler for the given exceptions.
        pub fn on_error<I, F, Fut, R>(self, exceptions: I, f: F) -> Self
        where
            I: IntoIterator,
            I::Item: Into<ember_core::ExceptionFilter>,
            F: Fn(std::sync::Arc<$crate::context::InvocationContext>, ember_core::SharedError) -> Fut
                + Send
                + Sync
                + 'static,
            Fut: std::future::Future<Output = R> + Send + 'static,
            R: $crate::handler::IntoOutput,
        {
            self.exception_handler(
                $crate::exception::ExceptionHandler::builder()
                    .exceptions(exceptions)
                    .handler(f),
            )
        }

        /// Appends an exception handler accepting every error.
        pub fn on_any_error<F, Fut, R>(self, f: F) -> Self
        where
            F: Fn(std::sync::Arc<$crate::context::InvocationContext>, ember_core::SharedError) -> Fut
                + Send
                + Sync
                + 'static,
            Fut: std::future::Future<Output = R> + Send + 'static,
            R: $crate::handler::IntoOutput,
        {
            self.exception_handler($crate::exception::ExceptionHandler::builder().handler(f))
        }

        /// Sets the handler function.
        pub fn handler<F, Fut, R>(mut self, f: F) -> Self
        where
            F: Fn(std::sync::Arc<$crate::context::InvocationContext>) -> Fut + Send + Sync + 'static,
            Fut: std::future::Future<Output = R> + Send + 'static,
            R: $crate::handler::IntoOutput,
        {
            self.parts.handler = Some($crate::handler::into_handler(f));
            self
        }
    };
}

pub(crate) use target_builder_methods;

/// Rejects blank names, event types and ids.
pub(crate) fn check_not_blank<'a>(
    values: impl IntoIterator<Item = &'a String>,
) -> crate::error::BuildResult<()> {
    if values.into_iter().any(|value| value.trim().is_empty()) {
        return Err(crate::error::BuildError::BlankName);
    }
    Ok(())
}
