//! Stage hooks for the dispatch pipeline.
//!
//! Three kinds of hook surround a handler:
//!
//! - [`Filter`] (guard): decides whether the invocation may proceed. The
//!   verdict alone never blocks; blocking is delegated to
//!   [`handle_error`](Filter::handle_error), which rejects by returning `Err`.
//! - [`Interceptor`] (transformer): runs before the handler, may halt the
//!   pipeline and may contribute entries to the shared data bag.
//! - [`Consumer`] (post-processor): same contract as an interceptor, runs
//!   after the handler and additionally sees the handler's output.
//!
//! Interceptors and consumers report through a [`Flow`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_framework::hook::{Flow, filter_fn, interceptor_fn};
//! use serde_json::json;
//!
//! let guild_only = filter_fn(|ctx| Some(ctx.payload().guild_id().is_some()));
//! let tag = interceptor_fn(|_ctx| Ok(Flow::proceed().with_data(json!({ "source": "chat" }))));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ember_core::BoxError;

use crate::context::InvocationContext;
use crate::error::FilterRejected;

// ============================================================================
// Flow
// ============================================================================

/// The verdict of an interceptor or consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    /// Whether the pipeline continues. Defaults to `true`.
    pub next: bool,
    /// Entries to merge into the shared data bag. Only JSON objects are merged.
    pub data: Option<Value>,
}

impl Default for Flow {
    fn default() -> Self {
        Self::proceed()
    }
}

impl Flow {
    /// Continue with the next hook.
    pub fn proceed() -> Self {
        Self {
            next: true,
            data: None,
        }
    }

    /// Halt the remaining hooks and the rest of the pipeline.
    pub fn halt() -> Self {
        Self {
            next: false,
            data: None,
        }
    }

    /// Attaches data to merge into the shared data bag.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ============================================================================
// Hook traits
// ============================================================================

/// A guard evaluated before any interceptor runs.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Whether a `true` verdict means "allowed" (whitelist) or "denied" (blacklist).
    fn whitelist(&self) -> bool {
        true
    }

    /// Computes the verdict. `None` means "no opinion".
    async fn filter(&self, ctx: &InvocationContext) -> Option<bool>;

    /// Reacts to the verdict. Returning `Err` rejects the invocation and
    /// routes the error to the target's exception handlers.
    ///
    /// The default rejects with [`FilterRejected`] when a whitelist filter
    /// answered `false` or a blacklist filter answered `true`.
    async fn handle_error(
        &self,
        result: Option<bool>,
        _ctx: &InvocationContext,
    ) -> Result<(), BoxError> {
        let whitelist = self.whitelist();
        if result == Some(!whitelist) {
            Err(FilterRejected { whitelist }.into())
        } else {
            Ok(())
        }
    }
}

/// A transformer evaluated before the handler.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Inspects the invocation and decides whether it continues.
    async fn intercept(&self, ctx: &InvocationContext) -> Result<Flow, BoxError>;
}

/// A post-processor evaluated after the handler.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Inspects the invocation and the handler's output.
    async fn consume(&self, ctx: &InvocationContext, output: &Value) -> Result<Flow, BoxError>;
}

// ============================================================================
// Hooks
// ============================================================================

/// An ordered set of filters, interceptors and consumers.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) filters: Vec<Arc<dyn Filter>>,
    pub(crate) interceptors: Vec<Arc<dyn Interceptor>>,
    pub(crate) consumers: Vec<Arc<dyn Consumer>>,
}

impl Hooks {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn push_filter(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    /// Appends an interceptor.
    pub fn push_interceptor(&mut self, interceptor: impl Interceptor + 'static) {
        self.interceptors.push(Arc::new(interceptor));
    }

    /// Appends a consumer.
    pub fn push_consumer(&mut self, consumer: impl Consumer + 'static) {
        self.consumers.push(Arc::new(consumer));
    }

    /// Returns `self` followed by `other`, preserving both orders.
    pub fn chain(&self, other: &Hooks) -> Hooks {
        Hooks {
            filters: self.filters.iter().chain(&other.filters).cloned().collect(),
            interceptors: self
                .interceptors
                .iter()
                .chain(&other.interceptors)
                .cloned()
                .collect(),
            consumers: self
                .consumers
                .iter()
                .chain(&other.consumers)
                .cloned()
                .collect(),
        }
    }

    /// Returns `true` if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.interceptors.is_empty() && self.consumers.is_empty()
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("filters", &self.filters.len())
            .field("interceptors", &self.interceptors.len())
            .field("consumers", &self.consumers.len())
            .finish()
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

type VerdictFn = Arc<dyn Fn(&InvocationContext) -> Option<bool> + Send + Sync>;
type RejectFn =
    Arc<dyn Fn(Option<bool>, &InvocationContext) -> Result<(), BoxError> + Send + Sync>;

/// A [`Filter`] built from synchronous closures.
#[derive(Clone)]
pub struct FnFilter {
    whitelist: bool,
    verdict: VerdictFn,
    on_error: Option<RejectFn>,
}

impl FnFilter {
    /// Turns this filter into a blacklist.
    pub fn blacklist(mut self) -> Self {
        self.whitelist = false;
        self
    }

    /// Replaces the default rejection behaviour.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<bool>, &InvocationContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }
}

#[async_trait]
impl Filter for FnFilter {
    fn whitelist(&self) -> bool {
        self.whitelist
    }

    async fn filter(&self, ctx: &InvocationContext) -> Option<bool> {
        (self.verdict)(ctx)
    }

    async fn handle_error(
        &self,
        result: Option<bool>,
        ctx: &InvocationContext,
    ) -> Result<(), BoxError> {
        match &self.on_error {
            Some(f) => f(result, ctx),
            None if result == Some(!self.whitelist) => Err(FilterRejected {
                whitelist: self.whitelist,
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Creates a whitelist [`FnFilter`] from a verdict closure.
pub fn filter_fn<F>(f: F) -> FnFilter
where
    F: Fn(&InvocationContext) -> Option<bool> + Send + Sync + 'static,
{
    FnFilter {
        whitelist: true,
        verdict: Arc::new(f),
        on_error: None,
    }
}

/// An [`Interceptor`] built from a synchronous closure.
pub struct FnInterceptor<F>(F);

#[async_trait]
impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&InvocationContext) -> Result<Flow, BoxError> + Send + Sync,
{
    async fn intercept(&self, ctx: &InvocationContext) -> Result<Flow, BoxError> {
        (self.0)(ctx)
    }
}

/// Creates an [`Interceptor`] from a closure.
pub fn interceptor_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(&InvocationContext) -> Result<Flow, BoxError> + Send + Sync,
{
    FnInterceptor(f)
}

/// A [`Consumer`] built from a synchronous closure.
pub struct FnConsumer<F>(F);

#[async_trait]
impl<F> Consumer for FnConsumer<F>
where
    F: Fn(&InvocationContext, &Value) -> Result<Flow, BoxError> + Send + Sync,
{
    async fn consume(&self, ctx: &InvocationContext, output: &Value) -> Result<Flow, BoxError> {
        (self.0)(ctx, output)
    }
}

/// Creates a [`Consumer`] from a closure.
pub fn consumer_fn<F>(f: F) -> FnConsumer<F>
where
    F: Fn(&InvocationContext, &Value) -> Result<Flow, BoxError> + Send + Sync,
{
    FnConsumer(f)
}
