//! The dispatch pipeline.
//!
//! One pipeline run drives a single [`InvocationContext`] through four
//! stages, strictly in order:
//!
//! 1. **Guard**: every filter runs, then its `handle_error`. A failing
//!    `handle_error` routes its error and marks the stage rejected, but the
//!    remaining filters still run. A verdict alone never blocks.
//! 2. **Transform**: interceptors run in order. Each may contribute data,
//!    which is shallow-merged into an accumulator (later keys win) and
//!    published as the context's shared data bag. A `next == false` or a
//!    thrown value halts the remaining interceptors and the pipeline.
//! 3. **Handle**: the handler runs. A thrown value is routed and rejects.
//! 4. **Post-process**: consumers run with the handler's output, with the
//!    same halt and merge rules as the transform stage and a fresh
//!    accumulator.
//!
//! The run reports `Ok(true)` only when every stage completed. There is no
//! retry, timeout or cancellation: a hook that never completes keeps the
//! dispatch pending.
//!
//! ```text
//! Pending -> Guarded -> Transformed -> Handled -> Consumed
//!    \           \            \            \
//!     `-----------`------------`------------`--> Rejected
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use ember_core::BoxError;

use crate::context::InvocationContext;
use crate::error::DispatchResult;
use crate::exception::{ExceptionHandler, handle_exception};
use crate::handler::BoxedHandler;
use crate::hook::{Flow, Hooks};
use crate::target::Target;

/// Progress of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Guarded,
    Transformed,
    Handled,
    Consumed,
    Rejected,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Guarded => "guarded",
            Self::Transformed => "transformed",
            Self::Handled => "handled",
            Self::Consumed => "consumed",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// The hooks, exception handlers and handler of one dispatch.
#[derive(Clone)]
pub struct Pipeline {
    hooks: Hooks,
    exception_handlers: Vec<ExceptionHandler>,
    handler: BoxedHandler,
}

impl Pipeline {
    /// Composes the pipeline of `target`, running `globals` before the
    /// target's own hooks.
    pub fn compose(globals: &Hooks, target: &Target) -> Self {
        Self {
            hooks: globals.chain(target.hooks()),
            exception_handlers: target.exception_handlers().to_vec(),
            handler: Arc::clone(target.handler()),
        }
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Runs every stage against `ctx`.
    ///
    /// Only a failing exception handler produces `Err`.
    pub async fn execute(&self, ctx: Arc<InvocationContext>) -> DispatchResult<bool> {
        let mut stage = Stage::Pending;

        if !self.guard(&ctx).await? {
            return Ok(self.reject(&ctx, stage));
        }
        stage = self.advance(&ctx, Stage::Guarded);

        if !self.transform(&ctx).await? {
            return Ok(self.reject(&ctx, stage));
        }
        stage = self.advance(&ctx, Stage::Transformed);

        let output = match (self.handler)(Arc::clone(&ctx)).await {
            Ok(output) => output,
            Err(err) => {
                self.route(&ctx, err).await?;
                return Ok(self.reject(&ctx, stage));
            }
        };
        stage = self.advance(&ctx, Stage::Handled);

        if !self.post_process(&ctx, &output).await? {
            return Ok(self.reject(&ctx, stage));
        }
        self.advance(&ctx, Stage::Consumed);
        Ok(true)
    }

    async fn guard(&self, ctx: &Arc<InvocationContext>) -> DispatchResult<bool> {
        let mut accepted = true;
        for filter in &self.hooks.filters {
            let verdict = filter.filter(ctx).await;
            if let Err(err) = filter.handle_error(verdict, ctx).await {
                trace!(target_id = ctx.target().id(), ?verdict, "filter rejected");
                accepted = false;
                self.route(ctx, err).await?;
            }
        }
        Ok(accepted)
    }

    async fn transform(&self, ctx: &Arc<InvocationContext>) -> DispatchResult<bool> {
        let mut acc = Map::new();
        for interceptor in &self.hooks.interceptors {
            let flow = interceptor.intercept(ctx).await;
            if !self.apply(ctx, &mut acc, flow).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn post_process(&self, ctx: &Arc<InvocationContext>, output: &Value) -> DispatchResult<bool> {
        let mut acc = Map::new();
        for consumer in &self.hooks.consumers {
            let flow = consumer.consume(ctx, output).await;
            if !self.apply(ctx, &mut acc, flow).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Merges one hook's result and reports whether to continue.
    async fn apply(
        &self,
        ctx: &Arc<InvocationContext>,
        acc: &mut Map<String, Value>,
        flow: Result<Flow, BoxError>,
    ) -> DispatchResult<bool> {
        match flow {
            Ok(Flow { next, data }) => {
                if let Some(Value::Object(data)) = data {
                    acc.extend(data);
                    ctx.replace_data(acc.clone());
                }
                Ok(next)
            }
            Err(err) => {
                self.route(ctx, err).await?;
                Ok(false)
            }
        }
    }

    async fn route(&self, ctx: &Arc<InvocationContext>, err: BoxError) -> DispatchResult<()> {
        handle_exception(&self.exception_handlers, ctx, err).await?;
        Ok(())
    }

    fn advance(&self, ctx: &InvocationContext, stage: Stage) -> Stage {
        trace!(target_id = ctx.target().id(), %stage, "stage reached");
        stage
    }

    fn reject(&self, ctx: &InvocationContext, from: Stage) -> bool {
        debug!(target_id = ctx.target().id(), after = %from, stage = %Stage::Rejected, "dispatch rejected");
        false
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("hooks", &self.hooks)
            .field("exception_handlers", &self.exception_handlers.len())
            .finish_non_exhaustive()
    }
}
