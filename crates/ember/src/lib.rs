//! # Ember
//!
//! Typed command and event dispatch for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌───────────────────────────────────────────────┐
//! │ Adapter  │───▶│ Registry │───▶│ guard ─▶ transform ─▶ handler ─▶ post-process │
//! │ (payload)│    │ (lookup) │    │        errors ─▶ exception handlers           │
//! └──────────┘    └──────────┘    └───────────────────────────────────────────────┘
//! ```
//!
//! - **Registry**: resolves a message to a command (prefix or mention) or an
//!   event tag to an event
//! - **Pipeline**: filters, interceptors, the handler and consumers, global
//!   hooks first
//! - **Exception handlers**: receive errors raised anywhere in the pipeline
//!   that match their descriptors
//! - **Arguments**: declared per command, cast through a type registry
//! - **Cooldowns**: per-user rate limits as an interceptor, in memory or redis
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ember::prelude::*;
//!
//! let ban = Command::builder()
//!     .name("ban")
//!     .argument(ArgumentSpec::new("user").ty("member"))
//!     .argument(ArgumentSpec::new("days").ty("int").default(7))
//!     .on_any_error(|ctx, err| async move { tracing::warn!(%err, "ban failed") })
//!     .handler(|ctx| async move {
//!         let days = ctx.args().get("days").and_then(ArgValue::as_i64).unwrap_or(7);
//!         format!("banned for {days} days")
//!     })
//!     .build()?;
//!
//! let mut registry = Registry::new();
//! registry.register_command(ban)?;
//!
//! let runtime = EmberRuntime::builder().registry(registry).build()?;
//! runtime.handle_message(payload).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `json-log`: JSON log output
//! - `redis`: redis cooldown backend

pub use ember_cooldown as cooldown;
pub use ember_core as core;
pub use ember_framework as framework;
pub use ember_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use ember::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use ember_runtime::{ConfigLoader, EmberConfig, EmberRuntime};

    // Targets and registration
    pub use ember_framework::{Command, Event, Registry, RegistryService};

    // Hooks and invocation state
    pub use ember_framework::{
        Consumer, Filter, Flow, InvocationContext, Interceptor, consumer_fn, filter_fn,
        interceptor_fn,
    };

    // Exceptions
    pub use ember_framework::{DispatchError, ExceptionHandler, FilterRejected};

    // Arguments
    pub use ember_framework::{ArgDefault, ArgValue, ArgumentSpec, Args, TypeRegistry};

    // Payloads and collaborators
    pub use ember_core::{
        BoxError, BoxedPayload, ExceptionFilter, Payload, Resolver, TextPayload,
    };

    // Rate limiting
    pub use ember_cooldown::{CooldownInterceptor, CooldownPolicy, CooldownStore, MemoryCooldownStore};
}
