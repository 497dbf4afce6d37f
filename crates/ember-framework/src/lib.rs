//! # Ember Framework
//!
//! Dispatch of chat commands and platform events.
//!
//! This layer provides:
//! - Stage hooks: filters (guards), interceptors (transformers) and
//!   consumers (post-processors)
//! - The dispatch pipeline shared by commands and events
//! - Exception handlers and the routing of thrown values
//! - Declarative argument parsing with a pluggable type registry
//! - The [`Registry`] that owns targets and global hooks, and a
//!   `tower::Service` front for it
//!
//! Payloads, the resolver contract and exception matching live in
//! `ember-core`; the rate-limiting interceptor lives in `ember-cooldown`.

pub mod argument;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod exception;
pub mod handler;
pub mod hook;
pub mod pipeline;
pub mod registry;
pub mod service;
pub mod split;
pub mod target;

pub use argument::{ArgDefault, ArgValue, ArgumentParser, ArgumentSpec, Args, TypeRegistry};
pub use command::{Command, CommandBuilder};
pub use context::{CallDescriptor, InvocationContext};
pub use error::{
    BuildError, BuildResult, DispatchError, DispatchResult, FilterRejected, ParseFailure,
    RegistryError,
};
pub use event::{Event, EventBuilder};
pub use exception::{ExceptionHandler, ExceptionHandlerBuilder, handle_exception};
pub use handler::{BoxedHandler, IntoOutput, into_handler};
pub use hook::{Consumer, Filter, Flow, Hooks, Interceptor, consumer_fn, filter_fn, interceptor_fn};
pub use pipeline::{Pipeline, Stage};
pub use registry::{CommandSettings, Registry};
pub use service::{Inbound, RegistryService};
pub use split::shell_split;
pub use target::{Target, TargetKind};

pub use ember_core::{
    BoxError, BoxedPayload, EntityKind, ExceptionFilter, Payload, Resolver, SharedError,
    TextPayload, Thrown,
};
