//! # Ember Core
//!
//! The core abstractions of the Ember command dispatch framework.
//!
//! This crate holds the pieces every other layer agrees on:
//!
//! - **Invocation sources**: type-erased inbound payloads ([`Payload`], [`BoxedPayload`])
//! - **Entity resolution**: the injected platform collaborator ([`Resolver`], [`EntityKind`])
//! - **Exception matching**: descriptors and the pure matching function
//!   ([`ExceptionFilter`], [`matches`])
//! - **Thrown values**: the boxed error type that flows through the pipeline ([`BoxError`])
//!
//! Dispatch itself (guards, interceptors, handlers, consumers) is implemented
//! in `ember-framework`.

pub mod error;
pub mod exception;
pub mod payload;
pub mod resolver;

pub use error::{BoxError, DynError, SharedError, Thrown};
pub use exception::{ErrorPredicate, ExceptionFilter, accepts, matches};
pub use payload::{BoxedPayload, Payload, TextPayload};
pub use resolver::{EntityKind, Requirement, Resolver};
