//! Ember Runtime - configuration, logging and the runtime entry point.
//!
//! This crate provides:
//! - Layered configuration loading and validation ([`config`])
//! - `tracing` subscriber setup ([`logging`])
//! - [`EmberRuntime`], which applies configuration to a
//!   [`Registry`](ember_framework::Registry), builds the configured cooldown
//!   store and dispatches inbound messages and events
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: read `ember.toml` files
//! - `json-log`: JSON log output
//! - `redis`: the redis cooldown backend

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigLoader, EmberConfig, load_config, load_config_from_file, validate_config};
pub use error::{ConfigError, ConfigResult, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
pub use runtime::{EmberRuntime, RuntimeBuilder, build_cooldown_store};
