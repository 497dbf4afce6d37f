//! Configuration module for Ember runtime.
//!
//! Layered loading (defaults, files, environment, overrides) and validation
//! of command recognition, cooldown and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CooldownBackend, CooldownConfig, EmberConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
