//! Runtime error types.

use thiserror::Error;

use ember_cooldown::CooldownError;
use ember_framework::DispatchError;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured cooldown store could not be created.
    #[error("Cooldown store error: {0}")]
    Cooldown(#[from] CooldownError),

    /// A dispatch escalated an error.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The registry is already shared with a running service.
    #[error("Registry is shared and can no longer be modified")]
    RegistryShared,

    /// The configuration asks for a backend this build does not include.
    #[error("Cooldown backend '{0}' is not enabled in this build")]
    BackendDisabled(&'static str),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
