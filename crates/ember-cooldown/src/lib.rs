//! # Ember Cooldown
//!
//! Per-user rate limiting for Ember commands and events.
//!
//! - [`CooldownStore`] - The asynchronous store contract
//! - [`MemoryCooldownStore`] - In-process backend
//! - `RedisCooldownStore` - Durable backend (`redis` feature)
//! - [`CooldownInterceptor`] - Applies a store to a pipeline's transform stage
//!
//! A store is parameterised by a [`CooldownPolicy`]: the window length and
//! how many uses a user gets per window.

pub mod error;
pub mod interceptor;
pub mod memory;
pub mod record;
pub mod store;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use error::{CooldownError, CooldownResult};
pub use interceptor::CooldownInterceptor;
pub use memory::MemoryCooldownStore;
pub use record::{Acquire, CooldownPolicy, CooldownRecord, CooldownState, now_millis};
pub use store::CooldownStore;

#[cfg(feature = "redis")]
pub use redis_store::RedisCooldownStore;
