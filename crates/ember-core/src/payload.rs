//! Invocation sources for the Ember framework.
//!
//! A [`Payload`] is whatever the chat-platform adapter hands to the registry:
//! a message, a reaction, a member joining a guild. The core only ever reads
//! from it; payloads are never mutated by the pipeline.
//!
//! - [`Payload`] - Base trait for all invocation sources
//! - [`BoxedPayload`] - Shared, type-erased payload handle
//! - [`TextPayload`] - Plain struct implementation for adapters and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_core::{Payload, TextPayload};
//!
//! let payload = TextPayload::new("!ping")
//!     .author("42")
//!     .guild("1001")
//!     .channel("2002");
//!
//! assert_eq!(payload.content(), "!ping");
//! assert_eq!(payload.author_id(), Some("42"));
//! ```

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

// ============================================================================
// Core Payload Trait
// ============================================================================

/// The base trait for every inbound invocation source.
///
/// Payloads are type-erased as `dyn Payload` and can be downcast back to the
/// adapter's concrete type with [`downcast_ref`](trait.Payload.html#method.downcast_ref).
pub trait Payload: Any + Send + Sync + Debug {
    /// Returns the textual content of the payload.
    ///
    /// Non-message events return an empty string.
    fn content(&self) -> &str;

    /// Returns the identifier of the user that caused this payload, if any.
    fn author_id(&self) -> Option<&str>;

    /// Returns the guild (server) the payload originated from, if any.
    fn guild_id(&self) -> Option<&str> {
        None
    }

    /// Returns the channel the payload originated from, if any.
    fn channel_id(&self) -> Option<&str> {
        None
    }

    /// Returns the identifier of the underlying platform message, if any.
    fn message_id(&self) -> Option<&str> {
        None
    }

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Payload {
    /// Attempts to downcast the payload to its concrete adapter type.
    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns `true` if the payload is of concrete type `T`.
    pub fn is<T: Payload>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A shared, type-erased payload.
pub type BoxedPayload = Arc<dyn Payload>;

// ============================================================================
// TextPayload
// ============================================================================

/// A plain payload built from owned strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPayload {
    content: String,
    author_id: Option<String>,
    guild_id: Option<String>,
    channel_id: Option<String>,
    message_id: Option<String>,
}

impl TextPayload {
    /// Creates a payload carrying only textual content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the author identifier.
    pub fn author(mut self, id: impl Into<String>) -> Self {
        self.author_id = Some(id.into());
        self
    }

    /// Sets the guild identifier.
    pub fn guild(mut self, id: impl Into<String>) -> Self {
        self.guild_id = Some(id.into());
        self
    }

    /// Sets the channel identifier.
    pub fn channel(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    /// Sets the platform message identifier.
    pub fn message(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Wraps the payload into a [`BoxedPayload`].
    pub fn boxed(self) -> BoxedPayload {
        Arc::new(self)
    }
}

impl Payload for TextPayload {
    fn content(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    fn guild_id(&self) -> Option<&str> {
        self.guild_id.as_deref()
    }

    fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ReactionAdd {
        user: String,
    }

    impl Payload for ReactionAdd {
        fn content(&self) -> &str {
            ""
        }

        fn author_id(&self) -> Option<&str> {
            Some(&self.user)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_text_payload_fields() {
        let payload = TextPayload::new("!ping").author("42").guild("7");
        assert_eq!(payload.content(), "!ping");
        assert_eq!(payload.author_id(), Some("42"));
        assert_eq!(payload.guild_id(), Some("7"));
        assert_eq!(payload.channel_id(), None);
    }

    #[test]
    fn test_downcast_boxed_payload() {
        let boxed: BoxedPayload = Arc::new(ReactionAdd {
            user: "u1".to_string(),
        });
        assert!(boxed.is::<ReactionAdd>());
        assert!(!boxed.is::<TextPayload>());
        assert_eq!(boxed.downcast_ref::<ReactionAdd>().unwrap().user, "u1");
    }
}
