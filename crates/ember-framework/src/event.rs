//! Platform events.
//!
//! An [`Event`] is a [`Target`] triggered by platform activity rather than
//! by a typed command: a member joining, a reaction being added, a message
//! being deleted. It subscribes to one or more event type tags and runs the
//! same pipeline as a command, without argument parsing.
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_framework::Event;
//!
//! let welcome = Event::builder()
//!     .event_type("guildMemberAdd")
//!     .handler(|ctx| async move {
//!         tracing::info!(user = ?ctx.payload().author_id(), "member joined");
//!     })
//!     .build()?;
//! ```

use std::sync::Arc;

use tracing::{Instrument, debug_span};

use ember_core::BoxedPayload;

use crate::context::InvocationContext;
use crate::error::{BuildError, BuildResult, DispatchResult};
use crate::hook::Hooks;
use crate::pipeline::Pipeline;
use crate::target::{Target, TargetKind, TargetParts, check_not_blank, target_builder_methods};

/// An event target.
#[derive(Debug, Clone)]
pub struct Event {
    target: Target,
}

impl Event {
    /// Starts building an event.
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    pub fn id(&self) -> &str {
        self.target.id()
    }

    /// The event type tags this event subscribes to.
    pub fn types(&self) -> &[String] {
        self.target.event_types()
    }

    /// Returns `true` if this event subscribes to `tag`.
    pub fn subscribes_to(&self, tag: &str) -> bool {
        self.types().iter().any(|t| t == tag)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub(crate) fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    /// Dispatches one occurrence of this event.
    pub async fn emit(&self, tag: &str, payload: BoxedPayload, globals: &Hooks) -> DispatchResult<bool> {
        let span = debug_span!("dispatch", kind = "event", target_id = %self.id(), event = %tag);
        let ctx = Arc::new(InvocationContext::new(self.target.clone(), payload, None));
        Pipeline::compose(globals, &self.target)
            .execute(ctx)
            .instrument(span)
            .await
    }
}

/// Builder for [`Event`].
#[derive(Default)]
pub struct EventBuilder {
    parts: TargetParts,
    types: Vec<String>,
}

impl EventBuilder {
    target_builder_methods!();

    /// Subscribes to an event type tag.
    pub fn event_type(mut self, tag: impl Into<String>) -> Self {
        self.types.push(tag.into());
        self
    }

    /// Subscribes to several event type tags.
    pub fn event_types<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Validates and builds the event.
    ///
    /// The id defaults to the first event type.
    pub fn build(mut self) -> BuildResult<Event> {
        check_not_blank(self.types.iter().chain(self.parts.id.iter()))?;

        let id = self
            .parts
            .id
            .take()
            .or_else(|| self.types.first().cloned())
            .ok_or(BuildError::MissingIdentity)?;
        if self.types.is_empty() {
            return Err(BuildError::MissingEventTypes { id });
        }

        let handler = self
            .parts
            .handler
            .take()
            .ok_or_else(|| BuildError::MissingHandler { id: id.clone() })?;
        let exception_handlers = self.parts.build_exception_handlers(&id)?;

        let kind = TargetKind::Event { types: self.types };
        Ok(Event {
            target: Target::new(id, kind, self.parts.hooks, exception_handlers, handler),
        })
    }
}
