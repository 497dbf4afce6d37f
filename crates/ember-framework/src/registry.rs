//! The command and event registry.
//!
//! A [`Registry`] is built explicitly during setup: commands, events,
//! global hooks and exception handlers are registered, then the registry is
//! shared read-only (typically behind an `Arc`) while traffic flows.
//!
//! At runtime the registry resolves each inbound payload to zero or one
//! target and dispatches it:
//!
//! - [`handle_message`](Registry::handle_message) matches a mention or a
//!   prefix, splits the rest of the line into tokens and looks the first
//!   token up among command names,
//! - [`emit`](Registry::emit) dispatches to the first event subscribed to
//!   the given event type tag.
//!
//! Global hooks run before the target's own hooks.
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_framework::{Command, Registry, TextPayload};
//!
//! let mut registry = Registry::new();
//! registry.register_command(
//!     Command::builder().name("ping").handler(|_| async { "pong" }).build()?,
//! )?;
//!
//! let handled = registry.handle_message(TextPayload::new("!ping").boxed()).await?;
//! assert!(handled);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use ember_core::{BoxedPayload, Payload, Resolver};

use crate::command::Command;
use crate::context::CallDescriptor;
use crate::error::{DispatchResult, RegistryError};
use crate::event::Event;
use crate::exception::ExceptionHandler;
use crate::hook::{Consumer, Filter, Hooks, Interceptor};
use crate::split::shell_split;

// ============================================================================
// Settings
// ============================================================================

/// How command lines are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Prefixes that introduce a command, e.g. `!`.
    pub prefixes: Vec<String>,
    /// Whether mentioning the bot (`<@id>` or `<@!id>`) introduces a command.
    pub mention_prefix: bool,
    /// The bot's user id, required for mention prefixes.
    pub bot_id: Option<String>,
    /// Whether command names match case-insensitively.
    pub case_insensitive: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefixes: vec!["!".to_string()],
            mention_prefix: true,
            bot_id: None,
            case_insensitive: true,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Owns every command, event and global hook.
#[derive(Default)]
pub struct Registry {
    commands: Vec<Command>,
    events: Vec<Event>,
    hooks: Hooks,
    resolver: Option<Arc<dyn Resolver>>,
    settings: CommandSettings,
}

impl Registry {
    /// Creates an empty registry with default command settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given command settings.
    pub fn with_settings(settings: CommandSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &CommandSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CommandSettings) {
        self.settings = settings;
    }

    /// Sets the resolver handed to argument parsers.
    pub fn set_resolver(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolver = Some(resolver);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Global hooks, run before every target's own hooks.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    /// Registers a command.
    ///
    /// Fails if the id is taken by any command or event, or if any of its
    /// names is already used by another command.
    pub fn register_command(&mut self, command: Command) -> Result<(), RegistryError> {
        self.ensure_unique_id(command.id())?;
        for name in command.names() {
            if let Some(owner) = self.find_command(name) {
                return Err(RegistryError::DuplicateName {
                    name: name.clone(),
                    owner: owner.id().to_string(),
                });
            }
        }
        info!(id = command.id(), names = ?command.names(), "command registered");
        self.commands.push(command);
        Ok(())
    }

    /// Registers an event.
    pub fn register_event(&mut self, event: Event) -> Result<(), RegistryError> {
        self.ensure_unique_id(event.id())?;
        info!(id = event.id(), types = ?event.types(), "event registered");
        self.events.push(event);
        Ok(())
    }

    fn ensure_unique_id(&self, id: &str) -> Result<(), RegistryError> {
        let taken = self.commands.iter().any(|c| c.id() == id)
            || self.events.iter().any(|e| e.id() == id);
        if taken {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Appends a global filter.
    pub fn add_filter(&mut self, filter: impl Filter + 'static) {
        self.hooks.push_filter(filter);
    }

    /// Appends a global interceptor.
    pub fn add_interceptor(&mut self, interceptor: impl Interceptor + 'static) {
        self.hooks.push_interceptor(interceptor);
    }

    /// Appends a global consumer.
    pub fn add_consumer(&mut self, consumer: impl Consumer + 'static) {
        self.hooks.push_consumer(consumer);
    }

    /// Appends an exception handler to the command or event whose id equals
    /// the handler's id.
    pub fn add_exception_handler(&mut self, handler: ExceptionHandler) -> Result<(), RegistryError> {
        let id = handler.id().to_string();
        if let Some(command) = self.commands.iter_mut().find(|c| c.id() == id) {
            command.target_mut().push_exception_handler(handler);
        } else if let Some(event) = self.events.iter_mut().find(|e| e.id() == id) {
            event.target_mut().push_exception_handler(handler);
        } else {
            return Err(RegistryError::UnknownTarget(id));
        }
        debug!(id = %id, "exception handler added");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Finds a command by one of its names.
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        let case_insensitive = self.settings.case_insensitive;
        self.commands
            .iter()
            .find(|command| command.answers_to(name, case_insensitive))
    }

    /// Finds a command by id.
    pub fn command(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.id() == id)
    }

    /// Finds the first event subscribed to `tag`.
    pub fn find_event(&self, tag: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.subscribes_to(tag))
    }

    /// Resolves a message to a command and the description of its call.
    pub fn resolve_command(&self, payload: &dyn Payload) -> Option<(&Command, CallDescriptor)> {
        let content = payload.content().trim_start();
        let (prefix, rest, mentioned) = self.strip_prefix(content)?;

        let mut tokens = shell_split(rest).into_iter();
        let name = tokens.next()?;
        let command = self.find_command(&name)?;

        let call = CallDescriptor::new(prefix, name)
            .mentioned(mentioned)
            .with_tokens(tokens);
        Some((command, call))
    }

    /// Splits off a mention or the longest matching prefix.
    fn strip_prefix<'a>(&self, content: &'a str) -> Option<(String, &'a str, bool)> {
        if self.settings.mention_prefix
            && let Some(bot_id) = &self.settings.bot_id
        {
            for mention in [format!("<@{bot_id}>"), format!("<@!{bot_id}>")] {
                if let Some(rest) = content.strip_prefix(mention.as_str()) {
                    return Some((mention, rest, true));
                }
            }
        }

        self.settings
            .prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .filter_map(|prefix| content.strip_prefix(prefix.as_str()).map(|rest| (prefix, rest)))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, rest)| (prefix.clone(), rest, false))
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Resolves a message to a command and dispatches it.
    ///
    /// Returns `Ok(false)` when no command matched or the dispatch was
    /// rejected.
    pub async fn handle_message(&self, payload: BoxedPayload) -> DispatchResult<bool> {
        let Some((command, call)) = self.resolve_command(payload.as_ref()) else {
            trace!("message did not resolve to a command");
            return Ok(false);
        };
        command
            .call(payload, call, &self.hooks, self.resolver.as_deref())
            .await
    }

    /// Dispatches a platform event to the first event subscribed to `tag`.
    pub async fn emit(&self, tag: &str, payload: BoxedPayload) -> DispatchResult<bool> {
        let Some(event) = self.find_event(tag) else {
            trace!(tag, "no event subscribed");
            return Ok(false);
        };
        event.emit(tag, payload, &self.hooks).await
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.commands.len())
            .field("events", &self.events.len())
            .field("hooks", &self.hooks)
            .field("resolver", &self.resolver.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}
