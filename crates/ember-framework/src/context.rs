//! Invocation context for the Ember framework.
//!
//! One [`InvocationContext`] is created per dispatch attempt and shared by
//! every stage of that dispatch through an `Arc`. It carries:
//!
//! - the [`Target`] being dispatched (a command or an event),
//! - the raw inbound [`Payload`](ember_core::Payload),
//! - for commands, the [`CallDescriptor`] describing how the command was
//!   invoked, plus the parsed [`Args`],
//! - the **shared data bag**, a string-keyed JSON map that starts empty and is
//!   only ever replaced by the pipeline after interceptors and consumers run.
//!
//! The context is owned by its dispatch and dropped once the dispatch ends.

use parking_lot::RwLock;
use serde_json::{Map, Value};

use ember_core::BoxedPayload;

use crate::argument::{ArgValue, Args};
use crate::target::Target;

/// How a command was invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallDescriptor {
    /// The prefix (or mention) that introduced the command.
    pub prefix: String,
    /// The command name as typed by the user.
    pub name: String,
    /// Whether the command was addressed via a direct mention of the bot.
    pub mentioned: bool,
    /// Raw argument tokens following the command name.
    pub tokens: Vec<String>,
}

impl CallDescriptor {
    /// Creates a descriptor for a command invoked with `prefix` and `name`.
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the raw argument tokens.
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the call as addressed via a mention.
    pub fn mentioned(mut self, mentioned: bool) -> Self {
        self.mentioned = mentioned;
        self
    }
}

/// The context shared by every stage of one dispatch.
pub struct InvocationContext {
    target: Target,
    payload: BoxedPayload,
    call: Option<CallDescriptor>,
    args: RwLock<Args>,
    data: RwLock<Map<String, Value>>,
}

impl InvocationContext {
    pub(crate) fn new(target: Target, payload: BoxedPayload, call: Option<CallDescriptor>) -> Self {
        Self {
            target,
            payload,
            call,
            args: RwLock::new(Args::default()),
            data: RwLock::new(Map::new()),
        }
    }

    /// Returns the target being dispatched.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the inbound payload.
    pub fn payload(&self) -> &BoxedPayload {
        &self.payload
    }

    /// Returns the call descriptor, present for command dispatches only.
    pub fn call(&self) -> Option<&CallDescriptor> {
        self.call.as_ref()
    }

    /// Returns a snapshot of the parsed argument map.
    pub fn args(&self) -> Args {
        self.args.read().clone()
    }

    /// Returns a single parsed argument.
    ///
    /// Declared arguments that could not be cast are present as
    /// [`ArgValue::Null`]; undeclared ids return `None`.
    pub fn arg(&self, id: &str) -> Option<ArgValue> {
        self.args.read().get(id).cloned()
    }

    /// Returns a snapshot of the shared data bag.
    pub fn data(&self) -> Map<String, Value> {
        self.data.read().clone()
    }

    /// Returns one entry of the shared data bag.
    pub fn get_data(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    pub(crate) fn set_args(&self, args: Args) {
        *self.args.write() = args;
    }

    pub(crate) fn replace_data(&self, data: Map<String, Value>) {
        *self.data.write() = data;
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("target", &self.target.id())
            .field("payload", &self.payload)
            .field("call", &self.call)
            .field("data", &*self.data.read())
            .finish_non_exhaustive()
    }
}
