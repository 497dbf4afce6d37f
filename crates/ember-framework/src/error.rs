//! Error types for the Ember framework.

use thiserror::Error;

use ember_core::BoxError;

/// Raised by the default [`Filter::handle_error`](crate::hook::Filter::handle_error)
/// when a filter's verdict rejects the invocation.
///
/// Exception handlers can react to it with
/// `ExceptionFilter::of::<FilterRejected>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invocation rejected by {} filter", filter_mode(.whitelist))]
pub struct FilterRejected {
    /// Whether the rejecting filter was a whitelist.
    pub whitelist: bool,
}

fn filter_mode(whitelist: &bool) -> &'static str {
    if *whitelist { "whitelist" } else { "blacklist" }
}

/// Errors raised while building a command, event or exception handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Neither an id nor a name/type was supplied.
    #[error("target has neither an id nor a name")]
    MissingIdentity,

    /// A name, alias, event type or id was empty or whitespace.
    #[error("names, event types and ids must not be blank")]
    BlankName,

    /// A command lists the same name twice, ignoring ASCII case.
    #[error("command '{id}' lists the name '{name}' more than once")]
    DuplicateName {
        /// The command id.
        id: String,
        /// The repeated name.
        name: String,
    },

    /// An event target was built without event types.
    #[error("event '{id}' subscribes to no event types")]
    MissingEventTypes {
        /// The event id.
        id: String,
    },

    /// No handler function was supplied.
    #[error("target '{id}' has no handler")]
    MissingHandler {
        /// The target id.
        id: String,
    },

    /// An exception handler descriptor without an id.
    #[error("exception handler has no id and no scoping target")]
    MissingExceptionId,

    /// An exception handler descriptor without a handler function.
    #[error("exception handler for '{id}' has no handler")]
    MissingExceptionHandler {
        /// The id the descriptor was declared for.
        id: String,
    },
}

/// Errors raised while registering targets or types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A target with the same id is already registered.
    #[error("duplicate target id '{0}'")]
    DuplicateId(String),

    /// A command name or alias is already taken.
    #[error("command name '{name}' is already used by '{owner}'")]
    DuplicateName {
        /// The clashing name.
        name: String,
        /// Id of the command that already owns it.
        owner: String,
    },

    /// An exception handler was declared for an id nobody registered.
    #[error("no command or event with id '{0}'")]
    UnknownTarget(String),

    /// A custom type tag tried to replace a built-in one.
    #[error("type '{0}' is built in and cannot be replaced or removed")]
    BuiltinType(String),
}

/// Errors that escape a dispatch.
///
/// Thrown values from guards, interceptors, handlers and consumers never
/// show up here: they are routed to exception handlers and, when nothing
/// matches, absorbed. Only a failing exception handler propagates.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An exception handler itself failed.
    #[error("exception handler of '{target}' failed: {source}")]
    ExceptionHandler {
        /// Id of the target whose exception handler failed.
        target: String,
        /// The error returned by the exception handler.
        source: BoxError,
    },
}

/// An argument processor or caster failed.
#[derive(Debug, Error)]
#[error("failed to parse argument '{argument}': {source}")]
pub struct ParseFailure {
    /// Id of the argument being parsed.
    pub argument: String,
    /// The thrown value.
    pub source: BoxError,
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
