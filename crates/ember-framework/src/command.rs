//! Textual commands.
//!
//! A [`Command`] is a [`Target`] invoked by name from a chat message. It
//! may declare positional arguments, parsed before the pipeline runs. A
//! failing argument processor rejects the call and routes the thrown value
//! to the command's exception handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_framework::{ArgumentSpec, Command, ExceptionFilter};
//!
//! let ban = Command::builder()
//!     .name("ban")
//!     .alias("b")
//!     .argument(ArgumentSpec::new("member").ty("member"))
//!     .argument(ArgumentSpec::new("days").ty("whole").default(0))
//!     .on_error([ExceptionFilter::message("permission")], |_ctx, err| async move {
//!         format!("cannot ban: {err}")
//!     })
//!     .handler(|ctx| async move { format!("banned {}", ctx.arg("member").unwrap_or_default()) })
//!     .build()?;
//! ```

use std::sync::Arc;

use tracing::{Instrument, debug, debug_span};

use ember_core::{BoxedPayload, Resolver};

use crate::argument::{ArgumentParser, ArgumentSpec};
use crate::context::{CallDescriptor, InvocationContext};
use crate::error::{BuildError, BuildResult, DispatchResult};
use crate::exception::handle_exception;
use crate::hook::Hooks;
use crate::pipeline::Pipeline;
use crate::target::{Target, TargetKind, TargetParts, check_not_blank, target_builder_methods};

/// A command target.
#[derive(Debug, Clone)]
pub struct Command {
    target: Target,
}

impl Command {
    /// Starts building a command.
    pub fn builder() -> CommandBuilder {
        CommandBuilder::default()
    }

    pub fn id(&self) -> &str {
        self.target.id()
    }

    /// Invocation names, canonical name first.
    pub fn names(&self) -> &[String] {
        self.target.names()
    }

    pub fn parser(&self) -> Option<&ArgumentParser> {
        self.target.parser()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub(crate) fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    /// Returns `true` if `name` invokes this command.
    pub fn answers_to(&self, name: &str, case_insensitive: bool) -> bool {
        self.names().iter().any(|candidate| {
            if case_insensitive {
                candidate.eq_ignore_ascii_case(name)
            } else {
                candidate == name
            }
        })
    }

    /// Dispatches one call of this command.
    ///
    /// Arguments are parsed first; the pipeline then runs with `globals`
    /// ahead of the command's own hooks. Returns `Ok(true)` when every stage
    /// completed.
    pub async fn call(
        &self,
        payload: BoxedPayload,
        call: CallDescriptor,
        globals: &Hooks,
        resolver: Option<&dyn Resolver>,
    ) -> DispatchResult<bool> {
        let span = debug_span!("dispatch", kind = "command", target_id = %self.id(), name = %call.name);
        async move {
            let parsed = match self.parser() {
                Some(parser) => Some(parser.parse(payload.as_ref(), &call, resolver).await),
                None => None,
            };

            let ctx = Arc::new(InvocationContext::new(
                self.target.clone(),
                payload,
                Some(call),
            ));

            match parsed {
                Some(Ok(args)) => ctx.set_args(args),
                Some(Err(failure)) => {
                    debug!(argument = %failure.argument, error = %failure.source, "argument parsing failed");
                    handle_exception(self.target.exception_handlers(), &ctx, failure.source).await?;
                    return Ok(false);
                }
                None => {}
            }

            Pipeline::compose(globals, &self.target).execute(ctx).await
        }
        .instrument(span)
        .await
    }
}

/// Builder for [`Command`].
#[derive(Default)]
pub struct CommandBuilder {
    parts: TargetParts,
    names: Vec<String>,
    arguments: Vec<ArgumentSpec>,
    parser: Option<ArgumentParser>,
}

impl CommandBuilder {
    target_builder_methods!();

    /// Adds an invocation name. The first name is canonical.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Adds an alternative invocation name.
    pub fn alias(self, alias: impl Into<String>) -> Self {
        self.name(alias)
    }

    /// Adds several invocation names.
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares the next positional argument, cast with the process-wide
    /// type registry.
    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    /// Uses an explicit parser. Takes precedence over [`argument`](Self::argument).
    pub fn parser(mut self, parser: ArgumentParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Validates and builds the command.
    ///
    /// The id defaults to the first name; the names default to the id.
    pub fn build(mut self) -> BuildResult<Command> {
        check_not_blank(self.names.iter().chain(self.parts.id.iter()))?;

        let id = self
            .parts
            .id
            .take()
            .or_else(|| self.names.first().cloned())
            .ok_or(BuildError::MissingIdentity)?;
        if self.names.is_empty() {
            self.names.push(id.clone());
        }
        for (i, name) in self.names.iter().enumerate() {
            if self.names[..i].iter().any(|prev| prev.eq_ignore_ascii_case(name)) {
                return Err(BuildError::DuplicateName {
                    id,
                    name: name.clone(),
                });
            }
        }

        let handler = self
            .parts
            .handler
            .take()
            .ok_or_else(|| BuildError::MissingHandler { id: id.clone() })?;
        let exception_handlers = self.parts.build_exception_handlers(&id)?;

        let parser = match self.parser {
            Some(parser) => Some(Arc::new(parser)),
            None if !self.arguments.is_empty() => Some(Arc::new(ArgumentParser::new(self.arguments))),
            None => None,
        };

        let kind = TargetKind::Command {
            names: self.names,
            parser,
        };
        Ok(Command {
            target: Target::new(id, kind, self.parts.hooks, exception_handlers, handler),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ember_core::{TextPayload, Thrown};

    use crate::argument::ArgValue;

    #[test]
    fn test_identity_defaults() {
        let cmd = Command::builder()
            .name("ping")
            .alias("p")
            .handler(|_| async {})
            .build()
            .unwrap();
        assert_eq!(cmd.id(), "ping");
        assert_eq!(cmd.names(), ["ping", "p"]);

        let cmd = Command::builder().id("status").handler(|_| async {}).build().unwrap();
        assert_eq!(cmd.names(), ["status"]);
    }

    #[test]
    fn test_build_errors() {
        let err = Command::builder().handler(|_| async {}).build().unwrap_err();
        assert_eq!(err, BuildError::MissingIdentity);

        let err = Command::builder().name(" ").handler(|_| async {}).build().unwrap_err();
        assert_eq!(err, BuildError::BlankName);

        let err = Command::builder().name("ping").build().unwrap_err();
        assert_eq!(err, BuildError::MissingHandler { id: "ping".into() });

        let err = Command::builder()
            .name("ping")
            .alias("PING")
            .handler(|_| async {})
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateName {
                id: "ping".into(),
                name: "PING".into()
            }
        );
    }

    #[tokio::test]
    async fn test_call_parses_arguments() {
        let cmd = Command::builder()
            .name("roll")
            .argument(ArgumentSpec::new("sides").ty("int").default(6))
            .handler(|ctx| async move { ctx.arg("sides").and_then(|v| v.as_i64()).unwrap_or(0) })
            .build()
            .unwrap();

        let payload = TextPayload::new("!roll 20").boxed();
        let call = CallDescriptor::new("!", "roll").with_tokens(["20"]);
        assert!(cmd.call(payload, call, &Hooks::new(), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_parse_failure_routes_and_rejects() {
        let routed = Arc::new(AtomicUsize::new(0));
        let ran = Arc::new(AtomicUsize::new(0));

        let routed_clone = routed.clone();
        let ran_clone = ran.clone();
        let cmd = Command::builder()
            .name("echo")
            .argument(
                ArgumentSpec::new("text")
                    .ty("string")
                    .processor(|_| Err(Thrown::boxed("no echo allowed"))),
            )
            .on_error([ember_core::ExceptionFilter::of::<Thrown>()], move |_ctx, _err| {
                routed_clone.fetch_add(1, Ordering::SeqCst);
                async {}
            })
            .handler(move |_ctx| {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                async { ArgValue::Null.to_json() }
            })
            .build()
            .unwrap();

        let payload = TextPayload::new("!echo hi").boxed();
        let call = CallDescriptor::new("!", "echo").with_tokens(["hi"]);
        assert!(!cmd.call(payload, call, &Hooks::new(), None).await.unwrap());
        assert_eq!(routed.load(Ordering::SeqCst), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
