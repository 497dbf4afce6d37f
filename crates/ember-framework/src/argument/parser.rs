//! The argument parser.

use tracing::trace;

use ember_core::{Payload, Resolver};

use super::definition::{ArgumentSpec, ProcessorInput};
use super::types::TypeRegistry;
use super::value::{ArgValue, Args};
use crate::context::CallDescriptor;
use crate::error::ParseFailure;

/// Turns the raw tokens of a command call into typed [`Args`].
///
/// Each declared argument consumes exactly one token, in declaration order:
///
/// 1. A missing token resolves to the argument's default.
/// 2. A present token runs through the processor chain. A chain that ends
///    in [`ArgValue::Null`] also resolves to the default.
/// 3. The processed value is cast with each declared type in turn; the
///    first non-null cast wins. If every cast yields null, or no type is
///    declared, the argument is null.
///
/// A processor or custom cast that fails aborts the parse with a
/// [`ParseFailure`].
#[derive(Debug, Clone)]
pub struct ArgumentParser {
    specs: Vec<ArgumentSpec>,
    types: TypeRegistry,
}

impl ArgumentParser {
    /// Creates a parser backed by the process-wide [`TypeRegistry`].
    pub fn new(specs: impl IntoIterator<Item = ArgumentSpec>) -> Self {
        Self::with_registry(specs, TypeRegistry::shared())
    }

    /// Creates a parser backed by an explicit [`TypeRegistry`].
    pub fn with_registry(specs: impl IntoIterator<Item = ArgumentSpec>, types: TypeRegistry) -> Self {
        Self {
            specs: specs.into_iter().collect(),
            types,
        }
    }

    pub fn specs(&self) -> &[ArgumentSpec] {
        &self.specs
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.types
    }

    /// Parses `call.tokens` against the declared arguments.
    pub async fn parse(
        &self,
        payload: &dyn Payload,
        call: &CallDescriptor,
        resolver: Option<&dyn Resolver>,
    ) -> Result<Args, ParseFailure> {
        let mut args = Args::new();
        for (index, spec) in self.specs.iter().enumerate() {
            let value = match call.tokens.get(index) {
                None => spec.default_value().resolve(payload, call),
                Some(token) => self
                    .parse_token(spec, token, payload, call, resolver)
                    .await
                    .map_err(|source| ParseFailure {
                        argument: spec.id().to_string(),
                        source,
                    })?,
            };
            trace!(argument = spec.id(), value = %value, "argument parsed");
            args.insert(spec.id(), value);
        }
        Ok(args)
    }

    async fn parse_token(
        &self,
        spec: &ArgumentSpec,
        token: &str,
        payload: &dyn Payload,
        call: &CallDescriptor,
        resolver: Option<&dyn Resolver>,
    ) -> Result<ArgValue, ember_core::BoxError> {
        let mut value = ArgValue::from(token);
        for processor in spec.processors() {
            value = processor(ProcessorInput {
                original: token,
                value: &value,
                payload,
                types: spec.type_tags(),
                call,
            })?;
        }

        if value.is_null() {
            return Ok(spec.default_value().resolve(payload, call));
        }

        for tag in spec.type_tags() {
            let cast = self.types.cast(tag, &value, payload, resolver).await?;
            if !cast.is_null() {
                return Ok(cast);
            }
        }
        Ok(ArgValue::Null)
    }
}
