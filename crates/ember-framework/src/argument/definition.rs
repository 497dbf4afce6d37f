//! Argument declarations.

use std::fmt;
use std::sync::Arc;

use ember_core::{BoxError, Payload};

use super::value::ArgValue;
use crate::context::CallDescriptor;

/// Computes a default from the payload and the call descriptor.
pub type DefaultFn = Arc<dyn Fn(&dyn Payload, &CallDescriptor) -> ArgValue + Send + Sync>;

/// A processor step. Returning `Err` is a thrown value.
pub type ProcessorFn =
    Arc<dyn for<'a> Fn(ProcessorInput<'a>) -> Result<ArgValue, BoxError> + Send + Sync>;

/// What an argument falls back to when its token is absent or processes to null.
#[derive(Clone, Default)]
pub enum ArgDefault {
    /// Fall back to [`ArgValue::Null`].
    #[default]
    None,
    /// A literal value.
    Value(ArgValue),
    /// A value computed at parse time.
    Resolver(DefaultFn),
}

impl ArgDefault {
    /// Produces the default value for one parse.
    pub fn resolve(&self, payload: &dyn Payload, call: &CallDescriptor) -> ArgValue {
        match self {
            Self::None => ArgValue::Null,
            Self::Value(value) => value.clone(),
            Self::Resolver(f) => f(payload, call),
        }
    }
}

impl fmt::Debug for ArgDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// The input handed to each processor in a chain.
#[derive(Clone, Copy)]
pub struct ProcessorInput<'a> {
    /// The raw token, untouched by earlier processors.
    pub original: &'a str,
    /// The running value, as returned by the previous processor.
    pub value: &'a ArgValue,
    pub payload: &'a dyn Payload,
    /// The argument's declared type tags.
    pub types: &'a [String],
    pub call: &'a CallDescriptor,
}

/// The declaration of one positional argument.
///
/// # Example
///
/// ```rust,ignore
/// use ember_framework::argument::{ArgValue, ArgumentSpec};
///
/// let amount = ArgumentSpec::new("amount")
///     .types(["float", "int"])
///     .default(1)
///     .processor(|input| Ok(ArgValue::from(input.original.trim_end_matches('x'))));
/// ```
#[derive(Clone)]
pub struct ArgumentSpec {
    id: String,
    types: Vec<String>,
    default: ArgDefault,
    processors: Vec<ProcessorFn>,
}

impl ArgumentSpec {
    /// Declares an argument with no type, no default and no processors.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: Vec::new(),
            default: ArgDefault::None,
            processors: Vec::new(),
        }
    }

    /// Appends one type tag to the fallback list.
    pub fn ty(mut self, tag: impl Into<String>) -> Self {
        self.types.push(tag.into());
        self
    }

    /// Appends several type tags to the fallback list, in order.
    pub fn types<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets a literal default.
    pub fn default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = ArgDefault::Value(value.into());
        self
    }

    /// Sets a computed default.
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Payload, &CallDescriptor) -> ArgValue + Send + Sync + 'static,
    {
        self.default = ArgDefault::Resolver(Arc::new(f));
        self
    }

    /// Appends a processor to the chain.
    pub fn processor<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(ProcessorInput<'a>) -> Result<ArgValue, BoxError> + Send + Sync + 'static,
    {
        self.processors.push(Arc::new(f));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_tags(&self) -> &[String] {
        &self.types
    }

    pub fn default_value(&self) -> &ArgDefault {
        &self.default
    }

    pub(crate) fn processors(&self) -> &[ProcessorFn] {
        &self.processors
    }
}

impl fmt::Debug for ArgumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSpec")
            .field("id", &self.id)
            .field("types", &self.types)
            .field("default", &self.default)
            .field("processors", &self.processors.len())
            .finish()
    }
}
