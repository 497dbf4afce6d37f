//! Declarative argument parsing.
//!
//! A command declares its positional arguments as an ordered list of
//! [`ArgumentSpec`]s. When the command is called, the [`ArgumentParser`]
//! consumes one raw token per argument, runs it through the argument's
//! processors, and casts the result with its fallback list of type tags. Casting
//! is looked up in a [`TypeRegistry`]:
//!
//! - built-in tags (`string`, `int`, `float`, `whole`, `decimal`, `url`,
//!   `date`, `color`, `boolean`, ...), see [`cast`],
//! - platform entity tags (`user`, `member`, `role`, `textChannel`, ...)
//!   which delegate to the injected [`Resolver`](ember_core::Resolver),
//! - custom tags registered at runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_framework::argument::{ArgumentParser, ArgumentSpec};
//!
//! let parser = ArgumentParser::new([
//!     ArgumentSpec::new("member").ty("member"),
//!     ArgumentSpec::new("days").types(["whole"]).default(7),
//!     ArgumentSpec::new("reason").ty("string").default("no reason given"),
//! ]);
//! ```

pub mod cast;
mod definition;
mod parser;
mod types;
mod value;

pub use cast::{BUILTIN_TAGS, BuiltinCast, cast_builtin};
pub use definition::{ArgDefault, ArgumentSpec, DefaultFn, ProcessorFn, ProcessorInput};
pub use parser::ArgumentParser;
pub use types::{CastFn, TypeRegistry};
pub use value::{ArgValue, Args};
