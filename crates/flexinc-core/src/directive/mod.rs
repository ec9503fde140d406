//! Directive input: markup parsing, typed options and invocation context.
//!
//! A directive is the text inside the host's include tag:
//!
//! ```text
//! <filename-or-command> [key=value ...]
//! ```
//!
//! [`Directive::parse`] splits it, [`RenderOptions::from_directive`] validates
//! the options once, and [`IncludeContext`] carries the document location and
//! variable scope supplied by the host.

mod args;
mod context;
mod options;

pub use args::{Directive, OptionValue};
pub use context::{IncludeContext, SourceLocation, VariableScope};
pub use options::{LineRange, RenderOptions};
