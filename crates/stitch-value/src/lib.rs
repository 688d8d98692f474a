//! Values flowing through hook bindings, and the dotted-path evaluator used to
//! turn them into diagnostic text.

#![forbid(unsafe_code)]

mod charset;
mod path;
mod template;
mod value;

pub use crate::charset::{decode_bytes, Charset};
pub use crate::path::{Directive, PathError, PathEvaluator, ValuePath};
pub use crate::template::{MessageContext, MessageTemplate, TemplatePart};
pub use crate::value::{zero_value, Introspect, Thrown, Value};
