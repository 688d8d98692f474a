//! Dotted-path navigation over [`Value`] graphs.
//!
//! A path such as `request.headers.0.name` is resolved one segment at a time.
//! Host objects are asked for a bean accessor (`getName`, `isName`, `name`)
//! before falling back to a field of the same name. Collections understand
//! `size` / `length`, numeric indexes and `*`; any other segment applied to a
//! collection is mapped over its elements.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::charset::{decode_bytes, Charset};
use crate::value::{Thrown, Value};

/// A parsed path expression. Parsing is total: any text yields a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
    segments: Vec<String>,
    directive: Option<Directive>,
}

/// Formatting applied to the evaluated value when it is rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Render byte arrays as text decoded with the named charset.
    Charset(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("<error evaluating: {}>", describe(.0))]
    Evaluation(Thrown),
    /// A numeric path segment past the end of an array, list or map.
    ///
    /// Renders as `<requested index out of bounds: N>`. Out-of-range argument
    /// roots in message templates render `<requested arg index out of bounds: N>`
    /// instead; see `MessageTemplate`.
    #[error("<requested index out of bounds: {0}>")]
    IndexOutOfBounds(usize),
}

fn describe(thrown: &Thrown) -> String {
    match &thrown.message {
        Some(message) => format!("{} {}", thrown.type_name, message),
        None => thrown.type_name.clone(),
    }
}

impl ValuePath {
    pub fn parse(text: &str) -> Self {
        let (path, directive) = match text.split_once('|') {
            Some((path, directive)) => (path, parse_directive(directive)),
            None => (text, None),
        };
        let segments = path
            .split('.')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        Self {
            segments,
            directive,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn directive(&self) -> Option<&Directive> {
        self.directive.as_ref()
    }

    /// The empty path evaluates to its root.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn parse_directive(text: &str) -> Option<Directive> {
    let text = text.trim();
    match text.split_once(':') {
        Some((name, arg)) if name.trim() == "charset" => Some(Directive::Charset(arg.trim().to_owned())),
        _ => {
            tracing::debug!(target: "stitch.value", directive = text, "ignoring unknown path directive");
            None
        }
    }
}

/// How a segment is read from objects of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Accessor {
    Method(String),
    Field,
    Missing,
}

/// Evaluates [`ValuePath`]s, caching accessor lookups per (type, segment).
#[derive(Debug, Default)]
pub struct PathEvaluator {
    accessors: RwLock<HashMap<(String, String), Accessor>>,
}

static SHARED: Lazy<PathEvaluator> = Lazy::new(PathEvaluator::default);

impl PathEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide evaluator used by message templates.
    pub fn shared() -> &'static PathEvaluator {
        &SHARED
    }

    /// Drops every cached accessor, e.g. after host classes were redefined.
    pub fn clear_cache(&self) {
        self.accessors.write().clear();
    }

    /// Evaluates `path` against `root`, rendering failures as placeholder text.
    pub fn evaluate(&self, root: &Value, path: &ValuePath) -> Value {
        self.try_evaluate(root, path)
            .unwrap_or_else(|err| Value::Str(err.to_string()))
    }

    pub fn try_evaluate(&self, root: &Value, path: &ValuePath) -> Result<Value, PathError> {
        self.walk(root.clone(), &path.segments)
    }

    /// Evaluates and renders as text, honoring the path's directive.
    pub fn render(&self, root: &Value, path: &ValuePath) -> String {
        match self.try_evaluate(root, path) {
            Ok(value) => render_value(&value, path.directive()),
            Err(err) => err.to_string(),
        }
    }

    fn walk(&self, current: Value, segments: &[String]) -> Result<Value, PathError> {
        let Some((segment, rest)) = segments.split_first() else {
            return Ok(current);
        };

        match &current {
            Value::Null => Ok(Value::Null),
            Value::Map(entries) => match entries.get(segment) {
                Some(value) => self.walk(value.clone(), rest),
                None if is_size(segment) => self.walk(Value::Int(entries.len() as i64), rest),
                None => Ok(Value::Null),
            },
            Value::Object(obj) => match self.accessor(obj.type_name(), segment, |name| {
                lookup_accessor(name, |method| obj.has_method(method), |field| obj.has_field(field))
            }) {
                Accessor::Method(method) => {
                    let value = obj.call(&method).map_err(PathError::Evaluation)?;
                    self.walk(value, rest)
                }
                Accessor::Field => self.walk(obj.field(segment).unwrap_or_default(), rest),
                Accessor::Missing => match obj.elements() {
                    Some(items) => self.walk_collection(items, segment, rest),
                    None => {
                        tracing::debug!(
                            target: "stitch.value",
                            type_name = obj.type_name(),
                            segment = %segment,
                            "no accessor or field for path segment"
                        );
                        Ok(Value::Null)
                    }
                },
            },
            Value::Str(s) if is_size(segment) => {
                self.walk(Value::Int(s.chars().count() as i64), rest)
            }
            Value::List(_) | Value::Bytes(_) => {
                let items = current.elements().unwrap_or_default();
                self.walk_collection(items, segment, rest)
            }
            _ => Ok(Value::Null),
        }
    }

    fn walk_collection(
        &self,
        items: Vec<Value>,
        segment: &str,
        rest: &[String],
    ) -> Result<Value, PathError> {
        if is_size(segment) {
            return self.walk(Value::Int(items.len() as i64), rest);
        }
        if segment == "*" {
            return items
                .into_iter()
                .map(|item| self.walk(item, rest))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List);
        }
        if let Ok(index) = segment.parse::<usize>() {
            let item = items
                .into_iter()
                .nth(index)
                .ok_or(PathError::IndexOutOfBounds(index))?;
            return self.walk(item, rest);
        }

        // A property of a collection is the property of each element.
        let mut segments = Vec::with_capacity(rest.len() + 1);
        segments.push(segment.to_owned());
        segments.extend_from_slice(rest);
        items
            .into_iter()
            .map(|item| self.walk(item, &segments))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn accessor(
        &self,
        type_name: &str,
        segment: &str,
        resolve: impl FnOnce(&str) -> Accessor,
    ) -> Accessor {
        let key = (type_name.to_owned(), segment.to_owned());
        if let Some(accessor) = self.accessors.read().get(&key) {
            return accessor.clone();
        }
        let accessor = resolve(segment);
        self.accessors
            .write()
            .entry(key)
            .or_insert(accessor)
            .clone()
    }
}

fn lookup_accessor(
    name: &str,
    has_method: impl Fn(&str) -> bool,
    has_field: impl Fn(&str) -> bool,
) -> Accessor {
    let capitalized = capitalize(name);
    let candidates = [format!("get{capitalized}"), format!("is{capitalized}"), name.to_owned()];
    if let Some(method) = candidates.into_iter().find(|method| has_method(method)) {
        return Accessor::Method(method);
    }
    if has_field(name) {
        return Accessor::Field;
    }
    Accessor::Missing
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_size(segment: &str) -> bool {
    segment == "size" || segment == "length"
}

/// Renders a value as message text. Byte arrays are hex unless a charset
/// directive says otherwise.
pub(crate) fn render_value(value: &Value, directive: Option<&Directive>) -> String {
    match (value, directive) {
        (Value::Bytes(bytes), Some(Directive::Charset(name))) => match Charset::from_name(name) {
            Some(charset) => decode_bytes(bytes, charset),
            None => format!("<unsupported charset: {name}>"),
        },
        (Value::List(items), Some(_)) => {
            let rendered: Vec<_> = items.iter().map(|item| render_value(item, directive)).collect();
            format!("[{}]", rendered.join(", "))
        }
        _ => value.to_string(),
    }
}
