use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value seen by hooks: method arguments, receivers, return values and
/// travelers.
///
/// Host objects that are not plain data are exposed through [`Introspect`].
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn Introspect>),
}

/// Reflective view of a host object.
///
/// `has_method` / `has_field` answers depend only on the object's type, so the
/// path evaluator caches them per `type_name`.
pub trait Introspect: Send + Sync {
    fn type_name(&self) -> &str;

    /// Whether a zero-argument method called `name` exists.
    fn has_method(&self, name: &str) -> bool;

    /// Invokes a zero-argument method.
    fn call(&self, name: &str) -> Result<Value, Thrown>;

    fn has_field(&self, _name: &str) -> bool {
        false
    }

    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Elements when the object is a collection or array.
    fn elements(&self) -> Option<Vec<Value>> {
        None
    }

    /// Text used when the object itself ends up in a message.
    fn render(&self) -> String {
        self.type_name().to_owned()
    }
}

/// An exception raised by instrumented code or by a hook.
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown {
    /// Binary name of the exception class, e.g. `java.lang.IllegalStateException`.
    pub type_name: String,
    pub message: Option<String>,
}

impl Thrown {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: Some(message.into()),
        }
    }

    pub fn without_message(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: None,
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.type_name, message),
            None => f.write_str(&self.type_name),
        }
    }
}

impl std::error::Error for Thrown {}

/// The default value of a declared type: `0` for numeric primitives, `false`
/// for `boolean`, `'\0'` for `char` and `null` for reference types.
pub fn zero_value(type_name: &str) -> Value {
    match type_name {
        "byte" | "short" | "int" | "long" => Value::Int(0),
        "float" | "double" => Value::Float(0.0),
        "boolean" => Value::Bool(false),
        "char" => Value::Char('\0'),
        _ => Value::Null,
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn object(object: impl Introspect + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Elements when the value behaves as a collection.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.clone()),
            Value::Bytes(bytes) => Some(bytes.iter().map(|b| Value::Int(i64::from(*b as i8))).collect()),
            Value::Object(obj) => obj.elements(),
            _ => None,
        }
    }

    /// Runtime type name, using Java names for the primitive wrappers.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "java.lang.Boolean",
            Value::Int(_) => "java.lang.Long",
            Value::Float(_) => "java.lang.Double",
            Value::Char(_) => "java.lang.Character",
            Value::Str(_) => "java.lang.String",
            Value::Bytes(_) => "byte[]",
            Value::List(_) => "java.util.List",
            Value::Map(_) => "java.util.Map",
            Value::Object(obj) => obj.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(bytes) => f.write_str(&hex::encode(bytes)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => f.write_str(&obj.render()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Bytes(b) => f.debug_tuple("Bytes").field(&hex::encode(b)).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(&obj.type_name()).finish(),
        }
    }
}

/// Structural equality; host objects compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
