use std::fmt;

use crate::error::DescriptorFormatError;
use crate::generic::TypeMapping;

/// Erasure used when a type variable has no entry in the active mapping.
pub const OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'Z' => Primitive::Boolean,
            'B' => Primitive::Byte,
            'C' => Primitive::Char,
            'S' => Primitive::Short,
            'I' => Primitive::Int,
            'J' => Primitive::Long,
            'F' => Primitive::Float,
            'D' => Primitive::Double,
            _ => return None,
        })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Char => 'C',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(Primitive),
    /// Binary (dotted) name with generic arguments dropped.
    Object(String),
    Array(Box<FieldType>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => f.write_str(p.name()),
            FieldType::Object(name) => f.write_str(name),
            FieldType::Array(component) => write!(f, "{component}[]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("void"),
            ReturnType::Type(ty) => ty.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType, DescriptorFormatError> {
    let empty = TypeMapping::new();
    let mut scanner = Scanner::new(desc, 0, &empty);
    let ty = scanner.field_type()?;
    if !scanner.at_end() {
        return Err(DescriptorFormatError::new(desc, "trailing characters"));
    }
    Ok(ty)
}

/// Strict method descriptor parsing, used when reading class files.
pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor, DescriptorFormatError> {
    if !desc.starts_with('(') {
        return Err(DescriptorFormatError::new(desc, "missing opening parenthesis"));
    }
    let Some(close) = desc.find(')') else {
        return Err(DescriptorFormatError::new(desc, "missing closing parenthesis"));
    };

    let empty = TypeMapping::new();
    let mut scanner = Scanner::new(desc, 1, &empty);
    let mut params = Vec::new();
    while scanner.pos < close {
        params.push(scanner.field_type()?);
    }

    scanner.pos = close + 1;
    let return_type = if desc[scanner.pos..].starts_with('V') {
        scanner.pos += 1;
        ReturnType::Void
    } else {
        ReturnType::Type(scanner.field_type()?)
    };
    if !scanner.at_end() {
        return Err(DescriptorFormatError::new(desc, "trailing characters"));
    }

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

/// Parameter types of a descriptor or generic method signature, rendered as
/// semantic type names (`int`, `java.lang.String`, `byte[][]`).
///
/// Type variables are looked up in `mapping` and default to
/// `java.lang.Object` when absent. A missing descriptor, or one without a
/// complete parameter list, yields no parameters.
pub fn parse_parameter_types(
    desc: Option<&str>,
    mapping: &TypeMapping,
) -> Result<Vec<String>, DescriptorFormatError> {
    let Some(desc) = desc else {
        return Ok(Vec::new());
    };
    let Some(open) = desc.find('(') else {
        return Ok(Vec::new());
    };
    let Some(close) = desc[open..].find(')').map(|rel| open + rel) else {
        return Ok(Vec::new());
    };

    let mut scanner = Scanner::new(desc, open + 1, mapping);
    let mut params = Vec::new();
    while scanner.pos < close {
        params.push(scanner.field_type()?.to_string());
    }
    Ok(params)
}

/// Return type of a descriptor or generic method signature; `void` when the
/// descriptor is missing or has nothing after the parameter list.
pub fn parse_return_type(
    desc: Option<&str>,
    mapping: &TypeMapping,
) -> Result<String, DescriptorFormatError> {
    let Some(desc) = desc else {
        return Ok("void".to_owned());
    };
    let Some(close) = desc.find(')') else {
        return Ok("void".to_owned());
    };
    // A malformed parameter list poisons the whole descriptor.
    parse_parameter_types(Some(desc), mapping)?;
    let rest = &desc[close + 1..];
    if rest.is_empty() || rest.starts_with('V') {
        return Ok("void".to_owned());
    }
    let mut scanner = Scanner::new(desc, close + 1, mapping);
    Ok(scanner.field_type()?.to_string())
}

pub fn internal_to_binary(internal: &str) -> String {
    internal.replace('/', ".")
}

pub fn binary_to_internal(binary: &str) -> String {
    binary.replace('.', "/")
}

/// Descriptor encoding of a semantic type name: `java.lang.String[]` becomes
/// `[Ljava/lang/String;`, `int` becomes `I`.
pub fn encode_type_name(name: &str) -> String {
    let mut base = name;
    let mut dims = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        dims += 1;
    }
    let mut out = "[".repeat(dims);
    match (base, Primitive::from_name(base)) {
        ("void", _) => out.push('V'),
        (_, Some(primitive)) => out.push(primitive.code()),
        (_, None) => {
            out.push('L');
            out.push_str(&binary_to_internal(base));
            out.push(';');
        }
    }
    out
}

struct Scanner<'a> {
    desc: &'a str,
    pos: usize,
    mapping: &'a TypeMapping,
}

impl<'a> Scanner<'a> {
    fn new(desc: &'a str, pos: usize, mapping: &'a TypeMapping) -> Self {
        Self { desc, pos, mapping }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.desc.len()
    }

    fn peek(&self) -> Option<char> {
        self.desc.get(self.pos..)?.chars().next()
    }

    fn field_type(&mut self) -> Result<FieldType, DescriptorFormatError> {
        let Some(code) = self.peek() else {
            return Err(DescriptorFormatError::new(self.desc, "unexpected end of descriptor"));
        };
        self.pos += code.len_utf8();
        match code {
            '[' => Ok(FieldType::Array(Box::new(self.field_type()?))),
            'L' => self.reference(),
            'T' => self.type_variable(),
            _ => Primitive::from_code(code)
                .map(FieldType::Primitive)
                .ok_or_else(|| {
                    DescriptorFormatError::new(self.desc, format!("Invalid type code: {code}"))
                }),
        }
    }

    fn reference(&mut self) -> Result<FieldType, DescriptorFormatError> {
        let start = self.pos;
        let mut name = String::new();
        let mut after_type_args = false;
        loop {
            let Some(c) = self.peek() else {
                return Err(self.missing_semicolon(start));
            };
            match c {
                ';' => {
                    self.pos += 1;
                    return Ok(FieldType::Object(name));
                }
                '(' | ')' => return Err(self.missing_semicolon(start)),
                '<' => {
                    self.skip_type_arguments(start)?;
                    after_type_args = true;
                    continue;
                }
                '.' if after_type_args => name.push('$'),
                '/' => name.push('.'),
                other => name.push(other),
            }
            after_type_args = false;
            self.pos += c.len_utf8();
        }
    }

    fn skip_type_arguments(&mut self, start: usize) -> Result<(), DescriptorFormatError> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(self.missing_semicolon(start))
    }

    fn type_variable(&mut self) -> Result<FieldType, DescriptorFormatError> {
        let start = self.pos;
        let Some(len) = self.desc[start..].find([';', '(', ')', '<']) else {
            return Err(self.missing_semicolon(start));
        };
        if !self.desc[start + len..].starts_with(';') {
            return Err(self.missing_semicolon(start));
        }
        let name = &self.desc[start..start + len];
        self.pos = start + len + 1;
        let resolved = self.mapping.get(name).unwrap_or(OBJECT);
        Ok(FieldType::Object(resolved.to_owned()))
    }

    fn missing_semicolon(&self, start: usize) -> DescriptorFormatError {
        DescriptorFormatError::new(
            self.desc,
            format!("missing semicolon after `{}`", &self.desc[start..]),
        )
    }
}
