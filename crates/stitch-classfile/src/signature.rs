//! Generic signatures (`Signature` attribute) for classes, methods and fields.

use crate::descriptor::{internal_to_binary, Primitive, OBJECT};
use crate::error::{Error, Result};
use crate::generic::TypeMapping;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Primitive(Primitive),
    Class(ClassTypeSignature),
    Array(Box<TypeSignature>),
    TypeVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Internal name; inner classes of parameterized outers are joined with `$`.
    pub internal_name: String,
    /// Arguments of the innermost class segment.
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Any,
    Extends(TypeSignature),
    Super(TypeSignature),
    Exact(TypeSignature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<TypeSignature>,
    pub interface_bounds: Vec<TypeSignature>,
}

/// Structural form of a class `Signature` attribute.
///
/// `Default` is the "no generics" shape: no type parameters, no generic
/// supertypes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: Option<ClassTypeSignature>,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for `void`.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<TypeSignature>,
}

impl TypeSignature {
    /// Erased semantic type name, resolving type variables through `mapping`.
    pub fn erasure(&self, mapping: &TypeMapping) -> String {
        match self {
            TypeSignature::Primitive(p) => p.name().to_owned(),
            TypeSignature::Class(class) => class.binary_name(),
            TypeSignature::Array(component) => format!("{}[]", component.erasure(mapping)),
            TypeSignature::TypeVariable(name) => mapping.get(name).unwrap_or(OBJECT).to_owned(),
        }
    }
}

impl ClassTypeSignature {
    pub fn binary_name(&self) -> String {
        internal_to_binary(&self.internal_name)
    }
}

impl TypeParameter {
    /// Erasure of the leftmost bound, `java.lang.Object` when unbounded.
    pub fn erasure(&self, mapping: &TypeMapping) -> String {
        self.class_bound
            .iter()
            .chain(self.interface_bounds.iter())
            .next()
            .map(|bound| bound.erasure(mapping))
            .unwrap_or_else(|| OBJECT.to_owned())
    }
}

impl ClassSignature {
    /// Parses an optional class signature; a class without one has no generics.
    pub fn parse_optional(signature: Option<&str>) -> Result<Self> {
        match signature {
            Some(sig) => parse_class_signature(sig),
            None => Ok(Self::default()),
        }
    }

    /// The generic reference to `internal_name` among the declared supertypes.
    pub fn supertype(&self, internal_name: &str) -> Option<&ClassTypeSignature> {
        self.super_class
            .iter()
            .chain(self.interfaces.iter())
            .find(|sig| sig.internal_name == internal_name)
    }
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut p = SigParser::new(sig);
    let type_parameters = p.type_parameters_opt()?;
    let super_class = p.class_type()?;
    let mut interfaces = Vec::new();
    while !p.at_end() {
        interfaces.push(p.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        super_class: Some(super_class),
        interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut p = SigParser::new(sig);
    let type_parameters = p.type_parameters_opt()?;
    p.expect('(')?;
    let mut parameters = Vec::new();
    while p.peek() != Some(')') {
        parameters.push(p.type_signature()?);
    }
    p.expect(')')?;
    let return_type = if p.peek() == Some('V') {
        p.bump();
        None
    } else {
        Some(p.type_signature()?)
    };
    let mut throws = Vec::new();
    while p.peek() == Some('^') {
        p.bump();
        throws.push(p.reference_type()?);
    }
    p.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_field_signature(sig: &str) -> Result<TypeSignature> {
    let mut p = SigParser::new(sig);
    let ty = p.reference_type()?;
    p.finish()?;
    Ok(ty)
}

struct SigParser<'a> {
    sig: &'a str,
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn new(sig: &'a str) -> Self {
        Self { sig, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.sig.len()
    }

    fn peek(&self) -> Option<char> {
        self.sig.get(self.pos..)?.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected `{expected}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("trailing characters"))
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::InvalidSignature {
            signature: self.sig.to_owned(),
            reason: format!("{} at offset {}", reason.into(), self.pos),
        }
    }

    fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ';' | '<' | '>' | '.' | ':' | '/' | '[') {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.sig[start..self.pos])
    }

    fn type_parameters_opt(&mut self) -> Result<Vec<TypeParameter>> {
        if self.peek() != Some('<') {
            return Ok(Vec::new());
        }
        self.bump();
        let mut params = Vec::new();
        while self.peek() != Some('>') {
            if self.at_end() {
                return Err(self.error("unterminated type parameter list"));
            }
            let name = self.identifier()?.to_owned();
            self.expect(':')?;
            let class_bound = match self.peek() {
                Some('L' | '[' | 'T') => Some(self.reference_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.peek() == Some(':') {
                self.bump();
                interface_bounds.push(self.reference_type()?);
            }
            params.push(TypeParameter {
                name,
                class_bound,
                interface_bounds,
            });
        }
        self.expect('>')?;
        Ok(params)
    }

    fn type_signature(&mut self) -> Result<TypeSignature> {
        if let Some(primitive) = self.peek().and_then(Primitive::from_code) {
            self.bump();
            return Ok(TypeSignature::Primitive(primitive));
        }
        self.reference_type()
    }

    fn reference_type(&mut self) -> Result<TypeSignature> {
        match self.peek() {
            Some('L') => Ok(TypeSignature::Class(self.class_type()?)),
            Some('[') => {
                self.bump();
                Ok(TypeSignature::Array(Box::new(self.type_signature()?)))
            }
            Some('T') => {
                self.bump();
                let name = self.identifier()?.to_owned();
                self.expect(';')?;
                Ok(TypeSignature::TypeVariable(name))
            }
            Some(c) => Err(self.error(format!("unexpected `{c}` in reference type"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect('L')?;
        let mut internal_name = String::new();
        loop {
            internal_name.push_str(self.identifier()?);
            if self.peek() == Some('/') {
                self.bump();
                internal_name.push('/');
            } else {
                break;
            }
        }
        let mut type_arguments = self.type_arguments_opt()?;
        while self.peek() == Some('.') {
            self.bump();
            internal_name.push('$');
            internal_name.push_str(self.identifier()?);
            type_arguments = self.type_arguments_opt()?;
        }
        self.expect(';')?;
        Ok(ClassTypeSignature {
            internal_name,
            type_arguments,
        })
    }

    fn type_arguments_opt(&mut self) -> Result<Vec<TypeArgument>> {
        if self.peek() != Some('<') {
            return Ok(Vec::new());
        }
        self.bump();
        let mut args = Vec::new();
        loop {
            let arg = match self.peek() {
                Some('>') => break,
                Some('*') => {
                    self.bump();
                    TypeArgument::Any
                }
                Some('+') => {
                    self.bump();
                    TypeArgument::Extends(self.reference_type()?)
                }
                Some('-') => {
                    self.bump();
                    TypeArgument::Super(self.reference_type()?)
                }
                _ => TypeArgument::Exact(self.reference_type()?),
            };
            args.push(arg);
        }
        self.expect('>')?;
        Ok(args)
    }
}
