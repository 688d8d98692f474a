//! Resolution of generic type variables across an inheritance chain.
//!
//! Pointcut matching compares against the concrete types a subclass binds,
//! not the formal type variables of the class that declares a method. A
//! [`TypeMapping`] carries those bindings; it is built by pairing a
//! supertype's declared type parameters with the type arguments the subject
//! class supplies in its `extends` / `implements` clause.

use std::collections::BTreeMap;

use crate::descriptor::{binary_to_internal, encode_type_name, parse_parameter_types, parse_return_type};
use crate::error::Result;
use crate::metadata::MethodMetadata;
use crate::signature::{parse_method_signature, ClassSignature, TypeArgument, TypeParameter};

/// Type-variable name to concrete (binary, erased) type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    entries: BTreeMap<String, String>,
}

impl TypeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.entries.get(variable).map(String::as_str)
    }

    pub fn insert(&mut self, variable: impl Into<String>, concrete: impl Into<String>) {
        self.entries.insert(variable.into(), concrete.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Bindings for the type parameters of `supertype` as seen from `subject`.
    ///
    /// `inherited` holds the bindings already known for `subject`'s own type
    /// parameters (from a class further down the chain); parameters it does
    /// not cover fall back to the erasure of their bound. Wildcard arguments
    /// leave the parameter unbound.
    pub fn for_supertype(
        subject: &ClassSignature,
        supertype_name: &str,
        supertype: &ClassSignature,
        inherited: &TypeMapping,
    ) -> TypeMapping {
        let Some(reference) = subject.supertype(&binary_to_internal(supertype_name)) else {
            return TypeMapping::new();
        };

        let mut scope = inherited.clone();
        for param in &subject.type_parameters {
            if scope.get(&param.name).is_none() {
                let erased = param.erasure(inherited);
                scope.insert(param.name.clone(), erased);
            }
        }

        let mut mapping = TypeMapping::new();
        for (param, arg) in supertype
            .type_parameters
            .iter()
            .zip(reference.type_arguments.iter())
        {
            match arg {
                TypeArgument::Exact(ty) | TypeArgument::Extends(ty) => {
                    mapping.insert(param.name.clone(), ty.erasure(&scope));
                }
                TypeArgument::Super(_) | TypeArgument::Any => {}
            }
        }
        mapping
    }

    /// Extends the mapping with a generic method's own type parameters, which
    /// shadow class-level variables of the same name.
    pub fn with_method_type_parameters(&self, params: &[TypeParameter]) -> TypeMapping {
        let mut scoped = self.clone();
        for param in params {
            scoped.insert(param.name.clone(), param.erasure(self));
        }
        scoped
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TypeMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = TypeMapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// The direct superclass of a subject, with its own generic declaration.
#[derive(Debug, Clone, Copy)]
pub struct SuperclassInfo<'a> {
    /// Binary (dotted) name.
    pub name: &'a str,
    pub signature: &'a ClassSignature,
}

pub fn build_type_mapping(subject: &ClassSignature, superclass: &SuperclassInfo<'_>) -> TypeMapping {
    TypeMapping::for_supertype(subject, superclass.name, superclass.signature, &TypeMapping::new())
}

/// Rewrites every mapped `T<name>;` in `signature` to the concrete type's
/// descriptor encoding. `None` stays `None`.
pub fn resolve_method_signature(
    signature: Option<&str>,
    subject: &ClassSignature,
    superclass: &SuperclassInfo<'_>,
) -> Option<String> {
    let signature = signature?;
    let mapping = build_type_mapping(subject, superclass);
    Some(substitute_type_variables(signature, &mapping))
}

pub fn resolve_parameter_types(
    method: &MethodMetadata,
    subject: &ClassSignature,
    superclass: &SuperclassInfo<'_>,
) -> Result<Vec<String>> {
    resolve_parameter_types_with(method, &build_type_mapping(subject, superclass))
}

pub fn resolve_return_type(
    method: &MethodMetadata,
    subject: &ClassSignature,
    superclass: &SuperclassInfo<'_>,
) -> Result<String> {
    resolve_return_type_with(method, &build_type_mapping(subject, superclass))
}

pub fn resolve_parameter_types_with(
    method: &MethodMetadata,
    mapping: &TypeMapping,
) -> Result<Vec<String>> {
    match method_scope(method, mapping) {
        Some((signature, scoped)) => Ok(parse_parameter_types(Some(signature), &scoped)?),
        None => Ok(parse_parameter_types(Some(&method.descriptor), mapping)?),
    }
}

pub fn resolve_return_type_with(method: &MethodMetadata, mapping: &TypeMapping) -> Result<String> {
    match method_scope(method, mapping) {
        Some((signature, scoped)) => Ok(parse_return_type(Some(signature), &scoped)?),
        None => Ok(parse_return_type(Some(&method.descriptor), mapping)?),
    }
}

/// The generic signature to read and the mapping to read it with, or `None`
/// when the erased descriptor already says everything.
fn method_scope<'m>(
    method: &'m MethodMetadata,
    mapping: &TypeMapping,
) -> Option<(&'m str, TypeMapping)> {
    let signature = method.signature.as_deref()?;
    let own_params = match parse_method_signature(signature) {
        Ok(parsed) => parsed.type_parameters,
        Err(err) => {
            tracing::debug!(
                target: "stitch.classfile",
                method = %method.name,
                error = %err,
                "unreadable method signature; using descriptor"
            );
            return None;
        }
    };
    if mapping.is_empty() && own_params.is_empty() {
        return None;
    }
    Some((signature, mapping.with_method_type_parameters(&own_params)))
}

/// Grammar-aware textual substitution: only `T<name>;` entries in type
/// position are rewritten, never a `T` inside a class name.
pub fn substitute_type_variables(signature: &str, mapping: &TypeMapping) -> String {
    let mut rewriter = Rewriter {
        sig: signature,
        pos: 0,
        out: String::with_capacity(signature.len()),
        mapping,
    };
    rewriter.signature();
    if rewriter.pos < signature.len() {
        let rest = &signature[rewriter.pos..];
        rewriter.out.push_str(rest);
    }
    rewriter.out
}

struct Rewriter<'a> {
    sig: &'a str,
    pos: usize,
    out: String,
    mapping: &'a TypeMapping,
}

impl Rewriter<'_> {
    fn peek(&self) -> Option<char> {
        self.sig.get(self.pos..)?.chars().next()
    }

    fn copy(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.out.push(c);
        self.pos += c.len_utf8();
        Some(c)
    }

    fn signature(&mut self) -> Option<()> {
        if self.peek()? == '<' {
            self.copy();
            while self.peek()? != '>' {
                while self.peek()? != ':' {
                    self.copy();
                }
                while self.peek()? == ':' {
                    self.copy();
                    if matches!(self.peek()?, 'L' | 'T' | '[') {
                        self.ty()?;
                    }
                }
            }
            self.copy();
        }
        if self.peek()? == '(' {
            self.copy();
            while self.peek()? != ')' {
                self.ty()?;
            }
            self.copy();
            self.ty()?;
            while self.peek()? == '^' {
                self.copy();
                self.ty()?;
            }
        } else {
            while self.peek().is_some() {
                self.ty()?;
            }
        }
        Some(())
    }

    fn ty(&mut self) -> Option<()> {
        match self.peek()? {
            'L' => {
                self.copy();
                loop {
                    match self.copy()? {
                        ';' => return Some(()),
                        '<' => {
                            while self.peek()? != '>' {
                                match self.peek()? {
                                    '*' => {
                                        self.copy();
                                    }
                                    '+' | '-' => {
                                        self.copy();
                                        self.ty()?;
                                    }
                                    _ => self.ty()?,
                                }
                            }
                            self.copy();
                        }
                        _ => {}
                    }
                }
            }
            'T' => {
                let start = self.pos + 1;
                let len = self.sig[start..].find(';')?;
                let name = &self.sig[start..start + len];
                match self.mapping.get(name) {
                    Some(concrete) => self.out.push_str(&encode_type_name(concrete)),
                    None => self.out.push_str(&self.sig[self.pos..=start + len]),
                }
                self.pos = start + len + 1;
                Some(())
            }
            '[' => {
                self.copy();
                self.ty()
            }
            _ => {
                self.copy();
                Some(())
            }
        }
    }
}
