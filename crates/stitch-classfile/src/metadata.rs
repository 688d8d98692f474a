use std::fmt;

use crate::classfile::{ClassFile, ClassMember};
use crate::descriptor::{internal_to_binary, parse_method_descriptor};
use crate::error::Result;
use crate::signature::ClassSignature;

/// JVM access flags shared by classes and methods.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    pub const STATIC: Modifiers = Modifiers(0x0008);
    pub const FINAL: Modifiers = Modifiers(0x0010);
    pub const SYNCHRONIZED: Modifiers = Modifiers(0x0020);
    pub const BRIDGE: Modifiers = Modifiers(0x0040);
    pub const VARARGS: Modifiers = Modifiers(0x0080);
    pub const NATIVE: Modifiers = Modifiers(0x0100);
    pub const INTERFACE: Modifiers = Modifiers(0x0200);
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);
    pub const SYNTHETIC: Modifiers = Modifiers(0x1000);
    pub const ANNOTATION: Modifiers = Modifiers(0x2000);
    pub const ENUM: Modifiers = Modifiers(0x4000);

    pub const fn from_bits(bits: u16) -> Self {
        Modifiers(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.union(rhs)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({:#06x})", self.0)
    }
}

/// Per-class facts the matcher needs. Names are binary (dotted).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub modifiers: Modifiers,
    /// Annotation type names declared on the class.
    pub annotations: Vec<String>,
    pub generic: Option<ClassSignature>,
    pub methods: Vec<MethodMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodMetadata {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub modifiers: Modifiers,
    pub annotations: Vec<String>,
}

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: Some("java.lang.Object".to_owned()),
            interfaces: Vec::new(),
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
            generic: None,
            methods: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_classfile(&ClassFile::parse(bytes)?)
    }

    pub fn from_classfile(class: &ClassFile) -> Result<Self> {
        let generic = match class.signature.as_deref() {
            Some(sig) => Some(crate::signature::parse_class_signature(sig)?),
            None => None,
        };
        let methods = class
            .methods
            .iter()
            .map(MethodMetadata::from_member)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: internal_to_binary(&class.this_class),
            super_name: class.super_class.as_deref().map(internal_to_binary),
            interfaces: class.interfaces.iter().map(|i| internal_to_binary(i)).collect(),
            modifiers: Modifiers::from_bits(class.access_flags),
            annotations: class
                .annotations
                .iter()
                .map(|a| a.type_name.clone())
                .collect(),
            generic,
            methods,
        })
    }

    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Sets the generic declaration from a class `Signature` attribute.
    pub fn with_signature(mut self, signature: &str) -> Result<Self> {
        self.generic = Some(crate::signature::parse_class_signature(signature)?);
        Ok(self)
    }

    pub fn with_method(mut self, method: MethodMetadata) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodMetadata> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

impl MethodMetadata {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
        }
    }

    fn from_member(member: &ClassMember) -> Result<Self> {
        parse_method_descriptor(&member.descriptor)?;
        Ok(Self {
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
            signature: member.signature.clone(),
            modifiers: Modifiers::from_bits(member.access_flags),
            annotations: member
                .annotations
                .iter()
                .map(|a| a.type_name.clone())
                .collect(),
        })
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    /// Whether another class can inherit (and so override) this method.
    pub fn is_inheritable(&self) -> bool {
        !self.is_static()
            && !self.modifiers.contains(Modifiers::PRIVATE)
            && self.name != CONSTRUCTOR_NAME
            && self.name != STATIC_INITIALIZER_NAME
    }

    /// Has a body the weaver may instrument: not abstract, native, bridge or
    /// synthetic, and not a static initializer.
    pub fn is_weavable(&self) -> bool {
        !self.modifiers.contains(Modifiers::ABSTRACT)
            && !self.modifiers.contains(Modifiers::NATIVE)
            && !self.modifiers.contains(Modifiers::BRIDGE)
            && !self.modifiers.contains(Modifiers::SYNTHETIC)
            && self.name != STATIC_INITIALIZER_NAME
    }
}
