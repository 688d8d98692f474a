//! Class-file metadata for the stitch weaver: raw class-file reading, method
//! descriptors, generic signatures and type-variable resolution.

#![forbid(unsafe_code)]

mod annotation;
mod classfile;
mod constant_pool;
mod descriptor;
mod error;
mod generic;
mod metadata;
mod reader;
mod signature;

pub use crate::annotation::{Annotation, ElementValue};
pub use crate::classfile::{ClassFile, ClassMember};
pub use crate::descriptor::{
    binary_to_internal, encode_type_name, internal_to_binary, parse_field_descriptor,
    parse_method_descriptor, parse_parameter_types, parse_return_type, FieldType,
    MethodDescriptor, Primitive, ReturnType, OBJECT,
};
pub use crate::error::{DescriptorFormatError, Error, Result};
pub use crate::generic::{
    build_type_mapping, resolve_method_signature, resolve_parameter_types,
    resolve_parameter_types_with, resolve_return_type, resolve_return_type_with,
    substitute_type_variables, SuperclassInfo, TypeMapping,
};
pub use crate::metadata::{
    ClassMetadata, MethodMetadata, Modifiers, CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME,
};
pub use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    ClassTypeSignature, MethodSignature, TypeArgument, TypeParameter, TypeSignature,
};
