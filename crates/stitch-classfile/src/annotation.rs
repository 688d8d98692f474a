use crate::constant_pool::{ConstantPool, CpInfo};
use crate::descriptor::internal_to_binary;
use crate::error::{Error, Result};
use crate::reader::Reader;

/// A class or method annotation as declared in the class file.
///
/// Only what pointcut predicates need is kept: the annotation type and its
/// element values. Nested annotations and arrays are preserved structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Binary (dotted) name of the annotation type, e.g. `javax.inject.Named`.
    pub type_name: String,
    pub elements: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Enum { type_name: String, constant: String },
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl Annotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            elements: Vec::new(),
        }
    }

    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find_map(|(element, value)| (element == name).then_some(value))
    }

    pub(crate) fn parse_all(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<Self>> {
        let count = reader.read_u2()? as usize;
        (0..count).map(|_| Self::parse(reader, cp)).collect()
    }

    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?;
        let type_name = descriptor_type_name(type_descriptor)?;
        let pairs = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(pairs);
        for _ in 0..pairs {
            let name = cp.get_utf8(reader.read_u2()?)?.to_owned();
            elements.push((name, read_element_value(reader, cp)?));
        }
        Ok(Self {
            type_name,
            elements,
        })
    }
}

fn descriptor_type_name(descriptor: &str) -> Result<String> {
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .map(internal_to_binary)
        .ok_or(Error::MalformedAttribute("RuntimeVisibleAnnotations"))
}

fn read_element_value(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ElementValue> {
    let tag = reader.read_u1()?;
    let value = match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' => {
            let index = reader.read_u2()?;
            let CpInfo::Integer(raw) = cp.get(index)? else {
                return Err(mismatch(cp, index, "Integer"));
            };
            match tag {
                b'Z' => ElementValue::Boolean(*raw != 0),
                b'C' => ElementValue::Char(
                    char::from_u32(*raw as u32)
                        .ok_or(Error::MalformedAttribute("RuntimeVisibleAnnotations"))?,
                ),
                _ => ElementValue::Int(*raw),
            }
        }
        b'J' => {
            let index = reader.read_u2()?;
            match cp.get(index)? {
                CpInfo::Long(v) => ElementValue::Long(*v),
                _ => return Err(mismatch(cp, index, "Long")),
            }
        }
        b'F' => {
            let index = reader.read_u2()?;
            match cp.get(index)? {
                CpInfo::Float(v) => ElementValue::Float(*v),
                _ => return Err(mismatch(cp, index, "Float")),
            }
        }
        b'D' => {
            let index = reader.read_u2()?;
            match cp.get(index)? {
                CpInfo::Double(v) => ElementValue::Double(*v),
                _ => return Err(mismatch(cp, index, "Double")),
            }
        }
        b's' => ElementValue::String(cp.get_utf8(reader.read_u2()?)?.to_owned()),
        b'e' => {
            let type_name = descriptor_type_name(cp.get_utf8(reader.read_u2()?)?)?;
            let constant = cp.get_utf8(reader.read_u2()?)?.to_owned();
            ElementValue::Enum {
                type_name,
                constant,
            }
        }
        b'c' => ElementValue::Class(cp.get_utf8(reader.read_u2()?)?.to_owned()),
        b'@' => ElementValue::Annotation(Box::new(Annotation::parse(reader, cp)?)),
        b'[' => {
            let len = reader.read_u2()? as usize;
            let values = (0..len)
                .map(|_| read_element_value(reader, cp))
                .collect::<Result<Vec<_>>>()?;
            ElementValue::Array(values)
        }
        _ => return Err(Error::MalformedAttribute("RuntimeVisibleAnnotations")),
    };
    Ok(value)
}

fn mismatch(cp: &ConstantPool, index: u16, expected: &'static str) -> Error {
    Error::ConstantPoolTypeMismatch {
        index,
        expected,
        found: cp.get(index).map(CpInfo::kind).unwrap_or("Unusable"),
    }
}
