use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    MemberRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Second slot of a `Long` / `Double` entry, and slot zero.
    Unusable,
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::MemberRef { .. } => "MemberRef",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
            CpInfo::Unusable => "Unusable",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(CpInfo::Unusable);

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    CpInfo::Utf8(decode_modified_utf8(reader.read_bytes(len)?)?)
                }
                3 => CpInfo::Integer(reader.read_u4()? as i32),
                4 => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
                5 => CpInfo::Long(reader.read_u8()? as i64),
                6 => CpInfo::Double(f64::from_bits(reader.read_u8()?)),
                7 => CpInfo::Class {
                    name_index: reader.read_u2()?,
                },
                8 => CpInfo::String {
                    string_index: reader.read_u2()?,
                },
                9..=11 => CpInfo::MemberRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => CpInfo::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => CpInfo::MethodHandle {
                    kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => CpInfo::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 | 18 => CpInfo::Dynamic {
                    bootstrap_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                19 => CpInfo::Module {
                    name_index: reader.read_u2()?,
                },
                20 => CpInfo::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };
            let wide = matches!(entry, CpInfo::Long(_) | CpInfo::Double(_));
            entries.push(entry);
            if wide {
                entries.push(CpInfo::Unusable);
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.entries.get(index as usize) {
            Some(CpInfo::Unusable) | None => Err(Error::InvalidConstantPoolIndex(index)),
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8(value) => Ok(value),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
                found: other.kind(),
            }),
        }
    }

    /// Internal (slash-separated) name of a `Class` entry.
    pub(crate) fn get_class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Class { name_index } => self.get_utf8(*name_index),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
                found: other.kind(),
            }),
        }
    }
}

/// Decodes the JVM's "modified UTF-8": NUL is two bytes and supplementary
/// characters are encoded as surrogate pairs of three bytes each.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, i + 1)?;
            units.push(((b0 & 0x1F) << 6) | b1);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, i + 1)?;
            let b2 = continuation(bytes, i + 2)?;
            units.push(((b0 & 0x0F) << 12) | (b1 << 6) | b2);
            i += 3;
        } else {
            return Err(Error::InvalidModifiedUtf8);
        }
    }
    String::from_utf16(&units).map_err(|_| Error::InvalidModifiedUtf8)
}

fn continuation(bytes: &[u8], index: usize) -> Result<u16> {
    match bytes.get(index) {
        Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(Error::InvalidModifiedUtf8),
    }
}
