use crate::annotation::Annotation;
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::reader::Reader;

const MAGIC: u32 = 0xCAFE_BABE;

/// The subset of a class file the weaver reads: identity, hierarchy, member
/// signatures and annotations. Code attributes are skipped.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal (slash-separated) names from here on.
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub signature: Option<String>,
    /// Visible and invisible annotations, in that order.
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?.to_owned();
        let super_class = match reader.read_u2()? {
            0 => None,
            index => Some(cp.get_class_name(index)?.to_owned()),
        };

        let interfaces_count = reader.read_u2()? as usize;
        let interfaces = (0..interfaces_count)
            .map(|_| Ok(cp.get_class_name(reader.read_u2()?)?.to_owned()))
            .collect::<Result<Vec<_>>>()?;

        let fields = read_members(&mut reader, &cp)?;
        let methods = read_members(&mut reader, &cp)?;
        let attrs = read_attributes(&mut reader, &cp)?;
        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: attrs.signature,
            annotations: attrs.annotations,
        })
    }
}

fn read_members(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<ClassMember>> {
    let count = reader.read_u2()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name = cp.get_utf8(reader.read_u2()?)?.to_owned();
        let descriptor = cp.get_utf8(reader.read_u2()?)?.to_owned();
        let attrs = read_attributes(reader, cp)?;
        members.push(ClassMember {
            access_flags,
            name,
            descriptor,
            signature: attrs.signature,
            annotations: attrs.annotations,
        });
    }
    Ok(members)
}

#[derive(Default)]
struct Attributes {
    signature: Option<String>,
    annotations: Vec<Annotation>,
}

fn read_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Attributes> {
    let count = reader.read_u2()? as usize;
    let mut attrs = Attributes::default();
    let mut invisible = Vec::new();
    for _ in 0..count {
        let name = cp.get_utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let mut body = Reader::new(reader.read_bytes(length)?);
        match name {
            "Signature" => {
                attrs.signature = Some(cp.get_utf8(body.read_u2()?)?.to_owned());
                body.ensure_empty()
                    .map_err(|_| Error::MalformedAttribute("Signature"))?;
            }
            "RuntimeVisibleAnnotations" => {
                attrs.annotations.extend(Annotation::parse_all(&mut body, cp)?);
            }
            "RuntimeInvisibleAnnotations" => {
                invisible.extend(Annotation::parse_all(&mut body, cp)?);
            }
            // Code, LineNumberTable, InnerClasses, ...
            _ => {}
        }
    }
    attrs.annotations.extend(invisible);
    Ok(attrs)
}
