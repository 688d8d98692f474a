use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A method or field descriptor that cannot be decoded.
///
/// Raised for unterminated reference / type-variable entries and unknown type
/// codes. Missing parentheses are tolerated by the lenient parsers and never
/// produce this error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed descriptor `{descriptor}`: {reason}")]
pub struct DescriptorFormatError {
    pub descriptor: String,
    pub reason: String,
}

impl DescriptorFormatError {
    pub(crate) fn new(descriptor: &str, reason: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.to_owned(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid classfile magic: 0x{0:08x}")]
    InvalidMagic(u32),
    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("invalid constant pool tag: {0}")]
    InvalidConstantPoolTag(u8),
    #[error("constant pool type mismatch at index {index}: expected {expected}, found {found}")]
    ConstantPoolTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid modified UTF-8 constant")]
    InvalidModifiedUtf8,
    #[error(transparent)]
    DescriptorFormat(#[from] DescriptorFormatError),
    #[error("invalid signature `{signature}`: {reason}")]
    InvalidSignature { signature: String, reason: String },
    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),
    #[error("{0} bytes left over after class file end")]
    TrailingBytes(usize),
}
