use stitch_classfile::DescriptorFormatError;
use stitch_config::Binding;
use thiserror::Error;

use crate::advice::HookKind;

pub type Result<T, E = WeaveError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeaveError {
    #[error(transparent)]
    Classfile(#[from] stitch_classfile::Error),
    #[error("unknown class `{0}`")]
    UnknownClass(String),
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("advice `{advice}` declares a {kind} hook but no implementation is registered")]
    MissingHook { advice: String, kind: HookKind },
    #[error("advice `{advice}` cannot bind {binding:?} in its {kind} hook")]
    InvalidBinding {
        advice: String,
        kind: HookKind,
        binding: Binding,
    },
    #[error("mixin `{0}` declares an init hook but no implementation is registered")]
    MissingMixinInit(String),
}

impl From<DescriptorFormatError> for WeaveError {
    fn from(err: DescriptorFormatError) -> Self {
        WeaveError::Classfile(err.into())
    }
}
