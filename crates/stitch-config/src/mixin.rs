use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A `[[mixin]]` declaration: per-instance state and capability interfaces
/// attached to every class matching one of `targets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct MixinConfig {
    pub name: String,

    /// Class or interface name patterns; `@com.acme.Ann` selects classes
    /// carrying that annotation.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Capability interfaces the target classes gain.
    #[serde(default)]
    pub interfaces: Vec<String>,

    /// Mixin fields and their declared types. Fields start at the zero value
    /// of their type.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Whether the host registered an init hook for this mixin.
    #[serde(default)]
    pub init: bool,
}

/// A `[[shim]]` declaration: a stateless facade whose methods delegate to
/// differently-named members of the target type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ShimConfig {
    pub name: String,

    /// The facade interface.
    pub interface: String,

    #[serde(default)]
    pub targets: Vec<String>,

    /// Facade method name to target member name.
    #[serde(default)]
    pub methods: BTreeMap<String, String>,
}
