use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One `[[advice]]` declaration: a pointcut plus the hooks it binds.
///
/// Empty pattern strings mean "no constraint". Hook *code* is registered by
/// the host under [`AdviceConfig::name`]; this record only says which hooks
/// exist and what each one is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct AdviceConfig {
    /// Unique name; also the key hook implementations are registered under.
    pub name: String,

    /// Class name pattern: exact name, `*` wildcards, `|` alternation or
    /// `/regex/`.
    #[serde(default)]
    pub class_name: String,

    /// Annotation the class (or an ancestor declaring the method) must carry.
    #[serde(default)]
    pub class_annotation: String,

    /// Only instrument calls whose receiver is this type or a subtype.
    #[serde(default)]
    pub sub_type_restriction: String,

    /// Only instrument methods defined on (or inherited unmodified from) this
    /// supertype.
    #[serde(default)]
    pub super_type_restriction: String,

    /// Method name pattern; `<init>` selects constructors.
    #[serde(default)]
    pub method_name: String,

    #[serde(default)]
    pub method_annotation: String,

    /// Per-position parameter type patterns. `*` matches any one parameter and
    /// a final `..` any number of trailing ones. Absent means any parameters.
    #[serde(default)]
    pub method_parameter_types: Option<Vec<String>>,

    /// Return type the method's declared return type must be assignable to. A
    /// trailing `.` restricts to a package prefix instead.
    #[serde(default)]
    pub method_return_type: String,

    #[serde(default)]
    pub method_modifiers: Vec<MethodModifier>,

    /// Advices sharing a nesting group are suppressed inside an active join
    /// point of the same group on the same thread.
    #[serde(default)]
    pub nesting_group: String,

    /// Lower runs first.
    #[serde(default)]
    pub priority: i32,

    /// Tie-breaker for equal priorities, compared lexicographically.
    #[serde(default)]
    pub tag: String,

    /// May be replaced at runtime without restarting the host.
    #[serde(default)]
    pub reweavable: bool,

    /// Initial value of the advice's dynamic enablement flag.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Declared type of the value the before-hook produces, e.g. `long` or
    /// `com.acme.Timer`.
    #[serde(default)]
    pub traveler_type: Option<String>,

    #[serde(default)]
    pub hooks: HookBindings,
}

fn default_true() -> bool {
    true
}

impl AdviceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: String::new(),
            class_annotation: String::new(),
            sub_type_restriction: String::new(),
            super_type_restriction: String::new(),
            method_name: String::new(),
            method_annotation: String::new(),
            method_parameter_types: None,
            method_return_type: String::new(),
            method_modifiers: Vec::new(),
            nesting_group: String::new(),
            priority: 0,
            tag: String::new(),
            reweavable: false,
            enabled: true,
            traveler_type: None,
            hooks: HookBindings::default(),
        }
    }
}

/// Which hooks an advice declares, each with the arguments it is bound to.
///
/// `None` means the hook is not declared; `Some(vec![])` declares a hook that
/// takes no arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct HookBindings {
    #[serde(default)]
    pub is_enabled: Option<Vec<Binding>>,
    #[serde(default)]
    pub before: Option<Vec<Binding>>,
    #[serde(default)]
    pub on_return: Option<Vec<Binding>>,
    #[serde(default)]
    pub on_throw: Option<Vec<Binding>>,
    #[serde(default)]
    pub after: Option<Vec<Binding>>,
}

/// A binding directive for one hook argument.
///
/// In TOML, unit directives are plain strings and parameters are tables:
/// `before = ["receiver", { parameter = 0 }, "method_name"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Receiver,
    Parameter(usize),
    ParameterArray,
    Traveler,
    Return,
    OptionalReturn,
    Throwable,
    MethodName,
    ClassMeta,
    MethodMeta,
}

/// Required (`static`) or forbidden (`not_static`) method modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MethodModifier {
    Public,
    Protected,
    Private,
    PackagePrivate,
    Static,
    NotStatic,
    Final,
    NotFinal,
    Synchronized,
    NotSynchronized,
}
