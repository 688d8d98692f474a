//! Advices: a declaration from config paired with the host's hook code.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stitch_config::{AdviceConfig, Binding};
use stitch_value::{Thrown, Value};

use crate::error::{Result, WeaveError};
use crate::matcher::Pointcut;
use crate::meta::{ClassMeta, MethodMeta};
use crate::ordering::AdviceOrderKey;

/// Hook code. Receives the bound arguments in declaration order; a return- or
/// before-hook may produce a value (replacement return value or traveler).
pub type HookFn = Arc<dyn Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    IsEnabled,
    Before,
    OnReturn,
    OnThrow,
    After,
}

impl HookKind {
    pub const ALL: [HookKind; 5] = [
        HookKind::IsEnabled,
        HookKind::Before,
        HookKind::OnReturn,
        HookKind::OnThrow,
        HookKind::After,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::IsEnabled => "is_enabled",
            HookKind::Before => "before",
            HookKind::OnReturn => "on_return",
            HookKind::OnThrow => "on_throw",
            HookKind::After => "after",
        }
    }

    fn accepts(self, binding: Binding) -> bool {
        match binding {
            Binding::Traveler => matches!(self, HookKind::OnReturn | HookKind::OnThrow | HookKind::After),
            Binding::Return | Binding::OptionalReturn => self == HookKind::OnReturn,
            Binding::Throwable => self == HookKind::OnThrow,
            _ => true,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a method invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Returned {
    Void,
    Value(Value),
}

impl Returned {
    pub fn value(&self) -> Value {
        match self {
            Returned::Void => Value::Null,
            Returned::Value(value) => value.clone(),
        }
    }
}

/// One argument handed to a hook.
#[derive(Debug, Clone)]
pub enum BoundArg {
    Value(Value),
    OptionalReturn(Returned),
    Throwable(Thrown),
    ClassMeta(Arc<ClassMeta>),
    MethodMeta(Arc<MethodMeta>),
}

impl BoundArg {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            BoundArg::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Hook implementations for one advice, registered by the host.
#[derive(Clone, Default)]
pub struct HookImpls {
    hooks: HashMap<HookKind, HookFn>,
}

impl HookImpls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        kind: HookKind,
        hook: impl Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.insert(kind, Arc::new(hook));
        self
    }

    pub fn is_enabled(
        self,
        hook: impl Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.with(HookKind::IsEnabled, hook)
    }

    pub fn before(
        self,
        hook: impl Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.with(HookKind::Before, hook)
    }

    pub fn on_return(
        self,
        hook: impl Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.with(HookKind::OnReturn, hook)
    }

    pub fn on_throw(
        self,
        hook: impl Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.with(HookKind::OnThrow, hook)
    }

    pub fn after(
        self,
        hook: impl Fn(&[BoundArg]) -> std::result::Result<Option<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.with(HookKind::After, hook)
    }

    pub fn get(&self, kind: HookKind) -> Option<&HookFn> {
        self.hooks.get(&kind)
    }
}

impl fmt::Debug for HookImpls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.hooks.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("HookImpls").field("hooks", &kinds).finish()
    }
}

/// Initializer for a mixin instance.
pub type MixinInitFn =
    Arc<dyn Fn(&crate::mixin::MixinInstance) -> std::result::Result<(), Thrown> + Send + Sync>;

/// Host-registered code, keyed by advice or mixin name.
#[derive(Default)]
pub struct HookCatalog {
    advices: HashMap<String, HookImpls>,
    mixin_inits: HashMap<String, MixinInitFn>,
}

impl HookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, advice: impl Into<String>, hooks: HookImpls) -> &mut Self {
        self.advices.insert(advice.into(), hooks);
        self
    }

    pub fn register_mixin_init(
        &mut self,
        mixin: impl Into<String>,
        init: impl Fn(&crate::mixin::MixinInstance) -> std::result::Result<(), Thrown> + Send + Sync + 'static,
    ) -> &mut Self {
        self.mixin_inits.insert(mixin.into(), Arc::new(init));
        self
    }

    pub fn hooks(&self, advice: &str) -> Option<&HookImpls> {
        self.advices.get(advice)
    }

    pub fn mixin_init(&self, mixin: &str) -> Option<&MixinInitFn> {
        self.mixin_inits.get(mixin)
    }
}

/// A declared hook with its code.
#[derive(Clone)]
pub struct Hook {
    pub bindings: Vec<Binding>,
    pub(crate) func: HookFn,
}

impl Hook {
    pub(crate) fn call(&self, args: &[BoundArg]) -> std::result::Result<Option<Value>, Thrown> {
        (self.func)(args)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("bindings", &self.bindings).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Advice {
    config: AdviceConfig,
    pointcut: Pointcut,
    order: AdviceOrderKey,
    hooks: HashMap<HookKind, Hook>,
    enabled: AtomicBool,
}

impl Advice {
    /// Pairs a declaration with its hook code.
    ///
    /// Every declared hook needs an implementation and may only bind what its
    /// phase can supply. Implementations for undeclared hooks are ignored.
    pub fn new(config: AdviceConfig, impls: &HookImpls) -> Result<Self> {
        let pointcut = Pointcut::from_config(&config)?;
        let mut hooks = HashMap::new();
        for kind in HookKind::ALL {
            let declared = declared_bindings(&config, kind);
            match (declared, impls.get(kind)) {
                (Some(bindings), Some(func)) => {
                    if let Some(binding) = bindings.iter().find(|b| !kind.accepts(**b)) {
                        return Err(WeaveError::InvalidBinding {
                            advice: config.name.clone(),
                            kind,
                            binding: *binding,
                        });
                    }
                    hooks.insert(
                        kind,
                        Hook {
                            bindings: bindings.clone(),
                            func: Arc::clone(func),
                        },
                    );
                }
                (Some(_), None) => {
                    return Err(WeaveError::MissingHook {
                        advice: config.name.clone(),
                        kind,
                    })
                }
                (None, Some(_)) => {
                    tracing::debug!(
                        target: "stitch.weaver",
                        advice = %config.name,
                        hook = %kind,
                        "hook implementation without declaration; ignored"
                    );
                }
                (None, None) => {}
            }
        }

        Ok(Self {
            order: AdviceOrderKey::new(config.priority, config.tag.clone()),
            enabled: AtomicBool::new(config.enabled),
            pointcut,
            hooks,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AdviceConfig {
        &self.config
    }

    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }

    pub fn order_key(&self) -> &AdviceOrderKey {
        &self.order
    }

    pub fn hook(&self, kind: HookKind) -> Option<&Hook> {
        self.hooks.get(&kind)
    }

    /// Declared hooks in phase order.
    pub fn hook_kinds(&self) -> Vec<HookKind> {
        HookKind::ALL
            .into_iter()
            .filter(|kind| self.hooks.contains_key(kind))
            .collect()
    }

    pub fn nesting_group(&self) -> Option<&str> {
        let group = self.config.nesting_group.trim();
        (!group.is_empty()).then_some(group)
    }

    pub fn traveler_type(&self) -> &str {
        self.config.traveler_type.as_deref().unwrap_or("java.lang.Object")
    }

    pub fn is_reweavable(&self) -> bool {
        self.config.reweavable
    }

    /// The dynamic enablement flag. Flips become visible to later
    /// invocations eventually; in-flight ones may still see the old value.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

fn declared_bindings(config: &AdviceConfig, kind: HookKind) -> Option<&Vec<Binding>> {
    let hooks = &config.hooks;
    match kind {
        HookKind::IsEnabled => hooks.is_enabled.as_ref(),
        HookKind::Before => hooks.before.as_ref(),
        HookKind::OnReturn => hooks.on_return.as_ref(),
        HookKind::OnThrow => hooks.on_throw.as_ref(),
        HookKind::After => hooks.after.as_ref(),
    }
}
