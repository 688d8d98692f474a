//! Mixins (per-instance state and capability interfaces attached to target
//! classes) and shims (stateless facades that rename members).

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use stitch_classfile::ClassMetadata;
use stitch_config::{MixinConfig, ShimConfig};
use stitch_value::{zero_value, Thrown, Value};

use crate::advice::MixinInitFn;
use crate::error::{Result, WeaveError};
use crate::pattern::NamePattern;
use crate::universe::TypeUniverse;

#[derive(Debug, Clone)]
enum Target {
    Name(NamePattern),
    Annotation(NamePattern),
}

impl Target {
    fn parse(text: &str) -> Result<Self> {
        match text.trim().strip_prefix('@') {
            Some(annotation) => NamePattern::parse(annotation).map(Target::Annotation),
            None => NamePattern::parse(text).map(Target::Name),
        }
    }

    fn matches(&self, class: &ClassMetadata) -> bool {
        match self {
            Target::Name(pattern) => pattern.matches(&class.name),
            Target::Annotation(pattern) => class.annotations.iter().any(|ann| pattern.matches(ann)),
        }
    }

    fn matches_name(&self, name: &str) -> bool {
        match self {
            Target::Name(pattern) => pattern.matches(name),
            Target::Annotation(_) => false,
        }
    }
}

/// Whether `class`, or any of its supertypes, is selected by `targets`.
fn selects(targets: &[Target], universe: &TypeUniverse, class: &ClassMetadata) -> bool {
    if targets.iter().any(|t| t.matches(class)) {
        return true;
    }
    universe.ancestors(&class.name).iter().any(|ancestor| match universe.get(ancestor) {
        Some(meta) => targets.iter().any(|t| t.matches(&meta)),
        None => targets.iter().any(|t| t.matches_name(ancestor)),
    })
}

pub struct MixinType {
    config: MixinConfig,
    targets: Vec<Target>,
    init: Option<MixinInitFn>,
}

impl MixinType {
    pub fn new(config: MixinConfig, init: Option<MixinInitFn>) -> Result<Self> {
        if config.init && init.is_none() {
            return Err(WeaveError::MissingMixinInit(config.name.clone()));
        }
        let targets = config
            .targets
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| Target::parse(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            config,
            targets,
            init,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn interfaces(&self) -> &[String] {
        &self.config.interfaces
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.config.fields
    }

    /// Whether instances of `class` carry this mixin. Interfaces never do;
    /// the state lives in concrete classes.
    pub fn applies_to(&self, universe: &TypeUniverse, class: &ClassMetadata) -> bool {
        !class.is_interface() && selects(&self.targets, universe, class)
    }
}

impl std::fmt::Debug for MixinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixinType")
            .field("config", &self.config)
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// Mixin state of one host object.
pub struct MixinInstance {
    mixin: Arc<MixinType>,
    fields: Mutex<BTreeMap<String, Value>>,
    initialized: AtomicBool,
    /// Held while the init hook runs; the flag marks "init in progress" so
    /// member access from inside the hook does not re-enter it.
    init_lock: ReentrantMutex<Cell<bool>>,
}

impl MixinInstance {
    pub fn new(mixin: Arc<MixinType>) -> Self {
        let fields = mixin
            .fields()
            .iter()
            .map(|(name, ty)| (name.clone(), zero_value(ty)))
            .collect();
        Self {
            mixin,
            fields: Mutex::new(fields),
            initialized: AtomicBool::new(false),
            init_lock: ReentrantMutex::new(Cell::new(false)),
        }
    }

    pub fn mixin(&self) -> &MixinType {
        &self.mixin
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Runs the init hook if it has not run yet. Concurrent first accesses
    /// wait for one initializer; calls from inside the hook return at once.
    pub fn ensure_initialized(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        let guard = self.init_lock.lock();
        if self.initialized.load(Ordering::Acquire) || guard.get() {
            return;
        }
        guard.set(true);
        if let Some(init) = &self.mixin.init {
            if let Err(thrown) = init(self) {
                tracing::warn!(
                    target: "stitch.weaver",
                    mixin = %self.mixin.name(),
                    error = %thrown,
                    "mixin init hook threw; fields keep their current values"
                );
            }
        }
        self.initialized.store(true, Ordering::Release);
        guard.set(false);
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.ensure_initialized();
        self.fields.lock().get(field).cloned()
    }

    /// Stores a declared field. Returns `false` for undeclared names.
    pub fn set(&self, field: &str, value: Value) -> bool {
        self.ensure_initialized();
        match self.fields.lock().get_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// All mixin state of one host object, one instance per mixin however many
/// ways the object's class reaches it.
#[derive(Default)]
pub struct InstanceMixins {
    instances: Vec<MixinInstance>,
}

impl InstanceMixins {
    pub fn new(mixins: &[Arc<MixinType>]) -> Self {
        let mut instances: Vec<MixinInstance> = Vec::new();
        for mixin in mixins {
            if instances.iter().any(|i| i.mixin.name() == mixin.name()) {
                continue;
            }
            instances.push(MixinInstance::new(Arc::clone(mixin)));
        }
        Self { instances }
    }

    pub fn get(&self, mixin: &str) -> Option<&MixinInstance> {
        self.instances.iter().find(|i| i.mixin.name() == mixin)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[derive(Debug)]
pub struct ShimType {
    config: ShimConfig,
    targets: Vec<Target>,
}

impl ShimType {
    pub fn new(config: ShimConfig) -> Result<Self> {
        let targets = config
            .targets
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| Target::parse(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, targets })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn interface(&self) -> &str {
        &self.config.interface
    }

    pub fn applies_to(&self, universe: &TypeUniverse, class: &ClassMetadata) -> bool {
        selects(&self.targets, universe, class)
    }

    /// The target member a facade method delegates to.
    pub fn target_member(&self, facade_method: &str) -> Option<&str> {
        self.config.methods.get(facade_method).map(String::as_str)
    }
}

/// A shim bound to one target object.
pub struct ShimAdapter {
    shim: Arc<ShimType>,
    target: Value,
}

impl ShimAdapter {
    pub fn new(shim: Arc<ShimType>, target: Value) -> Self {
        Self { shim, target }
    }

    pub fn shim(&self) -> &ShimType {
        &self.shim
    }

    /// Calls a facade method. Unmapped methods, and targets lacking the
    /// mapped member, raise `AbstractMethodError` like an unimplemented
    /// interface method would.
    pub fn call(&self, facade_method: &str) -> std::result::Result<Value, Thrown> {
        let abstract_method = || {
            Thrown::new(
                "java.lang.AbstractMethodError",
                format!("{}.{facade_method}", self.shim.interface()),
            )
        };
        let member = self.shim.target_member(facade_method).ok_or_else(abstract_method)?;
        match &self.target {
            Value::Null => Err(Thrown::without_message("java.lang.NullPointerException")),
            Value::Object(object) if object.has_method(member) => object.call(member),
            Value::Object(object) if object.has_field(member) => {
                Ok(object.field(member).unwrap_or_default())
            }
            _ => Err(abstract_method()),
        }
    }
}
