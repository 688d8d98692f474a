use std::sync::Arc;

use parking_lot::RwLock;
use stitch_classfile::ClassMetadata;
use stitch_config::StitchConfig;
use stitch_value::{Thrown, Value};

use crate::advice::{Advice, HookCatalog, Returned};
use crate::error::{Result, WeaveError};
use crate::invoke::{Invocation, Protocol};
use crate::joinpoint::{ClassJoinPoints, JoinPoint, JoinPointKind};
use crate::matcher::{MethodView, PointcutMatcher};
use crate::meta::MetaCache;
use crate::mixin::{InstanceMixins, MixinType, ShimAdapter, ShimType};
use crate::once_map::OnceMap;
use crate::ordering::sort_advices;
use crate::plan::{CodeEmitter, WeavePlan};
use crate::universe::TypeUniverse;

/// The weaving engine: registered advices, mixins and shims, the type
/// universe, and the caches derived from them.
pub struct Weaver {
    universe: TypeUniverse,
    advices: RwLock<Vec<Arc<Advice>>>,
    mixins: Vec<Arc<MixinType>>,
    shims: Vec<Arc<ShimType>>,
    join_points: OnceMap<String, Arc<ClassJoinPoints>>,
    meta: MetaCache,
}

impl Weaver {
    pub fn new(advices: Vec<Advice>, mixins: Vec<MixinType>, shims: Vec<ShimType>) -> Self {
        Self {
            universe: TypeUniverse::new(),
            advices: RwLock::new(advices.into_iter().map(Arc::new).collect()),
            mixins: mixins.into_iter().map(Arc::new).collect(),
            shims: shims.into_iter().map(Arc::new).collect(),
            join_points: OnceMap::new(),
            meta: MetaCache::default(),
        }
    }

    /// Builds a weaver from declarations plus registered hook code.
    ///
    /// Declarations that cannot be used (no hook code, bad patterns,
    /// duplicate names) are logged and skipped.
    pub fn from_config(config: &StitchConfig, catalog: &HookCatalog) -> Self {
        let mut advices: Vec<Advice> = Vec::new();
        for declaration in &config.advice {
            if advices.iter().any(|a| a.name() == declaration.name) {
                tracing::warn!(target: "stitch.weaver", advice = %declaration.name, "duplicate advice name; skipped");
                continue;
            }
            let Some(hooks) = catalog.hooks(&declaration.name) else {
                tracing::warn!(target: "stitch.weaver", advice = %declaration.name, "no hooks registered; skipped");
                continue;
            };
            match Advice::new(declaration.clone(), hooks) {
                Ok(advice) => {
                    tracing::info!(
                        target: "stitch.weaver",
                        advice = %advice.name(),
                        priority = advice.order_key().priority,
                        reweavable = advice.is_reweavable(),
                        "registered advice"
                    );
                    advices.push(advice);
                }
                Err(err) => {
                    tracing::warn!(target: "stitch.weaver", advice = %declaration.name, error = %err, "advice skipped");
                }
            }
        }

        let mut mixins = Vec::new();
        for declaration in &config.mixin {
            let init = catalog.mixin_init(&declaration.name).cloned();
            match MixinType::new(declaration.clone(), init) {
                Ok(mixin) => mixins.push(mixin),
                Err(err) => {
                    tracing::warn!(target: "stitch.weaver", mixin = %declaration.name, error = %err, "mixin skipped");
                }
            }
        }

        let mut shims = Vec::new();
        for declaration in &config.shim {
            match ShimType::new(declaration.clone()) {
                Ok(shim) => shims.push(shim),
                Err(err) => {
                    tracing::warn!(target: "stitch.weaver", shim = %declaration.name, error = %err, "shim skipped");
                }
            }
        }

        Self::new(advices, mixins, shims)
    }

    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    pub fn advices(&self) -> Vec<Arc<Advice>> {
        self.advices.read().clone()
    }

    pub fn advice(&self, name: &str) -> Option<Arc<Advice>> {
        self.advices.read().iter().find(|a| a.name() == name).cloned()
    }

    /// Flips an advice's dynamic enablement flag. Returns `false` when no
    /// advice has that name.
    pub fn set_advice_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.advice(name) {
            Some(advice) => {
                advice.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Makes a loaded class known. Replacing a class invalidates it and
    /// everything below it.
    pub fn register_class(&self, class: ClassMetadata) -> Arc<ClassMetadata> {
        let replacing = self.universe.contains(&class.name);
        let name = class.name.clone();
        let class = self.universe.register(class);
        if replacing {
            self.invalidate(&name);
        }
        class
    }

    pub fn register_class_bytes(&self, bytes: &[u8]) -> Result<Arc<ClassMetadata>> {
        Ok(self.register_class(ClassMetadata::from_bytes(bytes)?))
    }

    /// The join points of a registered class, computed once.
    pub fn join_points_for(&self, class: &str) -> Result<Arc<ClassJoinPoints>> {
        self.join_points
            .get_or_try_init(&class.to_owned(), || self.compute_join_points(class).map(Arc::new))
    }

    /// The join point an invocation of `name` + `descriptor` on an instance
    /// of `class` goes through, if any.
    ///
    /// An inherited method without an override of its own resolves to the
    /// join point of the class that declares it; the same `Arc` is returned
    /// for every subclass.
    pub fn resolve_join_point(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<Arc<JoinPoint>>> {
        if let Some(join_point) = self.join_points_for(class)?.get(name, descriptor) {
            return Ok(Some(Arc::clone(join_point)));
        }
        let Some(method) = self.universe.method_ref(class, name, descriptor) else {
            return Ok(None);
        };
        if method.owner_name() == class {
            return Ok(None);
        }
        Ok(self
            .join_points_for(method.owner_name())?
            .get(name, descriptor)
            .cloned())
    }

    fn compute_join_points(&self, class_name: &str) -> Result<ClassJoinPoints> {
        let class = self
            .universe
            .get(class_name)
            .ok_or_else(|| WeaveError::UnknownClass(class_name.to_owned()))?;
        let advices = self.advices();
        let matcher = PointcutMatcher::new(&self.universe);
        let effective = self.universe.effective_methods(class_name);

        let mut join_points = Vec::new();
        for method in effective.iter() {
            let metadata = method.method();
            if !metadata.is_weavable() {
                continue;
            }
            let declared_here = method.owner_name() == class.name;
            let view = matcher.view(&class, method)?;
            let mut selected = select(&matcher, &advices, &class, &view)?;
            if selected.is_empty() {
                continue;
            }

            let kind = if declared_here {
                JoinPointKind::Declared
            } else {
                // Advices that already select the method where it is declared
                // run there; only the rest need an override here.
                let owner_view = matcher.view(&method.owner, method)?;
                let at_owner = select(&matcher, &advices, &method.owner, &owner_view)?;
                selected.retain(|advice| !at_owner.iter().any(|a| Arc::ptr_eq(a, advice)));
                if selected.is_empty() {
                    continue;
                }
                JoinPointKind::InheritedOverride
            };

            sort_advices(&mut selected);
            tracing::debug!(
                target: "stitch.weaver",
                class = %class.name,
                method = %metadata.name,
                descriptor = %metadata.descriptor,
                ?kind,
                advices = selected.len(),
                "join point"
            );
            join_points.push(Arc::new(JoinPoint {
                class_name: class.name.clone(),
                owner: method.owner_name().to_owned(),
                method: metadata.clone(),
                kind,
                parameter_types: view.parameter_types,
                return_type: view.return_type,
                advices: selected,
            }));
        }
        Ok(ClassJoinPoints::new(class_name, join_points))
    }

    /// Mixins carried by instances of `class`, each once.
    pub fn mixins_for(&self, class: &str) -> Vec<Arc<MixinType>> {
        let Some(meta) = self.universe.get(class) else {
            return Vec::new();
        };
        self.mixins
            .iter()
            .filter(|mixin| mixin.applies_to(&self.universe, &meta))
            .cloned()
            .collect()
    }

    pub fn shims_for(&self, class: &str) -> Vec<Arc<ShimType>> {
        let Some(meta) = self.universe.get(class) else {
            return Vec::new();
        };
        self.shims
            .iter()
            .filter(|shim| shim.applies_to(&self.universe, &meta))
            .cloned()
            .collect()
    }

    /// Fresh mixin state for a new instance of `class`.
    pub fn instance_mixins(&self, class: &str) -> InstanceMixins {
        InstanceMixins::new(&self.mixins_for(class))
    }

    pub fn shim(&self, name: &str, target: Value) -> Option<ShimAdapter> {
        self.shims
            .iter()
            .find(|shim| shim.name() == name)
            .map(|shim| ShimAdapter::new(Arc::clone(shim), target))
    }

    /// The injection plan for a registered class.
    pub fn plan_class(&self, class: &str) -> Result<WeavePlan> {
        let meta = self
            .universe
            .get(class)
            .ok_or_else(|| WeaveError::UnknownClass(class.to_owned()))?;
        let join_points = self.join_points_for(class)?;
        let mut plan = WeavePlan::from_join_points(&join_points);

        let inherited: Vec<Arc<MixinType>> = meta
            .super_name
            .as_deref()
            .map(|super_name| self.mixins_for(super_name))
            .unwrap_or_default();
        plan.mixins = self
            .mixins_for(class)
            .into_iter()
            .filter(|mixin| !inherited.iter().any(|m| Arc::ptr_eq(m, mixin)))
            .map(|mixin| mixin.name().to_owned())
            .collect();
        plan.shims = self
            .shims_for(class)
            .into_iter()
            .map(|shim| shim.name().to_owned())
            .collect();
        Ok(plan)
    }

    /// Registers raw class bytes and plans them. Any failure leaves the class
    /// unwoven: it is logged and `None` is returned.
    pub fn plan_class_bytes(&self, bytes: &[u8]) -> Option<WeavePlan> {
        let class = match self.register_class_bytes(bytes) {
            Ok(class) => class,
            Err(err) => {
                tracing::warn!(target: "stitch.weaver", error = %err, "unreadable class; left unwoven");
                return None;
            }
        };
        match self.plan_class(&class.name) {
            Ok(plan) if plan.is_empty() => None,
            Ok(plan) => Some(plan),
            Err(err) => {
                tracing::warn!(target: "stitch.weaver", class = %class.name, error = %err, "class analysis failed; left unwoven");
                None
            }
        }
    }

    /// Plans and emits one class. Returns the original bytes whenever there
    /// is nothing to do or anything fails.
    pub fn transform<E: CodeEmitter>(&self, bytes: &[u8], emitter: &mut E) -> Vec<u8> {
        let Some(plan) = self.plan_class_bytes(bytes) else {
            return bytes.to_vec();
        };
        match emitter.emit(bytes, &plan) {
            Ok(woven) => woven,
            Err(err) => {
                tracing::warn!(target: "stitch.weaver", class = %plan.class_name, error = %err, "code emission failed; left unwoven");
                bytes.to_vec()
            }
        }
    }

    /// Runs one invocation of an instrumented method through its advices.
    pub fn invoke(
        &self,
        join_point: &JoinPoint,
        invocation: Invocation,
        body: impl FnOnce(&[Value]) -> std::result::Result<Returned, Thrown>,
    ) -> std::result::Result<Returned, Thrown> {
        Protocol {
            universe: &self.universe,
            meta: &self.meta,
        }
        .run(join_point, invocation, body)
    }

    /// A retransformation of `class`: drops its cached analysis and that of
    /// every cached class below it.
    pub fn invalidate(&self, class: &str) {
        self.universe.clear_derived();
        let mut dropped = Vec::new();
        for cached in self.join_points.keys() {
            if cached == class || self.universe.ancestors(&cached).iter().any(|a| a == class) {
                dropped.push(cached);
            }
        }
        for name in &dropped {
            self.join_points.remove(name);
            self.meta.invalidate(name);
        }
        tracing::debug!(target: "stitch.weaver", class, dropped = dropped.len(), "invalidated");
    }

    pub fn invalidate_all(&self) {
        self.universe.clear_derived();
        self.join_points.clear();
        self.meta.clear();
        tracing::debug!(target: "stitch.weaver", "invalidated all classes");
    }

    /// Swaps the reweavable advices for `replacements` and drops every
    /// cached join point. Fixed advices stay; replacements that are not
    /// marked reweavable are rejected.
    pub fn replace_reweavable(&self, replacements: Vec<Advice>) {
        {
            let mut advices = self.advices.write();
            advices.retain(|advice| !advice.is_reweavable());
            for advice in replacements {
                if !advice.is_reweavable() {
                    tracing::warn!(
                        target: "stitch.weaver",
                        advice = %advice.name(),
                        "replacement advice is not reweavable; ignored"
                    );
                    continue;
                }
                if advices.iter().any(|a| a.name() == advice.name()) {
                    tracing::warn!(target: "stitch.weaver", advice = %advice.name(), "duplicate advice name; ignored");
                    continue;
                }
                advices.push(Arc::new(advice));
            }
        }
        self.invalidate_all();
    }
}

/// Advices whose pointcut selects the viewed method on `class`, in
/// registration order.
fn select(
    matcher: &PointcutMatcher<'_>,
    advices: &[Arc<Advice>],
    class: &ClassMetadata,
    view: &MethodView,
) -> Result<Vec<Arc<Advice>>> {
    let mut selected = Vec::new();
    for advice in advices {
        if matcher.matches_view(advice.pointcut(), class, view)? {
            selected.push(Arc::clone(advice));
        }
    }
    Ok(selected)
}
