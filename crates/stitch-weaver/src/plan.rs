//! Injection plans: what the code emitter has to do to one class.

use stitch_config::Binding;

use crate::advice::HookKind;
use crate::joinpoint::{ClassJoinPoints, JoinPointKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedHook {
    pub kind: HookKind,
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAdvice {
    pub name: String,
    pub hooks: Vec<PlannedHook>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    pub method_name: String,
    pub descriptor: String,
    pub kind: JoinPointKind,
    /// In execution order.
    pub advices: Vec<PlannedAdvice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeavePlan {
    pub class_name: String,
    pub injection_points: Vec<InjectionPoint>,
    /// Mixins newly attached at this class; mixins a superclass already
    /// carries are inherited with its fields.
    pub mixins: Vec<String>,
    pub shims: Vec<String>,
}

impl WeavePlan {
    pub(crate) fn from_join_points(join_points: &ClassJoinPoints) -> Self {
        let injection_points = join_points
            .iter()
            .map(|jp| InjectionPoint {
                method_name: jp.method.name.clone(),
                descriptor: jp.method.descriptor.clone(),
                kind: jp.kind,
                advices: jp
                    .advices
                    .iter()
                    .map(|advice| PlannedAdvice {
                        name: advice.name().to_owned(),
                        hooks: advice
                            .hook_kinds()
                            .into_iter()
                            .filter_map(|kind| {
                                advice.hook(kind).map(|hook| PlannedHook {
                                    kind,
                                    bindings: hook.bindings.clone(),
                                })
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            class_name: join_points.class_name.clone(),
            injection_points,
            mixins: Vec::new(),
            shims: Vec::new(),
        }
    }

    /// Nothing to weave: the class runs unmodified.
    pub fn is_empty(&self) -> bool {
        self.injection_points.is_empty() && self.mixins.is_empty() && self.shims.is_empty()
    }

    pub fn injection_point(&self, method_name: &str, descriptor: &str) -> Option<&InjectionPoint> {
        self.injection_points
            .iter()
            .find(|p| p.method_name == method_name && p.descriptor == descriptor)
    }
}

/// Rewrites class bytes according to a plan.
pub trait CodeEmitter {
    type Error: std::fmt::Display;

    fn emit(&mut self, original: &[u8], plan: &WeavePlan) -> Result<Vec<u8>, Self::Error>;
}
