//! The per-invocation protocol around an instrumented method body.
//!
//! Phases, each walking the participating advices in execution order:
//! enablement, before, the body, return or throw, after. A before-hook that
//! throws aborts the chain: every participating advice gets its after-hook,
//! and the before-hook's exception reaches the caller. A return-, throw- or
//! after-hook that throws stops the rest of its phase and its exception
//! reaches the caller once the after phase is done.

use std::cell::RefCell;
use std::sync::Arc;

use stitch_config::Binding;
use stitch_value::{zero_value, Thrown, Value};

use crate::advice::{Advice, BoundArg, Hook, HookKind, Returned};
use crate::joinpoint::JoinPoint;
use crate::meta::MetaCache;
use crate::universe::TypeUniverse;

/// One call of an instrumented method, as seen by the protocol.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// `None` for static methods.
    pub receiver: Option<Value>,
    /// Runtime class of the receiver, used for sub-type restrictions.
    pub receiver_type: Option<String>,
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn new(args: Vec<Value>) -> Self {
        Self {
            receiver: None,
            receiver_type: None,
            args,
        }
    }

    pub fn with_receiver(mut self, runtime_type: impl Into<String>, receiver: Value) -> Self {
        self.receiver_type = Some(runtime_type.into());
        self.receiver = Some(receiver);
        self
    }
}

thread_local! {
    static ACTIVE_GROUPS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn group_active(group: &str) -> bool {
    ACTIVE_GROUPS.with(|groups| groups.borrow().iter().any(|g| g == group))
}

/// Marks nesting groups active on this thread until dropped.
struct NestingGuard {
    pushed: usize,
}

impl NestingGuard {
    fn enter<'a>(groups: impl Iterator<Item = &'a str>) -> Self {
        ACTIVE_GROUPS.with(|active| {
            let mut active = active.borrow_mut();
            let before = active.len();
            active.extend(groups.map(str::to_owned));
            NestingGuard {
                pushed: active.len() - before,
            }
        })
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        ACTIVE_GROUPS.with(|active| {
            let mut active = active.borrow_mut();
            let keep = active.len().saturating_sub(self.pushed);
            active.truncate(keep);
        });
    }
}

/// What a hook can bind at the point it runs.
struct Frame<'a> {
    join_point: &'a JoinPoint,
    invocation: &'a Invocation,
    traveler: Option<Value>,
    returned: Option<&'a Returned>,
    thrown: Option<&'a Thrown>,
}

pub(crate) struct Protocol<'a> {
    pub(crate) universe: &'a TypeUniverse,
    pub(crate) meta: &'a MetaCache,
}

impl Protocol<'_> {
    pub(crate) fn run(
        &self,
        join_point: &JoinPoint,
        invocation: Invocation,
        body: impl FnOnce(&[Value]) -> Result<Returned, Thrown>,
    ) -> Result<Returned, Thrown> {
        let active: Vec<&Arc<Advice>> = join_point
            .advices
            .iter()
            .filter(|advice| self.participates(join_point, advice, &invocation))
            .collect();
        if active.is_empty() {
            return body(&invocation.args);
        }

        let _nesting = (!join_point.is_constructor())
            .then(|| NestingGuard::enter(active.iter().filter_map(|a| a.nesting_group())));

        let mut travelers: Vec<Option<Value>> = vec![None; active.len()];
        for (slot, advice) in active.iter().enumerate() {
            let Some(hook) = advice.hook(HookKind::Before) else {
                continue;
            };
            let frame = self.frame(join_point, &invocation);
            match hook.call(&self.bind(hook, &frame)) {
                Ok(traveler) => travelers[slot] = traveler,
                Err(thrown) => {
                    tracing::debug!(
                        target: "stitch.weaver",
                        advice = %advice.name(),
                        error = %thrown,
                        "before hook threw; unwinding"
                    );
                    self.unwind(join_point, &invocation, &active, &travelers);
                    return Err(thrown);
                }
            }
        }

        let mut failure: Option<Thrown> = None;
        let outcome = match body(&invocation.args) {
            Ok(mut returned) => {
                for (slot, advice) in active.iter().enumerate() {
                    let Some(hook) = advice.hook(HookKind::OnReturn) else {
                        continue;
                    };
                    let args = self.bind(
                        hook,
                        &Frame {
                            traveler: Some(traveler(advice, &travelers[slot])),
                            returned: Some(&returned),
                            ..self.frame(join_point, &invocation)
                        },
                    );
                    match hook.call(&args) {
                        Ok(Some(replacement)) if matches!(returned, Returned::Value(_)) => {
                            returned = Returned::Value(replacement);
                        }
                        Ok(_) => {}
                        Err(thrown) => {
                            failure = Some(thrown);
                            break;
                        }
                    }
                }
                Ok(returned)
            }
            Err(thrown) => {
                for (slot, advice) in active.iter().enumerate() {
                    let Some(hook) = advice.hook(HookKind::OnThrow) else {
                        continue;
                    };
                    let frame = Frame {
                        traveler: Some(traveler(advice, &travelers[slot])),
                        thrown: Some(&thrown),
                        ..self.frame(join_point, &invocation)
                    };
                    if let Err(hook_thrown) = hook.call(&self.bind(hook, &frame)) {
                        failure = Some(hook_thrown);
                        break;
                    }
                }
                Err(thrown)
            }
        };

        for (slot, advice) in active.iter().enumerate() {
            let Some(hook) = advice.hook(HookKind::After) else {
                continue;
            };
            let frame = Frame {
                traveler: Some(traveler(advice, &travelers[slot])),
                ..self.frame(join_point, &invocation)
            };
            if let Err(thrown) = hook.call(&self.bind(hook, &frame)) {
                match &failure {
                    None => failure = Some(thrown),
                    Some(first) => tracing::warn!(
                        target: "stitch.weaver",
                        advice = %advice.name(),
                        error = %thrown,
                        propagating = %first,
                        "after hook threw while another hook failure is propagating"
                    ),
                }
                break;
            }
        }

        match failure {
            Some(thrown) => Err(thrown),
            None => outcome,
        }
    }

    fn participates(&self, join_point: &JoinPoint, advice: &Advice, invocation: &Invocation) -> bool {
        if !advice.is_enabled() {
            return false;
        }
        if let Some(restriction) = advice.pointcut().sub_type_restriction() {
            let runtime = invocation
                .receiver_type
                .as_deref()
                .unwrap_or(&join_point.class_name);
            if !self.universe.is_assignable(runtime, restriction) {
                return false;
            }
        }
        if !join_point.is_constructor() {
            if let Some(group) = advice.nesting_group() {
                if group_active(group) {
                    return false;
                }
            }
        }
        let Some(hook) = advice.hook(HookKind::IsEnabled) else {
            return true;
        };
        match hook.call(&self.bind(hook, &self.frame(join_point, invocation))) {
            Ok(Some(Value::Bool(enabled))) => enabled,
            Ok(_) => true,
            Err(thrown) => {
                tracing::warn!(
                    target: "stitch.weaver",
                    advice = %advice.name(),
                    error = %thrown,
                    "enablement hook threw; advice skipped for this call"
                );
                false
            }
        }
    }

    /// After-hooks for every participating advice once a before-hook threw.
    /// Their own failures are logged; the before-hook's exception wins.
    fn unwind(
        &self,
        join_point: &JoinPoint,
        invocation: &Invocation,
        active: &[&Arc<Advice>],
        travelers: &[Option<Value>],
    ) {
        for (slot, advice) in active.iter().enumerate() {
            let Some(hook) = advice.hook(HookKind::After) else {
                continue;
            };
            let frame = Frame {
                traveler: Some(traveler(advice, &travelers[slot])),
                ..self.frame(join_point, invocation)
            };
            if let Err(thrown) = hook.call(&self.bind(hook, &frame)) {
                tracing::warn!(
                    target: "stitch.weaver",
                    advice = %advice.name(),
                    error = %thrown,
                    "after hook threw during unwinding; ignored"
                );
            }
        }
    }

    fn frame<'a>(&self, join_point: &'a JoinPoint, invocation: &'a Invocation) -> Frame<'a> {
        Frame {
            join_point,
            invocation,
            traveler: None,
            returned: None,
            thrown: None,
        }
    }

    fn bind(&self, hook: &Hook, frame: &Frame<'_>) -> Vec<BoundArg> {
        hook.bindings
            .iter()
            .map(|binding| match *binding {
                Binding::Receiver => BoundArg::Value(frame.invocation.receiver.clone().unwrap_or_default()),
                Binding::Parameter(idx) => {
                    BoundArg::Value(frame.invocation.args.get(idx).cloned().unwrap_or_default())
                }
                Binding::ParameterArray => BoundArg::Value(Value::List(frame.invocation.args.clone())),
                Binding::Traveler => BoundArg::Value(frame.traveler.clone().unwrap_or_default()),
                Binding::Return => BoundArg::Value(frame.returned.map(Returned::value).unwrap_or_default()),
                Binding::OptionalReturn => {
                    BoundArg::OptionalReturn(frame.returned.cloned().unwrap_or(Returned::Void))
                }
                Binding::Throwable => BoundArg::Throwable(
                    frame
                        .thrown
                        .cloned()
                        .unwrap_or_else(|| Thrown::without_message("java.lang.Throwable")),
                ),
                Binding::MethodName => BoundArg::Value(Value::Str(frame.join_point.method.name.clone())),
                Binding::ClassMeta => {
                    let class = self.universe.get(&frame.join_point.class_name);
                    BoundArg::ClassMeta(self.meta.class_meta(frame.join_point, class.as_deref()))
                }
                Binding::MethodMeta => BoundArg::MethodMeta(self.meta.method_meta(frame.join_point)),
            })
            .collect()
    }
}

/// The traveler an advice's later hooks see: what its before-hook produced,
/// or the zero value of the declared traveler type when it never ran.
fn traveler(advice: &Advice, produced: &Option<Value>) -> Value {
    produced
        .clone()
        .unwrap_or_else(|| zero_value(advice.traveler_type()))
}
