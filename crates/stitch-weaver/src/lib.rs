//! Pointcut matching, advice ordering and the hook invocation protocol.
//!
//! A [`Weaver`] is built from advice, mixin and shim declarations plus the
//! host's hook code. Classes are registered as they load; the weaver then
//! answers which methods are join points, which advices run there and in what
//! order, and drives each invocation of an instrumented method through the
//! advices' hooks.

#![forbid(unsafe_code)]

mod advice;
mod error;
mod invoke;
mod joinpoint;
mod matcher;
mod meta;
mod mixin;
mod once_map;
mod ordering;
mod pattern;
mod plan;
mod universe;
mod weaver;

pub use crate::advice::{
    Advice, BoundArg, Hook, HookCatalog, HookFn, HookImpls, HookKind, MixinInitFn, Returned,
};
pub use crate::error::{Result, WeaveError};
pub use crate::invoke::Invocation;
pub use crate::joinpoint::{ClassJoinPoints, JoinPoint, JoinPointKind};
pub use crate::matcher::{MethodView, ParamPattern, Pointcut, PointcutMatcher, ReturnPattern};
pub use crate::meta::{ClassMeta, MethodMeta};
pub use crate::mixin::{InstanceMixins, MixinInstance, MixinType, ShimAdapter, ShimType};
pub use crate::ordering::{compare_advices, sort_advices, AdviceOrderKey};
pub use crate::pattern::NamePattern;
pub use crate::plan::{CodeEmitter, InjectionPoint, PlannedAdvice, PlannedHook, WeavePlan};
pub use crate::universe::{EffectiveMethods, MethodRef, TypeUniverse};
pub use crate::weaver::Weaver;
