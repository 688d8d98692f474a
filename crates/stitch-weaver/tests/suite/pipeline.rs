use std::sync::Arc;

use pretty_assertions::assert_eq;
use stitch_classfile::{ClassMetadata, MethodMetadata};
use stitch_config::{Binding, StitchConfig};
use stitch_value::Value;
use stitch_weaver::{
    Advice, BoundArg, CodeEmitter, HookCatalog, HookImpls, HookKind, JoinPointKind, PlannedHook,
    WeavePlan, Weaver,
};

use super::fixtures::advice_config;

const CONFIG: &str = r#"
[[advice]]
name = "timer"
class_name = "com.acme.*"
method_name = "handle"
priority = 10
traveler_type = "long"
hooks.before = ["method_name"]
hooks.after = ["traveler"]

[[advice]]
name = "unregistered"
class_name = "com.acme.*"
method_name = "*"

[[advice]]
name = "broken-pattern"
class_name = "/(unclosed/"
method_name = "*"
"#;

fn catalog() -> HookCatalog {
    let mut catalog = HookCatalog::new();
    catalog.register(
        "timer",
        HookImpls::new()
            .before(|_: &[BoundArg]| Ok(Some(Value::Int(1))))
            .after(|_: &[BoundArg]| Ok(None)),
    );
    catalog.register("broken-pattern", HookImpls::new());
    catalog
}

#[test]
fn unusable_declarations_are_skipped() {
    let config = StitchConfig::load_from_str(CONFIG).unwrap();
    let weaver = Weaver::from_config(&config, &catalog());
    let names: Vec<_> = weaver.advices().iter().map(|a| a.name().to_owned()).collect();
    assert_eq!(names, vec!["timer"]);
}

#[test]
fn plans_list_hooks_and_bindings() {
    let config = StitchConfig::load_from_str(CONFIG).unwrap();
    let weaver = Weaver::from_config(&config, &catalog());
    weaver.register_class(
        ClassMetadata::new("com.acme.Api")
            .with_method(MethodMetadata::new("handle", "()V"))
            .with_method(MethodMetadata::new("other", "()V")),
    );

    let plan = weaver.plan_class("com.acme.Api").unwrap();
    assert_eq!(plan.injection_points.len(), 1);
    let point = plan.injection_point("handle", "()V").unwrap();
    assert_eq!(point.kind, JoinPointKind::Declared);
    assert_eq!(point.advices.len(), 1);
    assert_eq!(
        point.advices[0].hooks,
        vec![
            PlannedHook {
                kind: HookKind::Before,
                bindings: vec![Binding::MethodName],
            },
            PlannedHook {
                kind: HookKind::After,
                bindings: vec![Binding::Traveler],
            },
        ]
    );
}

#[test]
fn unreadable_classes_are_left_unwoven() {
    let weaver = Weaver::new(Vec::new(), Vec::new(), Vec::new());
    assert_eq!(weaver.plan_class_bytes(&[0xCA, 0xFE]), None);
    assert_eq!(weaver.plan_class_bytes(b"not a class file"), None);
}

#[test]
fn analysis_failures_are_isolated_per_class() {
    let weaver = Weaver::new(
        vec![Advice::new(advice_config("all", "com.acme.*", "*"), &HookImpls::new()).unwrap()],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Broken")
            .with_method(MethodMetadata::new("bad", "(Ljava/lang/String)V")),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Fine").with_method(MethodMetadata::new("good", "()V")),
    );

    assert!(weaver.plan_class("com.acme.Broken").is_err());
    assert_eq!(weaver.plan_class("com.acme.Fine").unwrap().injection_points.len(), 1);
}

struct Tagging;

impl CodeEmitter for Tagging {
    type Error = String;

    fn emit(&mut self, original: &[u8], plan: &WeavePlan) -> Result<Vec<u8>, String> {
        if plan.class_name.is_empty() {
            return Err("nameless".into());
        }
        let mut out = original.to_vec();
        out.extend_from_slice(b"woven");
        Ok(out)
    }
}

#[test]
fn transform_returns_original_bytes_when_nothing_applies() {
    let weaver = Weaver::new(Vec::new(), Vec::new(), Vec::new());
    let bytes = b"garbage".to_vec();
    assert_eq!(weaver.transform(&bytes, &mut Tagging), bytes);
}

#[test]
fn invalidation_recomputes_join_points() {
    let weaver = Weaver::new(
        vec![Advice::new(advice_config("runs", "com.acme.Base", "run"), &HookImpls::new()).unwrap()],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(ClassMetadata::new("com.acme.Base").with_method(MethodMetadata::new("run", "()V")));
    weaver.register_class(ClassMetadata::new("com.acme.Leaf").extends("com.acme.Base"));

    let before = weaver.resolve_join_point("com.acme.Leaf", "run", "()V").unwrap().unwrap();
    let again = weaver.resolve_join_point("com.acme.Leaf", "run", "()V").unwrap().unwrap();
    assert!(Arc::ptr_eq(&before, &again));

    weaver.register_class(ClassMetadata::new("com.acme.Base").with_method(MethodMetadata::new("run", "()V")));
    let after = weaver.resolve_join_point("com.acme.Leaf", "run", "()V").unwrap().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));

    weaver.invalidate_all();
    let fresh = weaver.resolve_join_point("com.acme.Leaf", "run", "()V").unwrap().unwrap();
    assert!(!Arc::ptr_eq(&after, &fresh));
}

#[test]
fn reweavable_advices_can_be_replaced() {
    let mut fixed = advice_config("fixed", "com.acme.Api", "handle");
    fixed.priority = 1;
    let mut hot = advice_config("hot-v1", "com.acme.Api", "handle");
    hot.reweavable = true;
    let weaver = Weaver::new(
        vec![
            Advice::new(fixed, &HookImpls::new()).unwrap(),
            Advice::new(hot, &HookImpls::new()).unwrap(),
        ],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(ClassMetadata::new("com.acme.Api").with_method(MethodMetadata::new("handle", "()V")));
    let names = |weaver: &Weaver| {
        weaver
            .resolve_join_point("com.acme.Api", "handle", "()V")
            .unwrap()
            .map(|jp| jp.advice_names().iter().map(|n| n.to_string()).collect::<Vec<_>>())
            .unwrap_or_default()
    };
    assert_eq!(names(&weaver), vec!["hot-v1", "fixed"]);

    let mut v2 = advice_config("hot-v2", "com.acme.Api", "handle");
    v2.reweavable = true;
    v2.priority = 2;
    let not_reweavable = advice_config("sneaky", "com.acme.Api", "handle");
    weaver.replace_reweavable(vec![
        Advice::new(v2, &HookImpls::new()).unwrap(),
        Advice::new(not_reweavable, &HookImpls::new()).unwrap(),
    ]);

    assert_eq!(names(&weaver), vec!["fixed", "hot-v2"]);
}
