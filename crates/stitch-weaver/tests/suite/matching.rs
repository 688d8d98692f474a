use std::sync::Arc;

use pretty_assertions::assert_eq;
use stitch_classfile::{ClassMetadata, MethodMetadata};
use stitch_value::Value;
use stitch_weaver::{Advice, HookImpls, Invocation, JoinPointKind, PointcutMatcher, Returned, Weaver};

use super::fixtures::{abstract_method, advice_config, interface, journaling_advice, Journal};

fn plain(config: stitch_config::AdviceConfig) -> Advice {
    Advice::new(config, &HookImpls::new()).unwrap()
}

#[test]
fn diamond_interfaces_yield_one_join_point_per_method() {
    let mut config = advice_config("handlers", "com.acme.Handler", "handle");
    config.method_parameter_types = Some(vec!["..".into()]);
    let weaver = Weaver::new(vec![plain(config)], Vec::new(), Vec::new());

    weaver.register_class(interface("com.acme.Handler").with_method(abstract_method("handle", "()V")));
    weaver.register_class(interface("com.acme.Left").implements("com.acme.Handler"));
    weaver.register_class(interface("com.acme.Right").implements("com.acme.Handler"));
    weaver.register_class(
        ClassMetadata::new("com.acme.Impl")
            .implements("com.acme.Left")
            .implements("com.acme.Right")
            .implements("com.acme.Handler")
            .with_method(MethodMetadata::new("handle", "()V")),
    );

    let join_points = weaver.join_points_for("com.acme.Impl").unwrap();
    assert_eq!(join_points.len(), 1);
    let handle = join_points.get("handle", "()V").unwrap();
    assert_eq!(handle.kind, JoinPointKind::Declared);
    assert_eq!(handle.advice_names(), vec!["handlers"]);
}

fn generic_repositories(weaver: &Weaver) {
    weaver.register_class(
        interface("com.acme.Repository")
            .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;")
            .unwrap()
            .with_method(
                abstract_method("save", "(Ljava/lang/Object;)V").with_signature("(TE;)V"),
            ),
    );
    weaver.register_class(ClassMetadata::new("com.acme.User"));
    weaver.register_class(
        ClassMetadata::new("com.acme.UserRepository")
            .implements("com.acme.Repository")
            .with_signature(
                "Ljava/lang/Object;Lcom/acme/Repository<Lcom/acme/User;>;",
            )
            .unwrap()
            .with_method(MethodMetadata::new("save", "(Lcom/acme/User;)V")),
    );
}

#[test]
fn interface_patterns_see_generic_bindings() {
    let mut config = advice_config("saves", "com.acme.Repository", "save");
    config.method_parameter_types = Some(vec!["com.acme.User".into()]);
    let weaver = Weaver::new(vec![plain(config)], Vec::new(), Vec::new());
    generic_repositories(&weaver);

    let join_points = weaver.join_points_for("com.acme.UserRepository").unwrap();
    let save = join_points.get("save", "(Lcom/acme/User;)V").expect("save is advised");
    assert_eq!(save.parameter_types, vec!["com.acme.User"]);
}

#[test]
fn super_type_restriction_requires_the_restricted_declaration() {
    let mut config = advice_config("closes", "*", "close");
    config.super_type_restriction = "com.acme.Resource".into();
    let weaver = Weaver::new(vec![plain(config)], Vec::new(), Vec::new());

    weaver.register_class(
        ClassMetadata::new("com.acme.Resource").with_method(MethodMetadata::new("close", "()V")),
    );
    weaver.register_class(ClassMetadata::new("com.acme.Pooled").extends("com.acme.Resource"));
    weaver.register_class(
        ClassMetadata::new("com.acme.Custom")
            .extends("com.acme.Resource")
            .with_method(MethodMetadata::new("close", "()V")),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Unrelated").with_method(MethodMetadata::new("close", "()V")),
    );
    weaver.register_class(interface("com.acme.Closeable").with_method(abstract_method("close", "()V")));
    weaver.register_class(
        ClassMetadata::new("com.acme.Socket")
            .implements("com.acme.Closeable")
            .with_method(MethodMetadata::new("close", "()V")),
    );

    let matcher = PointcutMatcher::new(weaver.universe());
    let advice = weaver.advice("closes").unwrap();
    let matches = |class: &str| {
        let meta = weaver.universe().get(class).unwrap();
        matcher.matches(advice.pointcut(), &meta, "close", "()V").unwrap()
    };

    assert!(matches("com.acme.Resource"));
    assert!(matches("com.acme.Pooled"), "inherited unmodified");
    assert!(!matches("com.acme.Custom"), "overridden below the restriction");
    assert!(!matches("com.acme.Unrelated"));

    let mut config = advice_config("closeables", "*", "close");
    config.super_type_restriction = "com.acme.Closeable".into();
    let advice = plain(config);
    let socket = weaver.universe().get("com.acme.Socket").unwrap();
    assert!(
        matcher.matches(advice.pointcut(), &socket, "close", "()V").unwrap(),
        "implementing an abstract declaration counts"
    );
}

#[test]
fn annotations_select_classes_and_methods() {
    let mut config = advice_config("endpoints", "", "*");
    config.class_annotation = "com.acme.Controller".into();
    config.method_annotation = "com.acme.Get|com.acme.Post".into();
    let weaver = Weaver::new(vec![plain(config)], Vec::new(), Vec::new());

    weaver.register_class(
        ClassMetadata::new("com.acme.Users")
            .with_annotation("com.acme.Controller")
            .with_method(MethodMetadata::new("list", "()V").with_annotation("com.acme.Get"))
            .with_method(MethodMetadata::new("helper", "()V")),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Plain")
            .with_method(MethodMetadata::new("list", "()V").with_annotation("com.acme.Get")),
    );

    let users = weaver.join_points_for("com.acme.Users").unwrap();
    assert_eq!(users.len(), 1);
    assert!(users.get("list", "()V").is_some());
    assert!(weaver.join_points_for("com.acme.Plain").unwrap().is_empty());
}

#[test]
fn wildcard_method_names_skip_constructors() {
    let weaver = Weaver::new(
        vec![plain(advice_config("all", "com.acme.Bean", "*"))],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Bean")
            .with_method(MethodMetadata::new("<init>", "()V"))
            .with_method(MethodMetadata::new("<clinit>", "()V"))
            .with_method(MethodMetadata::new("get", "()I")),
    );
    let join_points = weaver.join_points_for("com.acme.Bean").unwrap();
    let names: Vec<_> = join_points.iter().map(|jp| jp.method.name.as_str()).collect();
    assert_eq!(names, vec!["get"]);
}

#[test]
fn inherited_methods_reuse_the_declaring_join_point() {
    let mut config = advice_config("saves", "com.acme.Base", "save");
    config.sub_type_restriction = "com.acme.Special".into();
    let journal = Journal::default();
    let weaver = Weaver::new(
        vec![journaling_advice(config, &journal, None)],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(ClassMetadata::new("com.acme.Base").with_method(MethodMetadata::new("save", "()V")));
    weaver.register_class(ClassMetadata::new("com.acme.Special").extends("com.acme.Base"));
    weaver.register_class(ClassMetadata::new("com.acme.Other").extends("com.acme.Base"));

    let base = weaver.resolve_join_point("com.acme.Base", "save", "()V").unwrap().unwrap();
    let special = weaver.resolve_join_point("com.acme.Special", "save", "()V").unwrap().unwrap();
    assert!(Arc::ptr_eq(&base, &special));
    assert!(weaver.join_points_for("com.acme.Special").unwrap().is_empty());

    let run = |runtime: &str| {
        weaver
            .invoke(
                &base,
                Invocation::new(Vec::new()).with_receiver(runtime, Value::Null),
                |_| Ok(Returned::Void),
            )
            .unwrap();
    };
    run("com.acme.Other");
    assert!(journal.entries().is_empty(), "receiver outside the restriction");
    run("com.acme.Special");
    assert_eq!(journal.count("saves:before"), 1);
}

#[test]
fn subclass_patterns_get_an_override_for_inherited_methods() {
    let weaver = Weaver::new(
        vec![
            plain(advice_config("base", "com.acme.Base", "save")),
            plain(advice_config("leaf", "com.acme.Leaf", "save")),
        ],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(ClassMetadata::new("com.acme.Base").with_method(MethodMetadata::new("save", "()V")));
    weaver.register_class(ClassMetadata::new("com.acme.Leaf").extends("com.acme.Base"));

    let leaf = weaver.join_points_for("com.acme.Leaf").unwrap();
    let save = leaf.get("save", "()V").unwrap();
    assert_eq!(save.kind, JoinPointKind::InheritedOverride);
    assert_eq!(save.owner, "com.acme.Base");
    assert_eq!(save.advice_names(), vec!["leaf"]);
}

#[test]
fn return_type_patterns_widen() {
    let mut config = advice_config("texts", "com.acme.Texts", "*");
    config.method_return_type = "java.lang.CharSequence".into();
    let weaver = Weaver::new(vec![plain(config)], Vec::new(), Vec::new());
    weaver.register_class(interface("java.lang.CharSequence"));
    weaver.register_class(ClassMetadata::new("java.lang.String").implements("java.lang.CharSequence"));
    weaver.register_class(
        ClassMetadata::new("com.acme.Texts")
            .with_method(MethodMetadata::new("name", "()Ljava/lang/String;"))
            .with_method(MethodMetadata::new("seq", "()Ljava/lang/CharSequence;"))
            .with_method(MethodMetadata::new("hash", "()I")),
    );

    let join_points = weaver.join_points_for("com.acme.Texts").unwrap();
    let mut names: Vec<_> = join_points.iter().map(|jp| jp.method.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["name", "seq"]);
}
