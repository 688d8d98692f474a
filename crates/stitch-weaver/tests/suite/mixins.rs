use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use stitch_classfile::ClassMetadata;
use stitch_config::{MixinConfig, ShimConfig, StitchConfig};
use stitch_value::{Introspect, Thrown, Value};
use stitch_weaver::{HookCatalog, Weaver};

use super::fixtures::interface;

fn config() -> StitchConfig {
    StitchConfig {
        mixin: vec![MixinConfig {
            name: "tracing-state".into(),
            targets: vec!["com.acme.Traced".into(), "@com.acme.Track".into()],
            interfaces: vec!["com.acme.HasTraceId".into()],
            fields: [("traceId".to_owned(), "long".to_owned())].into_iter().collect(),
            init: true,
        }],
        shim: vec![ShimConfig {
            name: "connection".into(),
            interface: "com.acme.ConnectionShim".into(),
            targets: vec!["com.vendor.Connection".into()],
            methods: [("url".to_owned(), "getUrl".to_owned())].into_iter().collect(),
        }],
        ..StitchConfig::default()
    }
}

#[test]
fn mixins_attach_once_across_overlapping_targets() {
    let inits = Arc::new(AtomicUsize::new(0));
    let mut catalog = HookCatalog::new();
    let counter = Arc::clone(&inits);
    catalog.register_mixin_init("tracing-state", move |instance| {
        counter.fetch_add(1, Ordering::SeqCst);
        instance.set("traceId", Value::Int(42));
        Ok(())
    });
    let weaver = Weaver::from_config(&config(), &catalog);

    weaver.register_class(interface("com.acme.Traced"));
    weaver.register_class(
        ClassMetadata::new("com.acme.Base")
            .implements("com.acme.Traced")
            .with_annotation("com.acme.Track"),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Leaf")
            .extends("com.acme.Base")
            .implements("com.acme.Traced")
            .with_annotation("com.acme.Track"),
    );

    let mixins = weaver.mixins_for("com.acme.Leaf");
    assert_eq!(mixins.len(), 1);
    assert!(weaver.mixins_for("com.acme.Traced").is_empty(), "interfaces hold no state");

    assert_eq!(weaver.plan_class("com.acme.Base").unwrap().mixins, vec!["tracing-state"]);
    assert!(
        weaver.plan_class("com.acme.Leaf").unwrap().mixins.is_empty(),
        "already attached by the superclass"
    );

    let state = weaver.instance_mixins("com.acme.Leaf");
    assert_eq!(state.len(), 1);
    let mixin = state.get("tracing-state").unwrap();
    assert!(!mixin.is_initialized(), "initialization is lazy");
    assert_eq!(mixin.get("traceId"), Some(Value::Int(42)));
    assert_eq!(mixin.get("traceId"), Some(Value::Int(42)));
    assert!(!mixin.set("unknown", Value::Null));
    assert_eq!(inits.load(Ordering::SeqCst), 1);

    let other = weaver.instance_mixins("com.acme.Base");
    other.get("tracing-state").unwrap().ensure_initialized();
    assert_eq!(inits.load(Ordering::SeqCst), 2, "once per instance");
}

#[test]
fn mixin_fields_start_at_zero_values() {
    let mut config = config();
    config.mixin[0].init = false;
    let weaver = Weaver::from_config(&config, &HookCatalog::new());
    weaver.register_class(ClassMetadata::new("com.acme.Tagged").with_annotation("com.acme.Track"));

    let state = weaver.instance_mixins("com.acme.Tagged");
    assert_eq!(state.get("tracing-state").unwrap().get("traceId"), Some(Value::Int(0)));
}

#[test]
fn mixins_declaring_init_without_code_are_skipped() {
    let weaver = Weaver::from_config(&config(), &HookCatalog::new());
    weaver.register_class(ClassMetadata::new("com.acme.Tagged").with_annotation("com.acme.Track"));
    assert!(weaver.mixins_for("com.acme.Tagged").is_empty());
}

struct VendorConnection;

impl Introspect for VendorConnection {
    fn type_name(&self) -> &str {
        "com.vendor.Connection"
    }

    fn has_method(&self, name: &str) -> bool {
        name == "getUrl"
    }

    fn call(&self, name: &str) -> Result<Value, Thrown> {
        match name {
            "getUrl" => Ok(Value::from("jdbc:h2:mem")),
            other => Err(Thrown::new("java.lang.NoSuchMethodError", other)),
        }
    }
}

#[test]
fn shims_delegate_to_renamed_members() {
    let weaver = Weaver::from_config(&config(), &HookCatalog::new());
    weaver.register_class(ClassMetadata::new("com.vendor.Connection"));
    weaver.register_class(ClassMetadata::new("com.vendor.PooledConnection").extends("com.vendor.Connection"));

    assert_eq!(weaver.shims_for("com.vendor.PooledConnection").len(), 1);
    assert_eq!(weaver.plan_class("com.vendor.Connection").unwrap().shims, vec!["connection"]);

    let shim = weaver.shim("connection", Value::object(VendorConnection)).unwrap();
    assert_eq!(shim.call("url"), Ok(Value::from("jdbc:h2:mem")));

    let err = shim.call("close").unwrap_err();
    assert_eq!(err.type_name, "java.lang.AbstractMethodError");
    assert_eq!(err.message.as_deref(), Some("com.acme.ConnectionShim.close"));

    let detached = weaver.shim("connection", Value::Null).unwrap();
    assert_eq!(
        detached.call("url").unwrap_err().type_name,
        "java.lang.NullPointerException"
    );
}
