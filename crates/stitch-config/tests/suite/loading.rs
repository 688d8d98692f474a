use std::io::Write;

use pretty_assertions::assert_eq;
use stitch_config::{Binding, ConfigError, HookBindings, MethodModifier, StitchConfig};
use tempfile::NamedTempFile;

const SAMPLE: &str = r#"
[logging]
level = "debug"

[[advice]]
name = "jdbc-execute"
class_name = "java.sql.Statement"
super_type_restriction = "java.sql.Statement"
method_name = "execute*"
method_parameter_types = ["java.lang.String", ".."]
method_return_type = "boolean|int"
method_modifiers = ["public", "not_static"]
nesting_group = "jdbc"
priority = 10
tag = "db"
traveler_type = "long"

[advice.hooks]
is_enabled = []
before = ["receiver", { parameter = 0 }]
on_return = ["optional_return", "traveler"]
on_throw = ["throwable", "traveler"]
after = ["traveler", "method_meta"]

[[mixin]]
name = "has-trace-entry"
targets = ["java.sql.Statement", "@com.acme.Traced"]
interfaces = ["com.acme.HasTraceEntry"]
fields = { entry = "java.lang.Object", count = "int" }
init = true

[[shim]]
name = "servlet-request"
interface = "com.acme.RequestShim"
targets = ["javax.servlet.http.HttpServletRequest"]
methods = { uri = "getRequestURI", method = "getMethod" }
"#;

#[test]
fn loads_every_section() {
    let config = StitchConfig::load_from_str(SAMPLE).expect("config should parse");

    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.stderr);

    let advice = config.advice("jdbc-execute").expect("advice");
    assert_eq!(advice.class_name, "java.sql.Statement");
    assert_eq!(
        advice.method_parameter_types.as_deref(),
        Some(&["java.lang.String".to_owned(), "..".to_owned()][..])
    );
    assert_eq!(
        advice.method_modifiers,
        vec![MethodModifier::Public, MethodModifier::NotStatic]
    );
    assert_eq!(advice.priority, 10);
    assert_eq!(advice.tag, "db");
    assert!(advice.enabled);
    assert!(!advice.reweavable);
    assert_eq!(advice.traveler_type.as_deref(), Some("long"));
    assert_eq!(
        advice.hooks,
        HookBindings {
            is_enabled: Some(vec![]),
            before: Some(vec![Binding::Receiver, Binding::Parameter(0)]),
            on_return: Some(vec![Binding::OptionalReturn, Binding::Traveler]),
            on_throw: Some(vec![Binding::Throwable, Binding::Traveler]),
            after: Some(vec![Binding::Traveler, Binding::MethodMeta]),
        }
    );

    let mixin = &config.mixin[0];
    assert_eq!(mixin.targets, vec!["java.sql.Statement", "@com.acme.Traced"]);
    assert_eq!(mixin.fields.get("count").map(String::as_str), Some("int"));
    assert!(mixin.init);

    let shim = &config.shim[0];
    assert_eq!(shim.methods.get("uri").map(String::as_str), Some("getRequestURI"));
}

#[test]
fn loads_from_disk() {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(SAMPLE.as_bytes()).expect("write config");

    let config = StitchConfig::load_from_path(file.path()).expect("config should load");
    assert_eq!(config.advice.len(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = StitchConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err:?}");
}

#[test]
fn empty_config_is_default() {
    assert_eq!(StitchConfig::load_from_str("").unwrap(), StitchConfig::default());
}

#[test]
fn bad_binding_is_a_parse_error() {
    let text = r#"
[[advice]]
name = "a"
[advice.hooks]
before = ["receiver", "everything"]
"#;
    let err = StitchConfig::load_from_str(text).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}
