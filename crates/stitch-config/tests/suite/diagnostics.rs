use pretty_assertions::assert_eq;
use stitch_config::{ConfigWarning, StitchConfig};

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[[advice]]
name = "a"
class_name = "com.acme.A"
method_name = "run"
prority = 3

[advice.hooks]
befor = []
"#;

    let (config, diagnostics) =
        StitchConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(config.advice[0].priority, 0);
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["advice[0].hooks.befor", "advice[0].prority", "typo"]
    );
    assert!(diagnostics.warnings.is_empty(), "{:?}", diagnostics.warnings);
}

#[test]
fn reports_semantic_problems_without_failing() {
    let text = r#"
[logging]
level = "stitch=bogus=level"

[[advice]]
name = "dup"
class_name = "com.acme.A"
method_name = "run"
method_parameter_types = ["..", "int"]

[[advice]]
name = "dup"
method_name = ""
method_parameter_types = ["int", "..", ".."]

[advice.hooks]
after = ["traveler"]

[[mixin]]
name = "lonely"
"#;

    let (config, diagnostics) =
        StitchConfig::load_from_str_with_diagnostics(text).expect("config should parse");
    assert_eq!(config.advice.len(), 2);

    assert_eq!(
        diagnostics.warnings,
        vec![
            ConfigWarning::LoggingLevelInvalid {
                value: "stitch=bogus=level".to_owned(),
                normalized: "stitch=bogus=level".to_owned(),
            },
            ConfigWarning::MisplacedVariadicMarker {
                advice: "dup".to_owned(),
                toml_path: "advice[0].method_parameter_types[0]".to_owned(),
            },
            ConfigWarning::DuplicateAdviceName {
                name: "dup".to_owned(),
            },
            ConfigWarning::MissingClassPattern {
                advice: "dup".to_owned(),
            },
            ConfigWarning::EmptyPattern {
                advice: "dup".to_owned(),
                toml_path: "advice[1].method_name".to_owned(),
            },
            ConfigWarning::MisplacedVariadicMarker {
                advice: "dup".to_owned(),
                toml_path: "advice[1].method_parameter_types[2]".to_owned(),
            },
            ConfigWarning::TravelerWithoutBefore {
                advice: "dup".to_owned(),
            },
            ConfigWarning::MixinWithoutTargets {
                mixin: "lonely".to_owned(),
            },
        ]
    );
}
