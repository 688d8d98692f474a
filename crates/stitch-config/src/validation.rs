use std::collections::BTreeSet;

use crate::advice::{AdviceConfig, Binding};
use crate::diagnostics::ConfigWarning;
use crate::{LoggingConfig, StitchConfig};

impl StitchConfig {
    /// Semantic checks that do not prevent loading. Offending declarations
    /// still load; they simply never match or get skipped at weave time.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        validate_logging(&self.logging, &mut out);

        let mut seen = BTreeSet::new();
        for (idx, advice) in self.advice.iter().enumerate() {
            if !seen.insert(advice.name.as_str()) {
                out.push(ConfigWarning::DuplicateAdviceName {
                    name: advice.name.clone(),
                });
            }
            validate_advice(idx, advice, &mut out);
        }

        for mixin in &self.mixin {
            if mixin.targets.is_empty() {
                out.push(ConfigWarning::MixinWithoutTargets {
                    mixin: mixin.name.clone(),
                });
            }
        }
        out
    }
}

fn validate_logging(logging: &LoggingConfig, out: &mut Vec<ConfigWarning>) {
    let normalized = LoggingConfig::normalize_level_directives(&logging.level);
    if !logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.push(ConfigWarning::LoggingLevelInvalid {
            value: logging.level.clone(),
            normalized,
        });
    }
}

fn validate_advice(idx: usize, advice: &AdviceConfig, out: &mut Vec<ConfigWarning>) {
    if advice.class_name.trim().is_empty() && advice.class_annotation.trim().is_empty() {
        out.push(ConfigWarning::MissingClassPattern {
            advice: advice.name.clone(),
        });
    }
    if advice.method_name.trim().is_empty() && advice.method_annotation.trim().is_empty() {
        out.push(ConfigWarning::EmptyPattern {
            advice: advice.name.clone(),
            toml_path: format!("advice[{idx}].method_name"),
        });
    }

    if let Some(params) = &advice.method_parameter_types {
        for (pos, pattern) in params.iter().enumerate() {
            if pattern.trim().is_empty() {
                out.push(ConfigWarning::EmptyPattern {
                    advice: advice.name.clone(),
                    toml_path: format!("advice[{idx}].method_parameter_types[{pos}]"),
                });
            }
        }
        let markers: Vec<_> = params
            .iter()
            .enumerate()
            .filter(|(_, pattern)| pattern.trim() == "..")
            .map(|(pos, _)| pos)
            .collect();
        let misplaced = match markers.as_slice() {
            [] => None,
            [pos] if *pos + 1 == params.len() => None,
            [pos] => Some(*pos),
            [_, second, ..] => Some(*second),
        };
        if let Some(pos) = misplaced {
            out.push(ConfigWarning::MisplacedVariadicMarker {
                advice: advice.name.clone(),
                toml_path: format!("advice[{idx}].method_parameter_types[{pos}]"),
            });
        }
    }

    let hooks = &advice.hooks;
    let binds_traveler = [&hooks.on_return, &hooks.on_throw, &hooks.after]
        .into_iter()
        .flatten()
        .any(|bindings| bindings.contains(&Binding::Traveler));
    if binds_traveler && hooks.before.is_none() {
        out.push(ConfigWarning::TravelerWithoutBefore {
            advice: advice.name.clone(),
        });
    }
}
