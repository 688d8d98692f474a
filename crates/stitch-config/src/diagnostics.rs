use serde::de::DeserializeOwned;

/// Diagnostics produced while loading a stitch config.
///
/// Loading is best effort: callers get a `StitchConfig` whenever deserialization succeeds,
/// plus whatever looked wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the TOML that the schema does not know, with full paths
    /// (`advice[0].prority`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    DuplicateAdviceName {
        name: String,
    },
    /// `..` used anywhere but the last parameter pattern, or more than once.
    /// The advice will never match.
    MisplacedVariadicMarker {
        advice: String,
        toml_path: String,
    },
    /// Neither a class name nor a class annotation; the advice matches nothing.
    MissingClassPattern {
        advice: String,
    },
    EmptyPattern {
        advice: String,
        toml_path: String,
    },
    /// A traveler is bound but the advice has no before hook to produce it.
    TravelerWithoutBefore {
        advice: String,
    },
    MixinWithoutTargets {
        mixin: String,
    },
    LoggingLevelInvalid {
        value: String,
        normalized: String,
    },
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(normalize_serde_ignored_path(path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

fn normalize_serde_ignored_path(path: serde_ignored::Path) -> String {
    // `serde_ignored` renders a leading `.` and sequence indices as `.0`; TOML users expect
    // `advice[0].name`.
    let raw = path.to_string();
    let raw = raw.trim_start_matches('.');
    raw.split('.')
        .enumerate()
        .fold(String::new(), |mut out, (idx, segment)| {
            let is_index =
                idx > 0 && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
            if is_index {
                out.push('[');
                out.push_str(segment);
                out.push(']');
                return out;
            }

            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
            out
        })
}
