use regex::Regex;

use crate::error::{Result, WeaveError};

/// A name pattern from an advice or mixin declaration.
///
/// * `""` and `*` match everything,
/// * `/expr/` is a regular expression matched against the whole name,
/// * `a|b` matches either side,
/// * `*` inside a name matches any run of characters,
/// * anything else matches exactly.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Any,
    Exact(String),
    Regex(Regex),
    Alternation(Vec<NamePattern>),
}

impl NamePattern {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text == "*" {
            return Ok(NamePattern::Any);
        }
        if text.len() >= 2 && text.starts_with('/') && text.ends_with('/') {
            return anchored(text, &text[1..text.len() - 1]).map(NamePattern::Regex);
        }
        if text.contains('|') {
            let alternatives = text
                .split('|')
                .map(str::trim)
                .filter(|alt| !alt.is_empty())
                .map(NamePattern::parse)
                .collect::<Result<Vec<_>>>()?;
            return Ok(match alternatives.len() {
                0 => NamePattern::Any,
                _ => NamePattern::Alternation(alternatives),
            });
        }
        if text.contains('*') {
            let expr = text
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            return anchored(text, &expr).map(NamePattern::Regex);
        }
        Ok(NamePattern::Exact(text.to_owned()))
    }

    /// Parses an optional constraint: blank text means "not constrained".
    pub fn parse_optional(text: &str) -> Result<Option<Self>> {
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Self::parse(text).map(Some)
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(exact) => exact == name,
            NamePattern::Regex(regex) => regex.is_match(name),
            NamePattern::Alternation(alternatives) => alternatives.iter().any(|alt| alt.matches(name)),
        }
    }

    /// Matches only through an exact alternative. Wildcards never select
    /// constructors, so `<init>` has to be spelled out.
    pub fn matches_literally(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(exact) => exact == name,
            NamePattern::Alternation(alternatives) => {
                alternatives.iter().any(|alt| alt.matches_literally(name))
            }
            NamePattern::Any | NamePattern::Regex(_) => false,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, NamePattern::Any)
    }
}

fn anchored(pattern: &str, expr: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{expr})$")).map_err(|err| WeaveError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: err.to_string(),
    })
}
