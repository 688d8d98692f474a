//! Deciding whether an advice's pointcut selects a method of a class.
//!
//! A method is always looked at from a concrete class `C`: parameter and
//! return types are resolved through the generic bindings `C` supplies, and
//! class-side predicates may be satisfied by `C` itself or by any ancestor
//! that declares an equivalent method.

use stitch_classfile::{
    resolve_parameter_types_with, resolve_return_type_with, ClassMetadata, MethodMetadata, Modifiers,
};
use stitch_config::{AdviceConfig, MethodModifier};

use crate::error::Result;
use crate::pattern::NamePattern;
use crate::universe::{MethodRef, TypeUniverse};

/// The matchable part of an advice declaration, with patterns compiled.
#[derive(Debug, Clone)]
pub struct Pointcut {
    class_name: Option<NamePattern>,
    class_annotation: Option<NamePattern>,
    method_name: Option<NamePattern>,
    method_annotation: Option<NamePattern>,
    parameters: ParamPattern,
    return_type: ReturnPattern,
    modifiers: Vec<MethodModifier>,
    sub_type_restriction: Option<String>,
    super_type_restriction: Option<String>,
}

impl Pointcut {
    pub fn from_config(config: &AdviceConfig) -> Result<Self> {
        Ok(Self {
            class_name: NamePattern::parse_optional(&config.class_name)?,
            class_annotation: NamePattern::parse_optional(&config.class_annotation)?,
            method_name: NamePattern::parse_optional(&config.method_name)?,
            method_annotation: NamePattern::parse_optional(&config.method_annotation)?,
            parameters: ParamPattern::parse(config.method_parameter_types.as_deref())?,
            return_type: ReturnPattern::parse(&config.method_return_type)?,
            modifiers: config.method_modifiers.clone(),
            sub_type_restriction: non_blank(&config.sub_type_restriction),
            super_type_restriction: non_blank(&config.super_type_restriction),
        })
    }

    pub fn sub_type_restriction(&self) -> Option<&str> {
        self.sub_type_restriction.as_deref()
    }

    pub fn super_type_restriction(&self) -> Option<&str> {
        self.super_type_restriction.as_deref()
    }

    /// A pointcut with neither a class name nor a class annotation selects
    /// nothing.
    fn selects_classes(&self) -> bool {
        self.class_name.is_some() || self.class_annotation.is_some()
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Per-position parameter patterns.
#[derive(Debug, Clone)]
pub enum ParamPattern {
    /// No parameter constraint was declared.
    Any,
    /// `positions` must match one to one; with `trailing`, any number of
    /// further parameters may follow.
    List {
        positions: Vec<NamePattern>,
        trailing: bool,
    },
    /// Malformed list (a `..` that is not last, or more than one). Matches
    /// nothing.
    Never,
}

impl ParamPattern {
    pub fn parse(patterns: Option<&[String]>) -> Result<Self> {
        let Some(patterns) = patterns else {
            return Ok(ParamPattern::Any);
        };
        let markers = patterns.iter().filter(|p| p.trim() == "..").count();
        let trailing = patterns.last().is_some_and(|p| p.trim() == "..");
        if markers > 1 || (markers == 1 && !trailing) {
            return Ok(ParamPattern::Never);
        }
        let fixed = &patterns[..patterns.len() - usize::from(trailing)];
        let positions = fixed
            .iter()
            .map(|p| NamePattern::parse(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(ParamPattern::List {
            positions,
            trailing,
        })
    }

    pub fn matches(&self, parameter_types: &[String]) -> bool {
        match self {
            ParamPattern::Any => true,
            ParamPattern::Never => false,
            ParamPattern::List {
                positions,
                trailing,
            } => {
                let arity_ok = if *trailing {
                    parameter_types.len() >= positions.len()
                } else {
                    parameter_types.len() == positions.len()
                };
                arity_ok
                    && positions
                        .iter()
                        .zip(parameter_types)
                        .all(|(pattern, ty)| pattern.matches(ty))
            }
        }
    }
}

/// Return type constraint.
#[derive(Debug, Clone)]
pub enum ReturnPattern {
    Any,
    /// `com.acme.`: the return type must live under this package prefix.
    PackagePrefix(String),
    /// Wildcard or regex forms, matched by name only.
    Pattern(NamePattern),
    /// The return type must be assignable to one of these types.
    Assignable(Vec<String>),
}

impl ReturnPattern {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text == "*" {
            return Ok(ReturnPattern::Any);
        }
        if text.ends_with('.') {
            return Ok(ReturnPattern::PackagePrefix(text.to_owned()));
        }
        if text.contains('*') || text.starts_with('/') {
            return NamePattern::parse(text).map(ReturnPattern::Pattern);
        }
        Ok(ReturnPattern::Assignable(
            text.split('|')
                .map(str::trim)
                .filter(|alt| !alt.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }

    pub fn matches(&self, return_type: &str, universe: &TypeUniverse) -> bool {
        match self {
            ReturnPattern::Any => true,
            ReturnPattern::PackagePrefix(prefix) => return_type.starts_with(prefix.as_str()),
            ReturnPattern::Pattern(pattern) => pattern.matches(return_type),
            ReturnPattern::Assignable(targets) => targets
                .iter()
                .any(|target| universe.is_assignable(return_type, target)),
        }
    }
}

fn modifier_matches(modifier: MethodModifier, actual: Modifiers) -> bool {
    let has = |flag| actual.contains(flag);
    match modifier {
        MethodModifier::Public => has(Modifiers::PUBLIC),
        MethodModifier::Protected => has(Modifiers::PROTECTED),
        MethodModifier::Private => has(Modifiers::PRIVATE),
        MethodModifier::PackagePrivate => {
            !has(Modifiers::PUBLIC) && !has(Modifiers::PROTECTED) && !has(Modifiers::PRIVATE)
        }
        MethodModifier::Static => has(Modifiers::STATIC),
        MethodModifier::NotStatic => !has(Modifiers::STATIC),
        MethodModifier::Final => has(Modifiers::FINAL),
        MethodModifier::NotFinal => !has(Modifiers::FINAL),
        MethodModifier::Synchronized => has(Modifiers::SYNCHRONIZED),
        MethodModifier::NotSynchronized => !has(Modifiers::SYNCHRONIZED),
    }
}

/// A method of some class together with its types as seen from a concrete
/// class.
#[derive(Debug, Clone)]
pub struct MethodView {
    pub method: MethodRef,
    pub parameter_types: Vec<String>,
    pub return_type: String,
}

impl MethodView {
    pub fn method(&self) -> &MethodMetadata {
        self.method.method()
    }

    pub fn owner(&self) -> &ClassMetadata {
        &self.method.owner
    }
}

pub struct PointcutMatcher<'u> {
    universe: &'u TypeUniverse,
}

impl<'u> PointcutMatcher<'u> {
    pub fn new(universe: &'u TypeUniverse) -> Self {
        Self { universe }
    }

    /// Resolves `method` (declared on `method.owner`) as seen from `class`.
    pub fn view(&self, class: &ClassMetadata, method: &MethodRef) -> Result<MethodView> {
        let mapping = self.universe.type_mapping(&class.name, method.owner_name());
        Ok(MethodView {
            method: method.clone(),
            parameter_types: resolve_parameter_types_with(method.method(), &mapping)?,
            return_type: resolve_return_type_with(method.method(), &mapping)?,
        })
    }

    /// Whether `pointcut` selects the method `name` + `descriptor` on `class`.
    /// The method may be declared on `class` or inherited by it.
    pub fn matches(
        &self,
        pointcut: &Pointcut,
        class: &ClassMetadata,
        name: &str,
        descriptor: &str,
    ) -> Result<bool> {
        let method = match self.universe.method_ref(&class.name, name, descriptor) {
            Some(method) => method,
            None => return Ok(false),
        };
        let view = self.view(class, &method)?;
        self.matches_view(pointcut, class, &view)
    }

    pub fn matches_view(&self, pointcut: &Pointcut, class: &ClassMetadata, view: &MethodView) -> Result<bool> {
        if !pointcut.selects_classes() {
            return Ok(false);
        }
        let method = view.method();
        if !self.method_side_matches(pointcut, view) {
            return Ok(false);
        }

        if let Some(sub) = pointcut.sub_type_restriction() {
            // Static check only; the receiver is checked on every call.
            if !self.universe.is_assignable(&class.name, sub)
                && !self.universe.is_assignable(sub, &class.name)
            {
                return Ok(false);
            }
        }
        if let Some(sup) = pointcut.super_type_restriction() {
            if !self.satisfies_super_restriction(class, view, sup)? {
                return Ok(false);
            }
        }

        if self.class_side_matches(pointcut, class) {
            return Ok(true);
        }
        if !method.is_inheritable() {
            return Ok(false);
        }
        for ancestor in self.universe.ancestors(&class.name).iter() {
            let Some(candidate) = self.universe.get(ancestor) else {
                continue;
            };
            if self.class_side_matches(pointcut, &candidate)
                && self.declares_equivalent(class, &candidate, view)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn method_side_matches(&self, pointcut: &Pointcut, view: &MethodView) -> bool {
        let method = view.method();
        if let Some(pattern) = &pointcut.method_name {
            let named = if method.is_constructor() {
                pattern.matches_literally(&method.name)
            } else {
                pattern.matches(&method.name)
            };
            if !named {
                return false;
            }
        } else if method.is_constructor() {
            return false;
        }
        if let Some(pattern) = &pointcut.method_annotation {
            if !method.annotations.iter().any(|ann| pattern.matches(ann)) {
                return false;
            }
        }
        pointcut
            .modifiers
            .iter()
            .all(|modifier| modifier_matches(*modifier, method.modifiers))
            && pointcut.parameters.matches(&view.parameter_types)
            && pointcut.return_type.matches(&view.return_type, self.universe)
    }

    fn class_side_matches(&self, pointcut: &Pointcut, candidate: &ClassMetadata) -> bool {
        pointcut
            .class_name
            .as_ref()
            .map_or(true, |pattern| pattern.matches(&candidate.name))
            && pointcut.class_annotation.as_ref().map_or(true, |pattern| {
                candidate.annotations.iter().any(|ann| pattern.matches(ann))
            })
    }

    /// Whether `candidate` declares a method `class` would dispatch the
    /// viewed method through: same name and the same parameter types once
    /// both sides are resolved from `class`.
    fn declares_equivalent(
        &self,
        class: &ClassMetadata,
        candidate: &ClassMetadata,
        view: &MethodView,
    ) -> Result<bool> {
        if candidate.name == view.owner().name {
            return Ok(true);
        }
        let method = view.method();
        let mapping = self.universe.type_mapping(&class.name, &candidate.name);
        for declared in &candidate.methods {
            if declared.name != method.name || !declared.is_inheritable() {
                continue;
            }
            if resolve_parameter_types_with(declared, &mapping)? == view.parameter_types {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The method must resolve, within the restriction type, to the very
    /// declaration `class` uses: defined there, or inherited unmodified from
    /// it. Implementing an abstract declaration counts; overriding a concrete
    /// one below the restriction does not.
    fn satisfies_super_restriction(
        &self,
        class: &ClassMetadata,
        view: &MethodView,
        sup: &str,
    ) -> Result<bool> {
        if !self.universe.is_assignable(&class.name, sup) {
            return Ok(false);
        }
        if class.name == sup {
            return Ok(true);
        }
        let Some(restricted) = self.resolve_in(class, sup, view)? else {
            return Ok(false);
        };
        Ok(restricted.owner_name() == view.owner().name || restricted.method().is_abstract())
    }

    /// The declaration of the viewed method in `sup`'s effective set. A
    /// generic supertype may declare it under an erased descriptor, so this
    /// falls back to comparing resolved parameter types.
    fn resolve_in(&self, class: &ClassMetadata, sup: &str, view: &MethodView) -> Result<Option<MethodRef>> {
        let method = view.method();
        let effective = self.universe.effective_methods(sup);
        if let Some(found) = effective.get(&method.name, &method.descriptor) {
            return Ok(Some(found.clone()));
        }
        for candidate in effective.iter() {
            if candidate.method().name != method.name {
                continue;
            }
            let mapping = self.universe.type_mapping(&class.name, candidate.owner_name());
            if resolve_parameter_types_with(candidate.method(), &mapping)? == view.parameter_types {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }
}
