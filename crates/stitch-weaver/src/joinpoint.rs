use std::collections::HashMap;
use std::sync::Arc;

use stitch_classfile::MethodMetadata;

use crate::advice::Advice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPointKind {
    /// A method body declared by the class itself.
    Declared,
    /// An inherited method the class gains an override for, because advices
    /// select it here that do not select it where it is declared. The
    /// override runs those advices and delegates to the inherited body.
    InheritedOverride,
}

/// An instrumented method with its advices in execution order.
///
/// Immutable once built; shared by every invocation of the method.
#[derive(Debug)]
pub struct JoinPoint {
    pub class_name: String,
    /// Class that declares the method body.
    pub owner: String,
    pub method: MethodMetadata,
    pub kind: JoinPointKind,
    /// Parameter types as resolved from `class_name`.
    pub parameter_types: Vec<String>,
    pub return_type: String,
    pub advices: Vec<Arc<Advice>>,
}

impl JoinPoint {
    pub fn is_constructor(&self) -> bool {
        self.method.is_constructor()
    }

    pub fn is_static(&self) -> bool {
        self.method.is_static()
    }

    pub fn is_void(&self) -> bool {
        self.return_type == "void"
    }

    pub fn advice_names(&self) -> Vec<&str> {
        self.advices.iter().map(|a| a.name()).collect()
    }
}

/// All join points of one class.
#[derive(Debug, Default)]
pub struct ClassJoinPoints {
    pub class_name: String,
    join_points: Vec<Arc<JoinPoint>>,
    index: HashMap<(String, String), usize>,
}

impl ClassJoinPoints {
    pub(crate) fn new(class_name: impl Into<String>, join_points: Vec<Arc<JoinPoint>>) -> Self {
        let index = join_points
            .iter()
            .enumerate()
            .map(|(idx, jp)| ((jp.method.name.clone(), jp.method.descriptor.clone()), idx))
            .collect();
        Self {
            class_name: class_name.into(),
            join_points,
            index,
        }
    }

    pub fn get(&self, name: &str, descriptor: &str) -> Option<&Arc<JoinPoint>> {
        self.index
            .get(&(name.to_owned(), descriptor.to_owned()))
            .map(|&idx| &self.join_points[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<JoinPoint>> {
        self.join_points.iter()
    }

    pub fn len(&self) -> usize {
        self.join_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_points.is_empty()
    }
}
