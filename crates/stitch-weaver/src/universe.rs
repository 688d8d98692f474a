//! The hierarchy view the matcher and planner work against.
//!
//! Classes are registered as the host loads them. Everything derived from the
//! registered set (ancestor lists, effective method sets, generic mappings) is
//! computed lazily, at most once per key, and dropped again on invalidation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use stitch_classfile::{ClassMetadata, ClassSignature, MethodMetadata, TypeMapping, OBJECT};

use crate::once_map::OnceMap;

#[derive(Default)]
pub struct TypeUniverse {
    classes: RwLock<HashMap<String, Arc<ClassMetadata>>>,
    ancestors: OnceMap<String, Arc<[String]>>,
    effective: OnceMap<String, Arc<EffectiveMethods>>,
    mappings: OnceMap<(String, String), Arc<TypeMapping>>,
}

/// A method as seen from some class: the class that declares it plus the
/// method itself.
#[derive(Debug, Clone)]
pub struct MethodRef {
    pub owner: Arc<ClassMetadata>,
    index: usize,
}

impl MethodRef {
    pub fn method(&self) -> &MethodMetadata {
        &self.owner.methods[self.index]
    }

    pub fn owner_name(&self) -> &str {
        &self.owner.name
    }
}

/// Every method callable on instances of a class, one entry per
/// name + descriptor, however many paths lead to it.
#[derive(Debug, Default)]
pub struct EffectiveMethods {
    entries: Vec<MethodRef>,
    index: HashMap<(String, String), usize>,
}

impl EffectiveMethods {
    pub fn get(&self, name: &str, descriptor: &str) -> Option<&MethodRef> {
        self.index
            .get(&(name.to_owned(), descriptor.to_owned()))
            .map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodRef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First declaration wins.
    fn offer(&mut self, owner: &Arc<ClassMetadata>, index: usize) {
        let method = &owner.methods[index];
        let key = (method.name.clone(), method.descriptor.clone());
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(MethodRef {
            owner: Arc::clone(owner),
            index,
        });
    }
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a class. Derived data is dropped since any class
    /// below the replaced one may depend on it.
    pub fn register(&self, class: ClassMetadata) -> Arc<ClassMetadata> {
        let class = Arc::new(class);
        let previous = self
            .classes
            .write()
            .insert(class.name.clone(), Arc::clone(&class));
        if previous.is_some() {
            tracing::debug!(target: "stitch.weaver", class = %class.name, "class re-registered");
        }
        self.clear_derived();
        class
    }

    pub fn remove(&self, name: &str) -> Option<Arc<ClassMetadata>> {
        let removed = self.classes.write().remove(name);
        if removed.is_some() {
            self.clear_derived();
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassMetadata>> {
        self.classes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.read().keys().cloned().collect()
    }

    /// Drops every cached ancestor list, method set and type mapping.
    pub fn clear_derived(&self) {
        self.ancestors.clear();
        self.effective.clear();
        self.mappings.clear();
    }

    /// All supertypes of `name`, breadth first, superclass before interfaces
    /// at each level, each listed once. Unregistered supertypes are listed but
    /// not expanded.
    pub fn ancestors(&self, name: &str) -> Arc<[String]> {
        self.ancestors
            .get_or_init(&name.to_owned(), || self.compute_ancestors(name).into())
    }

    fn compute_ancestors(&self, name: &str) -> Vec<String> {
        let mut seen = HashSet::from([name.to_owned()]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([name.to_owned()]);
        while let Some(current) = queue.pop_front() {
            let Some(class) = self.get(&current) else {
                continue;
            };
            for parent in class.super_name.iter().chain(class.interfaces.iter()) {
                if seen.insert(parent.clone()) {
                    out.push(parent.clone());
                    queue.push_back(parent.clone());
                }
            }
        }
        out
    }

    /// Whether a value of type `sub` can be used where `sup` is expected.
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        if is_primitive(sub) || is_primitive(sup) {
            return false;
        }
        if sup == OBJECT {
            return true;
        }
        if let (Some(sub_component), Some(sup_component)) =
            (sub.strip_suffix("[]"), sup.strip_suffix("[]"))
        {
            return self.is_assignable(sub_component, sup_component);
        }
        if sub.ends_with("[]") {
            return matches!(sup, "java.lang.Cloneable" | "java.io.Serializable");
        }
        self.ancestors(sub).iter().any(|ancestor| ancestor == sup)
    }

    /// The memoized effective method set of a registered class.
    ///
    /// Declared methods come first, then those inherited along the
    /// superclass chain, then interface methods nobody in the chain declares.
    /// A class method always shadows an interface default.
    pub fn effective_methods(&self, name: &str) -> Arc<EffectiveMethods> {
        self.effective
            .get_or_init(&name.to_owned(), || Arc::new(self.compute_effective(name)))
    }

    fn compute_effective(&self, name: &str) -> EffectiveMethods {
        let mut methods = EffectiveMethods::default();
        let Some(class) = self.get(name) else {
            return methods;
        };
        for index in 0..class.methods.len() {
            methods.offer(&class, index);
        }

        let mut chain = Vec::new();
        let mut visited = HashSet::from([class.name.clone()]);
        let mut next = class.super_name.clone();
        while let Some(super_name) = next.take() {
            if !visited.insert(super_name.clone()) {
                break;
            }
            let Some(super_class) = self.get(&super_name) else {
                break;
            };
            next = super_class.super_name.clone();
            chain.push(super_class);
        }

        let interfaces: Vec<_> = self
            .ancestors(name)
            .iter()
            .filter_map(|ancestor| self.get(ancestor))
            .filter(|ancestor| ancestor.is_interface())
            .collect();

        for owner in chain.iter().chain(interfaces.iter()) {
            for (index, method) in owner.methods.iter().enumerate() {
                if method.is_inheritable() {
                    methods.offer(owner, index);
                }
            }
        }
        methods
    }

    /// Bindings for `ancestor`'s type parameters as seen from `class`.
    ///
    /// Empty when `class` is `ancestor`, when the two are unrelated, or when
    /// the path between them is raw.
    pub fn type_mapping(&self, class: &str, ancestor: &str) -> Arc<TypeMapping> {
        if class == ancestor {
            return Arc::new(TypeMapping::new());
        }
        self.mappings
            .get_or_init(&(class.to_owned(), ancestor.to_owned()), || {
                Arc::new(self.compute_mapping(class, ancestor))
            })
    }

    fn compute_mapping(&self, class: &str, ancestor: &str) -> TypeMapping {
        let Some(path) = self.supertype_path(class, ancestor) else {
            return TypeMapping::new();
        };
        let mut mapping = TypeMapping::new();
        for step in path.windows(2) {
            let subject = self.signature_of(&step[0]);
            let supertype = self.signature_of(&step[1]);
            mapping = TypeMapping::for_supertype(&subject, &step[1], &supertype, &mapping);
        }
        mapping
    }

    /// Shortest `class .. ancestor` path through declared supertypes.
    fn supertype_path(&self, class: &str, ancestor: &str) -> Option<Vec<String>> {
        let mut parents: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::from([class.to_owned()]);
        let mut seen = HashSet::from([class.to_owned()]);
        while let Some(current) = queue.pop_front() {
            if current == ancestor {
                let mut path = vec![current];
                while let Some(parent) = parents.get(&path[path.len() - 1]) {
                    path.push(parent.clone());
                }
                path.reverse();
                return Some(path);
            }
            let Some(meta) = self.get(&current) else {
                continue;
            };
            for parent in meta.super_name.iter().chain(meta.interfaces.iter()) {
                if seen.insert(parent.clone()) {
                    parents.insert(parent.clone(), current.clone());
                    queue.push_back(parent.clone());
                }
            }
        }
        None
    }

    fn signature_of(&self, name: &str) -> ClassSignature {
        self.get(name)
            .and_then(|class| class.generic.clone())
            .unwrap_or_default()
    }

    pub(crate) fn method_ref(&self, class: &str, name: &str, descriptor: &str) -> Option<MethodRef> {
        self.effective_methods(class).get(name, descriptor).cloned()
    }
}

fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "void" | "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double"
    )
}
