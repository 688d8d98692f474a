use std::sync::Arc;

use stitch_classfile::ClassMetadata;

use crate::joinpoint::JoinPoint;
use crate::once_map::OnceMap;

/// Class facts handed to hooks that bind `class_meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMeta {
    pub class_name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub annotations: Vec<String>,
}

/// Method facts handed to hooks that bind `method_meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMeta {
    pub class_name: String,
    pub method_name: String,
    pub descriptor: String,
    pub parameter_types: Vec<String>,
    pub return_type: String,
}

/// Metadata objects are built the first time a hook binds them and shared
/// afterwards. Method metadata is keyed by class, method name and descriptor.
#[derive(Default)]
pub(crate) struct MetaCache {
    classes: OnceMap<String, Arc<ClassMeta>>,
    methods: OnceMap<(String, String, String), Arc<MethodMeta>>,
}

impl MetaCache {
    pub(crate) fn class_meta(&self, join_point: &JoinPoint, class: Option<&ClassMetadata>) -> Arc<ClassMeta> {
        self.classes.get_or_init(&join_point.class_name, || {
            Arc::new(ClassMeta {
                class_name: join_point.class_name.clone(),
                super_name: class.and_then(|c| c.super_name.clone()),
                interfaces: class.map(|c| c.interfaces.clone()).unwrap_or_default(),
                annotations: class.map(|c| c.annotations.clone()).unwrap_or_default(),
            })
        })
    }

    pub(crate) fn method_meta(&self, join_point: &JoinPoint) -> Arc<MethodMeta> {
        let key = (
            join_point.class_name.clone(),
            join_point.method.name.clone(),
            join_point.method.descriptor.clone(),
        );
        self.methods.get_or_init(&key, || {
            Arc::new(MethodMeta {
                class_name: join_point.class_name.clone(),
                method_name: join_point.method.name.clone(),
                descriptor: join_point.method.descriptor.clone(),
                parameter_types: join_point.parameter_types.clone(),
                return_type: join_point.return_type.clone(),
            })
        })
    }

    pub(crate) fn invalidate(&self, class: &str) {
        self.classes.remove(&class.to_owned());
        self.methods.retain(|(owner, _, _)| owner != class);
    }

    pub(crate) fn clear(&self) {
        self.classes.clear();
        self.methods.clear();
    }
}
