use schemars::schema::{RootSchema, Schema};
use schemars::schema_for;

use crate::StitchConfig;

/// JSON schema for `stitch.toml`, for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    let mut schema = schema_for!(StitchConfig);
    apply_semantic_constraints(&mut schema);
    schema
}

fn apply_semantic_constraints(schema: &mut RootSchema) {
    // Names key the hook catalog; an empty one can never be bound.
    for (definition, property) in [
        ("AdviceConfig", "name"),
        ("MixinConfig", "name"),
        ("ShimConfig", "name"),
        ("ShimConfig", "interface"),
    ] {
        require_non_empty(schema, definition, property);
    }
}

fn require_non_empty(schema: &mut RootSchema, definition: &str, property: &str) {
    let Some(Schema::Object(object)) = schema.definitions.get_mut(definition) else {
        return;
    };
    if let Some(Schema::Object(prop)) = object.object().properties.get_mut(property) {
        prop.string().min_length = Some(1);
    }
}
