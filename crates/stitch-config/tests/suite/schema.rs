use stitch_config::json_schema;

#[test]
fn schema_covers_every_section_and_requires_names() {
    let schema = serde_json::to_value(json_schema()).expect("schema serializes");

    let properties = &schema["properties"];
    for section in ["logging", "advice", "mixin", "shim"] {
        assert!(properties.get(section).is_some(), "missing {section}");
    }

    let advice = &schema["definitions"]["AdviceConfig"];
    assert_eq!(advice["properties"]["name"]["minLength"], 1);
    assert_eq!(advice["required"], serde_json::json!(["name"]));

    let binding = serde_json::to_string(&schema["definitions"]["Binding"]).unwrap();
    assert!(binding.contains("optional_return"), "{binding}");
    assert!(binding.contains("parameter"), "{binding}");
}
