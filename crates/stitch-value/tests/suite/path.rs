use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;
use stitch_value::{PathError, PathEvaluator, Thrown, Value, ValuePath};

use super::host::Bean;

fn eval(root: &Value, path: &str) -> Value {
    PathEvaluator::new().evaluate(root, &ValuePath::parse(path))
}

fn render(root: &Value, path: &str) -> String {
    PathEvaluator::new().render(root, &ValuePath::parse(path))
}

fn order() -> Value {
    let lines = vec![
        Bean::new("com.acme.Line").getter("getSku", "A-1").into_value(),
        Bean::new("com.acme.Line").getter("getSku", "B-2").into_value(),
    ];
    Bean::new("com.acme.Order")
        .getter("getId", 42)
        .getter("isPaid", true)
        .getter("getCustomer", Value::Null)
        .getter("getLines", Value::List(lines))
        .field("status", "OPEN")
        .throwing("getTotal", "java.lang.IllegalStateException", "not priced")
        .into_value()
}

#[test]
fn resolves_getters_is_accessors_and_fields() {
    let order = order();
    assert_eq!(eval(&order, "id"), Value::Int(42));
    assert_eq!(eval(&order, "paid"), Value::Bool(true));
    assert_eq!(eval(&order, "status"), Value::Str("OPEN".to_owned()));
    assert_eq!(eval(&order, "unknown"), Value::Null);
}

#[test]
fn empty_path_is_the_root() {
    let root = Value::Int(5);
    assert_eq!(eval(&root, ""), Value::Int(5));
}

#[test]
fn nested_null_short_circuits() {
    assert_eq!(eval(&order(), "customer.address.city"), Value::Null);
}

#[test]
fn throwing_accessor_renders_placeholder() {
    let order = order();
    assert_eq!(
        render(&order, "total"),
        "<error evaluating: java.lang.IllegalStateException not priced>"
    );
    assert_eq!(
        PathEvaluator::new().try_evaluate(&order, &ValuePath::parse("total.amount")),
        Err(PathError::Evaluation(Thrown::new(
            "java.lang.IllegalStateException",
            "not priced"
        )))
    );
}

#[test]
fn collections_support_size_index_and_wildcard() {
    let order = order();
    assert_eq!(eval(&order, "lines.size"), Value::Int(2));
    assert_eq!(eval(&order, "lines.length"), Value::Int(2));
    assert_eq!(eval(&order, "lines.1.sku"), Value::Str("B-2".to_owned()));
    assert_eq!(
        eval(&order, "lines.*.sku"),
        Value::List(vec!["A-1".into(), "B-2".into()])
    );
    assert_eq!(
        eval(&order, "lines.sku"),
        Value::List(vec!["A-1".into(), "B-2".into()])
    );
    assert_eq!(render(&order, "lines.5.sku"), "<requested index out of bounds: 5>");
}

#[test]
fn host_collections_use_their_elements() {
    let list = Bean::new("java.util.ArrayList")
        .elements(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        .into_value();
    assert_eq!(eval(&list, "size"), Value::Int(3));
    assert_eq!(eval(&list, "2"), Value::Int(3));
}

#[test]
fn maps_are_navigated_by_key() {
    let mut headers = BTreeMap::new();
    headers.insert("host".to_owned(), Value::from("example.com"));
    let root = Value::Map(headers);
    assert_eq!(eval(&root, "host"), Value::from("example.com"));
    assert_eq!(eval(&root, "size"), Value::Int(1));
    assert_eq!(eval(&root, "missing"), Value::Null);
}

#[test]
fn byte_arrays_render_hex_or_decoded() {
    let root = Bean::new("com.acme.Message")
        .getter("getBody", Value::Bytes(b"hi".to_vec()))
        .into_value();
    assert_eq!(render(&root, "body"), "6869");
    assert_eq!(render(&root, "body|charset:default"), "hi");
    assert_eq!(render(&root, "body|charset:UTF-16BE"), "\u{6869}");
    assert_eq!(render(&root, "body|charset:EBCDIC"), "<unsupported charset: EBCDIC>");
    assert_eq!(eval(&root, "body.length"), Value::Int(2));
}

#[test]
fn accessor_lookups_are_cached_per_type_and_segment() {
    let bean = Bean::new("com.acme.Cached").getter("getName", "x");
    let lookups = bean.lookups.clone();
    let root = bean.into_value();

    let evaluator = PathEvaluator::new();
    let path = ValuePath::parse("name");
    for _ in 0..5 {
        assert_eq!(evaluator.evaluate(&root, &path), Value::from("x"));
    }
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    evaluator.clear_cache();
    evaluator.evaluate(&root, &path);
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}
