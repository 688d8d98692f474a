use pretty_assertions::assert_eq;
use stitch_value::{MessageContext, MessageTemplate, PathEvaluator, Value};

use super::host::Bean;

#[test]
fn renders_receiver_arguments_return_and_method_name() {
    let receiver = Bean::new("com.acme.Dao")
        .getter("getTable", "users")
        .into_value();
    let args = [Value::from("alice"), Value::Int(3)];
    let returned = Value::List(vec![Value::Int(1), Value::Int(2)]);
    let ctx = MessageContext::new("findByName", &args)
        .with_receiver(&receiver)
        .with_return(&returned);

    let template =
        MessageTemplate::parse("{{this.table}}.{{methodName}}({{0}}, {{1}}) => {{_.size}} rows");
    assert_eq!(
        template.render_with(&PathEvaluator::new(), &ctx),
        "users.findByName(alice, 3) => 2 rows"
    );
}

#[test]
fn failures_stay_inline_and_do_not_abort_the_message() {
    let receiver = Bean::new("com.acme.Dao")
        .throwing("getTable", "java.lang.RuntimeException", "closed")
        .into_value();
    let args: [Value; 0] = [];
    let ctx = MessageContext::new("query", &args).with_receiver(&receiver);

    let template = MessageTemplate::parse("[{{this.table}}] [{{0}}] [{{this.missing.deeper}}] done");
    assert_eq!(
        template.render_with(&PathEvaluator::new(), &ctx),
        "[<error evaluating: java.lang.RuntimeException closed>] \
         [<requested arg index out of bounds: 0>] [null] done"
    );
}
