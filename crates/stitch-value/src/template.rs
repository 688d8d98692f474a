use crate::path::{PathEvaluator, ValuePath};
use crate::value::Value;

/// A diagnostic message with `{{...}}` placeholders.
///
/// Placeholder roots: `this` (the receiver), a zero-based argument index,
/// `_` (the return value) and `methodName`. Anything after the root is a
/// [`ValuePath`], e.g. `{{0.headers.size}}` or `{{this.body|charset:UTF-8}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    parts: Vec<TemplatePart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Receiver(ValuePath),
    Arg(usize, ValuePath),
    Return(ValuePath),
    MethodName,
}

/// The invocation a template is rendered against.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub receiver: Option<&'a Value>,
    pub args: &'a [Value],
    pub returned: Option<&'a Value>,
    pub method_name: &'a str,
}

impl<'a> MessageContext<'a> {
    pub fn new(method_name: &'a str, args: &'a [Value]) -> Self {
        Self {
            receiver: None,
            args,
            returned: None,
            method_name,
        }
    }

    pub fn with_receiver(mut self, receiver: &'a Value) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_return(mut self, returned: &'a Value) -> Self {
        self.returned = Some(returned);
        self
    }
}

impl MessageTemplate {
    pub fn parse(text: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(open) = rest.find("{{") {
            let Some(close) = rest[open + 2..].find("}}").map(|rel| open + 2 + rel) else {
                break;
            };
            literal.push_str(&rest[..open]);
            match parse_placeholder(&rest[open + 2..close]) {
                Some(part) => {
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                }
                None => literal.push_str(&rest[open..close + 2]),
            }
            rest = &rest[close + 2..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }
        Self { parts }
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn render(&self, ctx: &MessageContext<'_>) -> String {
        self.render_with(PathEvaluator::shared(), ctx)
    }

    /// Renders every placeholder; failures become inline placeholder text and
    /// never abort the rest of the message.
    pub fn render_with(&self, evaluator: &PathEvaluator, ctx: &MessageContext<'_>) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::MethodName => out.push_str(ctx.method_name),
                TemplatePart::Receiver(path) => {
                    out.push_str(&evaluator.render(ctx.receiver.unwrap_or(&Value::Null), path));
                }
                TemplatePart::Return(path) => {
                    out.push_str(&evaluator.render(ctx.returned.unwrap_or(&Value::Null), path));
                }
                TemplatePart::Arg(index, path) => match ctx.args.get(*index) {
                    Some(arg) => out.push_str(&evaluator.render(arg, path)),
                    None => out.push_str(&format!("<requested arg index out of bounds: {index}>")),
                },
            }
        }
        out
    }
}

fn parse_placeholder(inner: &str) -> Option<TemplatePart> {
    let inner = inner.trim();
    let split = inner.find(['.', '|']).unwrap_or(inner.len());
    let (root, tail) = inner.split_at(split);
    let path = ValuePath::parse(tail.strip_prefix('.').unwrap_or(tail));

    match root {
        "this" => Some(TemplatePart::Receiver(path)),
        "_" => Some(TemplatePart::Return(path)),
        "methodName" if path.is_empty() => Some(TemplatePart::MethodName),
        _ => match root.parse::<usize>() {
            Ok(index) => Some(TemplatePart::Arg(index, path)),
            Err(_) => {
                tracing::debug!(target: "stitch.value", placeholder = inner, "unknown template placeholder");
                None
            }
        },
    }
}
