//! Output formatting for the REPL.
//!
//! Pipeline results are formatted differently depending on the audience:
//!
//! - **Interactive** → one typed value per line, strings quoted
//! - **Piped** → plain text per line, ready for other tools

use std::io::IsTerminal;

use pl_types::{Value, value_to_json};

/// Who reads the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    Interactive,
    Piped,
}

/// Detect the output context based on terminal state.
pub fn detect_context() -> OutputContext {
    if std::io::stdout().is_terminal() {
        OutputContext::Interactive
    } else {
        OutputContext::Piped
    }
}

/// Format pipeline outputs for the given context.
pub fn format_outputs(values: &[Value], context: OutputContext) -> String {
    match context {
        OutputContext::Interactive if values.is_empty() => "(no values)".to_string(),
        OutputContext::Interactive => values
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputContext::Piped => values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Format a value for display (with quotes on strings).
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Handle(h) => match h.text() {
            Some(text) => format!("<{} {text:?}>", h.type_name()),
            None => format!("<{}>", h.type_name()),
        },
        Value::Record(r) => format!("{} {}", r.name, value_to_json(value)),
        other => other.to_string(),
    }
}

/// Format a context value as indented JSON.
pub fn format_context(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value_to_json(value).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_types::Record;

    #[test]
    fn interactive_quotes_strings() {
        let values = [Value::from("hi"), Value::Int(3), Value::Float(0.5)];
        assert_eq!(
            format_outputs(&values, OutputContext::Interactive),
            "\"hi\"\n3\n0.5"
        );
    }

    #[test]
    fn piped_is_plain() {
        let values = [Value::from("hi"), Value::Bool(true)];
        assert_eq!(format_outputs(&values, OutputContext::Piped), "hi\ntrue");
        assert_eq!(format_outputs(&[], OutputContext::Piped), "");
    }

    #[test]
    fn empty_interactive() {
        assert_eq!(format_outputs(&[], OutputContext::Interactive), "(no values)");
    }

    #[test]
    fn records_show_their_name() {
        let r = Value::from(Record::new("point").field("x", 1));
        assert_eq!(format_value(&r), r#"point {"x":1}"#);
    }

    #[test]
    fn context_is_pretty_json() {
        let ctx = Value::map([("a", 1)]);
        assert_eq!(format_context(&ctx), "{\n  \"a\": 1\n}");
    }
}
