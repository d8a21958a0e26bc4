//! regex — Match strings against a pattern.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use pl_types::{Opaque, Signature, TextRender, Value, ValueType};

use crate::functions::{Function, FunctionError, str_arg};

/// Type name of [`RegexMatch`] handles.
pub const REGEX_MATCH: &str = "RegexMatch";

/// One input that matched, with its capture groups.
///
/// Travels through pipelines as an opaque handle and renders as the matched
/// input, so it can be passed wherever a string is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexMatch {
    /// The whole input string.
    pub source: String,
    /// Capture groups by position, excluding the whole match. Groups that did
    /// not participate are empty.
    pub by_index: Vec<String>,
    /// Named capture groups.
    pub by_name: BTreeMap<String, String>,
}

impl TextRender for RegexMatch {
    fn render_text(&self) -> String {
        self.source.clone()
    }
}

impl Opaque for RegexMatch {
    fn type_name(&self) -> &str {
        REGEX_MATCH
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_text_render(&self) -> Option<&dyn TextRender> {
        Some(self)
    }
}

/// `(regex PATTERN INPUT...)`: one match handle per input that matches.
///
/// Inputs that do not match are skipped.
pub struct Regex;

static SIGNATURE: LazyLock<Signature> = LazyLock::new(|| {
    Signature::new()
        .param(ValueType::String)
        .variadic(ValueType::String)
        .returns(ValueType::List)
        .fallible()
});

impl Function for Regex {
    fn signature(&self) -> &Signature {
        &SIGNATURE
    }

    fn call(&self, args: Vec<Value>) -> Result<Value, FunctionError> {
        let pattern = regex::Regex::new(str_arg(&args, 0)?)
            .map_err(|e| FunctionError::new(format!("failed to compile regex: {e}")))?;
        let names: Vec<Option<&str>> = pattern.capture_names().skip(1).collect();

        let mut matches = Vec::with_capacity(args.len().saturating_sub(1));
        for index in 1..args.len() {
            let input = str_arg(&args, index)?;
            let Some(captures) = pattern.captures(input) else {
                continue;
            };

            let group = |i: usize| {
                captures
                    .get(i)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            };
            let by_index = (1..captures.len()).map(group).collect();
            let by_name = names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| name.map(|n| (n.to_string(), group(i + 1))))
                .collect();

            matches.push(Value::handle(RegexMatch {
                source: input.to_string(),
                by_index,
                by_name,
            }));
        }

        tracing::trace!(inputs = args.len() - 1, matched = matches.len(), "regex");
        Ok(Value::List(matches))
    }
}
