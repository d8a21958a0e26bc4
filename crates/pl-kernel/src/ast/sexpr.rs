//! S-expression rendering of the AST.
//!
//! A compact, stable text form used by snapshot tests and the REPL's `/ast`
//! mode. Every node renders on one line:
//!
//! ```text
//! (pipeline (call sum (int 1) (ref .a[0]) (pipeline (call pass (str "x")))))
//! ```

use super::types::{Argument, Call, Pipeline};

pub fn format_pipeline(pipeline: &Pipeline) -> String {
    let mut out = String::from("(pipeline");
    for call in &pipeline.calls {
        out.push(' ');
        out.push_str(&format_call(call));
    }
    out.push(')');
    out
}

pub fn format_call(call: &Call) -> String {
    let mut out = format!("(call {}", call.name);
    for arg in &call.args {
        out.push(' ');
        out.push_str(&format_argument(arg));
    }
    out.push(')');
    out
}

pub fn format_argument(arg: &Argument) -> String {
    match arg {
        Argument::String(s) => format!("(str {s:?})"),
        Argument::Float(f) => format!("(float {f:?})"),
        Argument::Int(n) => format!("(int {n})"),
        Argument::Reference(r) => format!("(ref {r})"),
        Argument::Nested(p) => format_pipeline(p),
    }
}
