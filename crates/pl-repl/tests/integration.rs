//! Integration tests for the pl REPL.
//!
//! These tests run lines through `Repl::process_line` and check the output.

use pl_repl::{Repl, is_exit};
use pl_types::Value;
use rstest::rstest;

/// Run lines through a REPL and collect their outputs.
fn run_lines(repl: &mut Repl, lines: &[&str]) -> Vec<String> {
    let mut outputs = Vec::new();
    for line in lines {
        match repl.process_line(line) {
            Ok(Some(output)) => outputs.push(output),
            Ok(None) => {}
            Err(e) => outputs.push(format!("ERROR: {}", e)),
        }
    }
    outputs
}

fn eval(line: &str) -> String {
    let mut repl = Repl::new();
    repl.process_line(line)
        .expect("line processed")
        .expect("line produces output")
}

#[test]
fn evaluates_pipelines() {
    assert_eq!(eval("(pass 1 2 | pass 0)"), "0\n1\n2");
}

#[test]
fn strings_are_quoted() {
    assert_eq!(eval(r#"(printf "%s-%d" "a" 7)"#), "\"a-7\"");
}

#[test]
fn empty_line_is_silent() {
    let mut repl = Repl::new();
    assert_eq!(repl.process_line("   ").expect("processed"), None);
}

#[test]
fn parse_errors_are_reported() {
    let output = eval("((pass))");
    assert!(output.starts_with("Parse error:"), "{output}");
}

#[test]
fn evaluation_errors_are_reported() {
    assert_eq!(eval("(nope)"), "Error: fn[0] nope: not defined");
}

#[test]
fn empty_result() {
    assert_eq!(eval("(pass)"), "(no values)");
}

#[rstest]
#[case("/quit")]
#[case("/q")]
#[case("/exit")]
#[case("quit")]
#[case("exit")]
fn exit_commands(#[case] line: &str) {
    let mut repl = Repl::new();
    let err = repl.process_line(line).expect_err("exit requested");
    assert!(is_exit(&err));
}

#[test]
fn help_lists_commands() {
    for line in ["/help", "help", "/?"] {
        let output = eval(line);
        assert!(output.contains("/functions"), "{line}");
    }
}

#[test]
fn ast_mode_toggles() {
    let mut repl = Repl::new();
    let outputs = run_lines(&mut repl, &["/ast", "(f $.a 1)", "/ast", "(pass 1)"]);
    assert_eq!(
        outputs,
        vec![
            "AST mode: ON",
            "(pipeline (call f (ref .a) (int 1)))",
            "AST mode: OFF",
            "1",
        ]
    );
}

#[test]
fn functions_list_signatures() {
    let output = eval("/functions");
    assert!(output.contains("pass (...any) -> list"), "{output}");
    assert!(output.contains("printf (string, ...any) -> string"), "{output}");
}

#[test]
fn conversions_are_listed() {
    let output = eval("/conversions");
    assert!(output.contains("int -> string"), "{output}");
    assert!(output.contains("int -> float"), "{output}");
}

#[test]
fn set_then_reference() {
    let mut repl = Repl::new();
    let outputs = run_lines(
        &mut repl,
        &[
            r#"/set $ {"user": {"name": "jo"}, "xs": [1, 2]}"#,
            r#"/set $.xs[1] 40"#,
            r#"(printf "%s %d" $.user.name $.xs[1])"#,
        ],
    );
    assert_eq!(outputs[2], "\"jo 40\"");
    assert_eq!(
        repl.context(),
        &Value::map([
            ("user", Value::map([("name", "jo")])),
            ("xs", Value::List(vec![Value::Int(1), Value::Int(40)])),
        ])
    );
}

#[test]
fn set_reports_bad_input() {
    let mut repl = Repl::new();
    let outputs = run_lines(
        &mut repl,
        &["/set $.a", "/set $ {nope", "/set $.missing.deep 1", "/set $$ 1"],
    );
    assert_eq!(outputs.len(), 4);
    for output in &outputs {
        assert!(output.starts_with("Error:"), "{output}");
    }
    assert!(outputs[2].contains("$ has no key missing"), "{}", outputs[2]);
}

#[test]
fn context_reset() {
    let mut repl = Repl::new().with_context(Value::map([("a", 1)]));
    let outputs = run_lines(&mut repl, &["/context", "/reset", "/ctx"]);
    assert_eq!(outputs, vec!["{\n  \"a\": 1\n}", "Context reset", "null"]);
}

#[test]
fn unknown_meta_command() {
    let output = eval("/frobnicate");
    assert!(output.starts_with("Unknown command: /frobnicate"), "{output}");
}
