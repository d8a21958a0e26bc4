//! End-to-end evaluation tests: expressions parsed and run through a kernel.

use std::collections::BTreeMap;

use pl_kernel::functions::{FunctionError, REGEX_MATCH, RegexMatch};
use pl_kernel::interpreter::{CallError, Frame};
use pl_kernel::{ConvertError, Error, EvalError, Kernel, KernelConfig, parse};
use pl_types::{Record, Signature, Value, ValueType};
use rstest::rstest;

fn sum(args: Vec<Value>) -> Result<Value, FunctionError> {
    Ok(Value::Int(args.iter().filter_map(Value::as_int).sum()))
}

fn twice(args: Vec<Value>) -> Result<Value, FunctionError> {
    Ok(Value::List(
        args.iter()
            .filter_map(Value::as_int)
            .map(|n| Value::Int(n * 2))
            .collect(),
    ))
}

/// A kernel with builtins plus `sum` and `twice` over integers.
fn kernel() -> Kernel {
    let mut kernel = Kernel::new(KernelConfig::named("test"));
    kernel
        .register_fn(
            "sum",
            Signature::new().variadic(ValueType::Int).returns(ValueType::Int),
            sum,
        )
        .expect("valid signature");
    kernel
        .register_fn(
            "twice",
            Signature::new().variadic(ValueType::Int).returns(ValueType::List),
            twice,
        )
        .expect("valid signature");
    kernel
}

fn run(kernel: &Kernel, expr: &str, ctx: &Value) -> Vec<Value> {
    kernel
        .execute_expr(expr, ctx)
        .unwrap_or_else(|e| panic!("{expr}: {e}"))
}

fn fail(kernel: &Kernel, expr: &str, ctx: &Value) -> String {
    match kernel.execute_expr(expr, ctx) {
        Ok(out) => panic!("{expr}: expected failure, got {out:?}"),
        Err(e) => e.to_string(),
    }
}

// =============================================================================
// PIPE SEMANTICS
// =============================================================================

#[test]
fn answer_is_93() {
    let ctx = Value::map([("Answer", 42)]);
    let out = run(
        &kernel(),
        "(sum 1 2 (sum 3 | sum (sum $.Answer 5) 6) 7 (sum 8) | sum 9 10)",
        &ctx,
    );
    assert_eq!(out, vec![Value::Int(93)]);
}

#[rstest]
#[case::single("(sum 1 2 3 4 5)", 15)]
#[case::piped("(sum 1 2 3 4 5 | sum 6 7)", 28)]
#[case::nested("(sum 1 2 (sum 6 7) 4 5)", 25)]
#[case::nested_spliced("(sum 1 2 (twice 6 7) 4 5)", 38)]
#[case::no_args("(sum)", 0)]
fn sums(#[case] expr: &str, #[case] expected: i64) {
    assert_eq!(run(&kernel(), expr, &Value::Null), vec![Value::Int(expected)]);
}

#[test]
fn piped_outputs_trail_own_args() {
    let out = run(&kernel(), "(pass 1 2 | pass 3 | pass 4)", &Value::Null);
    assert_eq!(
        out,
        vec![Value::Int(4), Value::Int(3), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn nested_outputs_splice_in_place() {
    let out = run(&kernel(), "(pass 1 2 (twice 6 7) 4 5)", &Value::Null);
    let expected: Vec<Value> = [1i64, 2, 12, 14, 4, 5].into_iter().map(Value::from).collect();
    assert_eq!(out, expected);
}

#[test]
fn list_returns_are_flattened() {
    let out = run(&kernel(), "(twice 1 2 3)", &Value::Null);
    assert_eq!(out, vec![Value::Int(2), Value::Int(4), Value::Int(6)]);

    let empty = run(&kernel(), "(pass)", &Value::Null);
    assert!(empty.is_empty());
}

#[test]
fn empty_pipeline_returns_nothing() {
    assert!(run(&kernel(), "()", &Value::Null).is_empty());
}

#[test]
fn evaluation_is_idempotent() {
    let kernel = kernel();
    let ctx = Value::map([("xs", Value::List(vec![Value::Int(3), Value::Int(4)]))]);
    let before = ctx.clone();
    let pipeline = parse("(sum $.xs[0] (twice $.xs[1]) | twice)").expect("parses");
    let snapshot = pipeline.clone();

    let first = kernel.execute(&pipeline, &ctx).expect("first run");
    let second = kernel.execute(&pipeline, &ctx).expect("second run");

    assert_eq!(first, vec![Value::Int(22)]);
    assert_eq!(first, second);
    assert_eq!(ctx, before);
    assert_eq!(pipeline, snapshot);
}

// =============================================================================
// REFERENCES
// =============================================================================

fn nested_context() -> Value {
    Value::map([(
        "a",
        Value::List(vec![Value::map([("b", "foo")])]),
    )])
}

#[test]
fn reference_is_path_faithful() {
    let out = run(&kernel(), "(pass $.a[0].b)", &nested_context());
    assert_eq!(out, vec![Value::from("foo")]);
}

#[test]
fn reference_out_of_range_names_prefix() {
    let err = fail(&kernel(), "(pass $.a[1])", &nested_context());
    assert_eq!(err, "fn[0] pass: arg[0]: reference: $.a: out of range");
}

#[test]
fn references_into_records_and_int_maps() {
    let ctx = Value::map([
        (
            "user",
            Value::from(Record::new("person").field("name", "jotaro").field("age", 17)),
        ),
        (
            "slots",
            Value::IntMap(BTreeMap::from([(3, Value::from("third"))])),
        ),
    ]);
    let out = run(&kernel(), "(pass $.user.name $.user.age $.slots[3])", &ctx);
    assert_eq!(
        out,
        vec![Value::from("jotaro"), Value::Int(17), Value::from("third")]
    );

    let err = fail(&kernel(), "(pass $.user.height)", &ctx);
    assert_eq!(err, "fn[0] pass: arg[0]: reference: $.user has no field height");
}

#[test]
fn reference_to_whole_list_is_one_argument() {
    let ctx = Value::map([("xs", Value::List(vec![Value::Int(1), Value::Int(2)]))]);
    let out = run(&kernel(), "(pass $.xs)", &ctx);
    assert_eq!(out, vec![Value::List(vec![Value::Int(1), Value::Int(2)])]);
}

// =============================================================================
// CONVERSIONS
// =============================================================================

fn shout(kernel: &mut Kernel) {
    kernel
        .register_fn(
            "shout",
            Signature::new().param(ValueType::String).returns(ValueType::String),
            |args| Ok(Value::from(args[0].as_str().unwrap_or_default().to_uppercase())),
        )
        .expect("valid signature");
}

#[test]
fn direct_conversion_feeds_parameter() {
    let mut kernel = kernel();
    shout(&mut kernel);
    kernel
        .register_fn(
            "half",
            Signature::new().param(ValueType::Float).returns(ValueType::Float),
            |args| Ok(Value::Float(args[0].as_float().unwrap_or_default() / 2.0)),
        )
        .expect("valid signature");

    assert_eq!(run(&kernel, "(shout 42)", &Value::Null), vec![Value::from("42")]);
    assert_eq!(run(&kernel, "(half 3)", &Value::Null), vec![Value::Float(1.5)]);
}

#[test]
fn bridge_through_text_when_no_direct_conversion() {
    let mut kernel = kernel();
    kernel
        .register_fn(
            "not",
            Signature::new().param(ValueType::Bool).returns(ValueType::Bool),
            |args| Ok(Value::Bool(!args[0].as_bool().unwrap_or_default())),
        )
        .expect("valid signature");
    kernel
        .conversions_mut()
        .set(ValueType::String, ValueType::Bool, |v| match v.as_str() {
            Some("1") => Ok(Value::Bool(true)),
            Some("0") => Ok(Value::Bool(false)),
            _ => Err(ConvertError::failed(format!("not a flag: {v}"))),
        });

    assert_eq!(run(&kernel, "(not 1)", &Value::Null), vec![Value::Bool(false)]);

    let err = fail(&kernel, "(not 7)", &Value::Null);
    assert_eq!(
        err,
        "fn[0] not: arg[0]: convert to bool from int: failed to convert to parameter type \
         from intermediate type string: not a flag: 7"
    );
}

#[test]
fn string_is_never_bridged() {
    let err = fail(&kernel(), "(sum \"Unity\")", &Value::Null);
    assert_eq!(err, "fn[0] sum: arg[0]: convert to int from string: not found");
}

// =============================================================================
// BUILTINS
// =============================================================================

#[test]
fn printf_formats_piped_values() {
    let out = run(&kernel(), r#"(sum 40 2 | printf "answer=%d")"#, &Value::Null);
    assert_eq!(out, vec![Value::from("answer=42")]);
}

#[test]
fn regex_matches_feed_string_parameters() {
    let mut kernel = kernel();
    shout(&mut kernel);
    let out = run(
        &kernel,
        r#"(regex `^(\w+)@(\w+)$` "jo@jo" "nope" | shout)"#,
        &Value::Null,
    );
    assert_eq!(out, vec![Value::from("JO@JO")]);
}

#[test]
fn regex_matches_reach_handle_parameters() {
    let mut kernel = kernel();
    kernel
        .register_fn(
            "domain",
            Signature::new()
                .param(ValueType::handle(REGEX_MATCH))
                .returns(ValueType::String),
            |args| {
                let found = args[0]
                    .as_handle()
                    .and_then(|h| h.downcast_ref::<RegexMatch>())
                    .ok_or_else(|| FunctionError::new("not a match"))?;
                Ok(Value::from(found.by_name.get("host").cloned().unwrap_or_default()))
            },
        )
        .expect("valid signature");

    let out = run(
        &kernel,
        r#"(regex `(?P<user>\w+)@(?P<host>\w+)` "user@example" | domain)"#,
        &Value::Null,
    );
    assert_eq!(out, vec![Value::from("example")]);
}

#[test]
fn regex_then_printf() {
    let out = run(
        &kernel(),
        r#"(regex `\d+` "a1" "b" "c22" | printf "%s and %s")"#,
        &Value::Null,
    );
    assert_eq!(out, vec![Value::from("a1 and c22")]);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn undefined_function() {
    let err = fail(&kernel(), "(sum 1 | quantum_carburetor)", &Value::Null);
    assert_eq!(err, "fn[1] quantum_carburetor: not defined");
}

#[test]
fn nested_failure_names_every_level() {
    let kernel = kernel();
    let err = kernel
        .execute_expr(r#"(sum 42 (sum "Unity"))"#, &Value::Null)
        .expect_err("nested conversion fails");
    assert_eq!(
        err.to_string(),
        "fn[0] sum: arg[1]: fn[0] sum: arg[0]: convert to int from string: not found"
    );

    let Error::Eval(eval) = err else {
        panic!("expected an evaluation error");
    };
    assert_eq!(
        eval.frames(),
        vec![
            Frame { call: 0, name: "sum".into(), arg: Some(1) },
            Frame { call: 0, name: "sum".into(), arg: None },
        ]
    );
    assert!(matches!(eval.leaf(), Some(CallError::Invoke(_))));
}

#[test]
fn nested_undefined_function() {
    let err = fail(&kernel(), "(sum 42 (jerry))", &Value::Null);
    assert_eq!(err, "fn[0] sum: arg[1]: fn[0] jerry: not defined");
}

#[test]
fn arity_errors() {
    let err = fail(&kernel(), "(pass | printf)", &Value::Null);
    assert_eq!(err, "fn[1] printf: expected at least 1 args but 0 args are given");
}

#[test]
fn function_errors_are_verbatim() {
    let err = fail(&kernel(), r#"(regex "(" "x")"#, &Value::Null);
    assert!(err.starts_with("fn[0] regex: failed to compile regex"), "{err}");
}

#[test]
fn parse_errors_abort_before_evaluation() {
    let err = kernel()
        .execute_expr("((sum 1 2))", &Value::Null)
        .expect_err("double paren");
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn limits_reject_before_running() {
    let kernel = Kernel::new(KernelConfig::default().with_max_calls(2));
    let err = kernel
        .execute_expr("(pass 1 | pass (pass 2))", &Value::Null)
        .expect_err("three calls");
    assert_eq!(
        err,
        Error::Eval(EvalError::TooManyCalls { count: 3, limit: 2 })
    );
}
