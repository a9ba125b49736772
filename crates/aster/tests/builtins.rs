//! Built-in library behavior as observed through the language.

mod common;

use aster::ast::{BinaryOp, Module};
use aster::{ConstructorValue, ErrorKind, LogLevel, OutputMode, RunOptions, Runner, Value};
use common::*;
use pretty_assertions::assert_eq;

fn runner(modules: Vec<Module>) -> Runner {
    Runner::new(modules).unwrap()
}

fn call_value(runner: &Runner, name: &str, args: Vec<Value>) -> Result<Value, aster::RunError> {
    runner.call_function_value(name, args, &RunOptions::default())
}

fn iter_module() -> Module {
    module(
        "main",
        vec![
            function(
                "double",
                vec![param("n", ty("Int"))],
                vec![expr_stmt(bin(BinaryOp::Mul, var("n"), int(2)))],
            ),
            function(
                "positive",
                vec![param("n", ty("Int"))],
                vec![expr_stmt(bin(BinaryOp::Gt, var("n"), int(0)))],
            ),
            function(
                "add",
                vec![param("acc", ty("Int")), param("n", ty("Int"))],
                vec![expr_stmt(bin(BinaryOp::Add, var("acc"), var("n")))],
            ),
            effectful_function(
                "noisy_double",
                vec![param("n", ty("Int"))],
                &["io"],
                vec![expr_stmt(bin(BinaryOp::Mul, var("n"), int(2)))],
            ),
            function(
                "mapped",
                vec![],
                vec![expr_stmt(call(&["list", "map"], vec![list(vec![int(1), int(2), int(3)]), string("double")]))],
            ),
            function(
                "filtered",
                vec![],
                vec![expr_stmt(call(
                    &["list", "filter"],
                    vec![list(vec![int(-1), int(2), int(0), int(4)]), string("positive")],
                ))],
            ),
            function(
                "folded",
                vec![],
                vec![expr_stmt(call(
                    &["list", "fold"],
                    vec![list(vec![int(1), int(2), int(3)]), string("add"), int(10)],
                ))],
            ),
            function(
                "parallel_ok",
                vec![],
                vec![expr_stmt(call(&["parallel_map"], vec![list(vec![int(1), int(2)]), string("double")]))],
            ),
            function(
                "parallel_impure",
                vec![],
                vec![expr_stmt(call(&["parallel_map"], vec![list(vec![int(1)]), string("noisy_double")]))],
            ),
            function(
                "bad_arity",
                vec![],
                vec![expr_stmt(call(&["list", "map"], vec![list(vec![int(1)]), string("add")]))],
            ),
            function(
                "bad_action",
                vec![],
                vec![expr_stmt(call(&["list", "for_each"], vec![list(vec![int(1)]), string("double")]))],
            ),
        ],
    )
}

#[test]
fn map_filter_fold_are_sequential_left_to_right() {
    let runner = runner(vec![iter_module()]);
    assert_eq!(
        call_value(&runner, "mapped", vec![]).unwrap(),
        Value::List(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
    );
    assert_eq!(
        call_value(&runner, "filtered", vec![]).unwrap(),
        Value::List(vec![Value::Int(2), Value::Int(4)])
    );
    assert_eq!(call_value(&runner, "folded", vec![]).unwrap(), Value::Int(16));
}

#[test]
fn parallel_variants_gate_on_purity() {
    let runner = runner(vec![iter_module()]);
    assert_eq!(
        call_value(&runner, "parallel_ok", vec![]).unwrap(),
        Value::List(vec![Value::Int(2), Value::Int(4)])
    );
    let err = call_value(&runner, "parallel_impure", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("pure"), "{}", err.message);
}

#[test]
fn iterator_callees_are_arity_checked() {
    let runner = runner(vec![iter_module()]);
    assert_eq!(call_value(&runner, "bad_arity", vec![]).unwrap_err().kind, ErrorKind::WrongArity);
    assert_eq!(
        call_value(&runner, "bad_action", vec![]).unwrap_err().kind,
        ErrorKind::WrongOperandType
    );
}

#[test]
fn string_builtins_index_by_code_point() {
    let runner = runner(vec![module(
        "main",
        vec![
            function(
                "greet",
                vec![],
                vec![expr_stmt(call(&["str", "concat"], vec![string("hé"), string("llo")]))],
            ),
            function(
                "midslice",
                vec![],
                vec![expr_stmt(call(&["str", "slice"], vec![string("déjà vu"), int(2), int(99)]))],
            ),
            function("second", vec![], vec![expr_stmt(call(&["str", "at"], vec![string("déjà"), int(1)]))]),
            function("past_end", vec![], vec![expr_stmt(call(&["str", "at"], vec![string("ab"), int(5)]))]),
        ],
    )]);
    assert_eq!(call_value(&runner, "greet", vec![]).unwrap(), Value::Str("héllo".into()));
    assert_eq!(call_value(&runner, "midslice", vec![]).unwrap(), Value::Str("jà vu".into()));
    assert_eq!(call_value(&runner, "second", vec![]).unwrap(), Value::some(Value::Str("é".into())));
    assert_eq!(call_value(&runner, "past_end", vec![]).unwrap(), Value::none());
}

#[test]
fn math_and_assertions() {
    let runner = runner(vec![module(
        "main",
        vec![
            function("clamp_abs", vec![], vec![expr_stmt(call(&["math", "abs"], vec![int(-9)]))]),
            function(
                "bounds",
                vec![],
                vec![expr_stmt(list(vec![
                    call(&["math", "min"], vec![int(3), int(-4)]),
                    call(&["math", "max"], vec![int(3), int(-4)]),
                ]))],
            ),
            function("check", vec![], vec![expr_stmt(call(&["assert"], vec![boolean(false)]))]),
            function(
                "check_equal",
                vec![],
                vec![expr_stmt(call(&["test", "assert_equal"], vec![int(1), int(2)]))],
            ),
        ],
    )]);
    assert_eq!(call_value(&runner, "clamp_abs", vec![]).unwrap(), Value::Int(9));
    assert_eq!(
        call_value(&runner, "bounds", vec![]).unwrap(),
        Value::List(vec![Value::Int(-4), Value::Int(3)])
    );

    let err = call_value(&runner, "check", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AssertionFailed);
    assert_eq!(err.message, "Assertion failed");

    let err = call_value(&runner, "check_equal", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AssertionFailed);
    assert!(err.message.contains("expected 1, actual 2"));
}

#[test]
fn json_round_trips_constructor_values() {
    let runner = runner(vec![module(
        "main",
        vec![
            record("Pair", &[("a", ty("Int")), ("b", ty("String"))]),
            function(
                "roundtrip",
                vec![param("p", ty("Pair"))],
                vec![expr_stmt(call(
                    &["json", "decode"],
                    vec![call(&["json", "encode"], vec![var("p")])],
                ))],
            ),
            function("bad", vec![], vec![expr_stmt(call(&["json", "decode"], vec![string("{oops")]))]),
        ],
    )]);
    let pair = Value::Constructor(
        ConstructorValue::new("Pair")
            .with_field("a", Value::Int(-3))
            .with_field("b", Value::Str("hi".into())),
    );
    assert_eq!(call_value(&runner, "roundtrip", vec![pair.clone()]).unwrap(), pair);

    let err = call_value(&runner, "bad", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::JsonDecodeError);
}

#[test]
fn log_events_buffer_in_json_mode() {
    let runner = runner(vec![module(
        "main",
        vec![function(
            "noisy",
            vec![],
            vec![
                expr_stmt(call(
                    &["Log", "debug"],
                    vec![string("starting"), construct("Event", &[("step", int(1))])],
                )),
                expr_stmt(call(
                    &["Log", "trace"],
                    vec![string("detail"), construct("Event", &[("step", int(2))])],
                )),
                expr_stmt(int(0)),
            ],
        )],
    )]);
    let options = RunOptions {
        output_mode: OutputMode::Json,
        ..RunOptions::default()
    };
    let report = runner.call_function("noisy", vec![], &options);
    assert!(report.is_success());
    assert_eq!(report.logs.len(), 2);
    assert_eq!(report.logs[0].level, LogLevel::Debug);
    assert_eq!(report.logs[0].message, "starting");
    assert_eq!(report.logs[1].level, LogLevel::Trace);
    let data = report.logs[0].data.as_ref().unwrap();
    assert_eq!(data["_constructor"], "Event");
    assert_eq!(data["step"], 1);
}
