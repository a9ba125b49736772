//! AST-JSON loading, structured report shape, and trace records.

mod common;

use aster::ast::BinaryOp;
use aster::{OutputMode, RunOptions, Runner, Value, loader};
use common::*;
use pretty_assertions::assert_eq;

/// Pins the AST-JSON wire format: tagged declarations, statements, and
/// expressions under a `kind` field, snake_case variant names.
const DOUBLE_MODULE_JSON: &str = r#"{
  "name": ["main"],
  "imports": [],
  "decls": [
    {
      "kind": "function",
      "name": "double",
      "params": [{"name": "n", "ty": {"kind": "named", "name": "Int"}}],
      "body": [
        {
          "kind": "expr",
          "value": {
            "loc": {"line": 2, "column": 5},
            "expr": {
              "kind": "binary",
              "op": "mul",
              "left": {"loc": {"line": 2, "column": 5}, "expr": {"kind": "var", "name": "n"}},
              "right": {"loc": {"line": 2, "column": 9}, "expr": {"kind": "int", "value": 2}}
            }
          }
        }
      ],
      "loc": {"line": 1, "column": 1}
    }
  ]
}"#;

#[test]
fn handwritten_ast_json_loads_and_runs() {
    let runner = Runner::from_json(DOUBLE_MODULE_JSON).unwrap();
    let result = runner
        .call_function_value("double", vec![Value::Int(21)], &RunOptions::default())
        .unwrap();
    assert_eq!(result, Value::Int(42));
}

#[test]
fn modules_round_trip_through_serde() {
    let source = module(
        "main",
        vec![function(
            "add",
            vec![param("a", ty("Int")), param("b", ty("Int"))],
            vec![expr_stmt(bin(BinaryOp::Add, var("a"), var("b")))],
        )],
    );
    let text = serde_json::to_string(&source).unwrap();
    let runner = Runner::from_json(&text).unwrap();
    let result = runner
        .call_function_value("add", vec![Value::Int(2), Value::Int(3)], &RunOptions::default())
        .unwrap();
    assert_eq!(result, Value::Int(5));
}

#[test]
fn module_arrays_load_primary_last() {
    let util = module(
        "acme.util",
        vec![function(
            "one",
            vec![],
            vec![expr_stmt(int(1))],
        )],
    );
    let main = module_with_imports(
        "app.main",
        vec![("acme.util", None)],
        vec![function("entry", vec![], vec![expr_stmt(call(&["util", "one"], vec![]))])],
    );
    let text = serde_json::to_string(&vec![util, main]).unwrap();
    let runner = Runner::from_json(&text).unwrap();
    assert_eq!(runner.primary_module().dotted(), "app.main");
    assert_eq!(
        runner.call_function_value("entry", vec![], &RunOptions::default()).unwrap(),
        Value::Int(1)
    );
}

#[test]
fn malformed_documents_are_parse_errors() {
    let err = Runner::from_json("{not json").unwrap_err();
    assert_eq!(err.kind, aster::ErrorKind::ParseError);
    let err = loader::parse_program("[]").unwrap_err();
    assert_eq!(err.kind, aster::ErrorKind::ParseError);
}

#[test]
fn json_reports_carry_status_result_and_errors() {
    let runner = Runner::from_json(DOUBLE_MODULE_JSON).unwrap();
    let options = RunOptions {
        output_mode: OutputMode::Json,
        ..RunOptions::default()
    };

    let report = runner.call_function("double", vec![Value::Int(4)], &options);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["result"], 8);
    assert!(json.get("errors").is_none());

    let report = runner.call_function("missing", vec![], &options);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["errors"][0]["errorType"], "UnknownFunction");
    assert!(json["errors"][0]["message"].as_str().unwrap().contains("missing"));
}

#[test]
fn explain_mode_records_call_and_return_steps() {
    let runner = Runner::from_json(DOUBLE_MODULE_JSON).unwrap();
    let options = RunOptions {
        tracing: true,
        ..RunOptions::default()
    };
    let report = runner.call_function("double", vec![Value::Int(3)], &options);
    assert!(report.is_success());
    assert!(!report.traces.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["traces"][0]["stepType"], "call");
    assert!(json["traces"][0]["description"].as_str().unwrap().contains("double"));

    let last = report.traces.last().unwrap();
    let last_json = serde_json::to_value(last).unwrap();
    assert_eq!(last_json["stepType"], "return");
    assert_eq!(last_json["value"], "6");
}
