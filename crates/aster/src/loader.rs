//! AST-JSON input.
//!
//! The serde form of the `ast` types is the interchange format, so loading is
//! one deserialization. A document is either a single module object or an
//! array of modules in dependency order with the primary module last.

use crate::{
    ast::Module,
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    value::Value,
};

fn parse_error(err: &serde_json::Error, what: &str) -> RunError {
    RunError::new(ErrorKind::ParseError, format!("Malformed {what}: {err}"))
        .with_loc(&CodeLoc::new(err.line() as u32, err.column() as u32))
}

/// Loads a single module from AST-JSON.
pub fn parse_module(text: &str) -> RunResult<Module> {
    serde_json::from_str(text).map_err(|e| parse_error(&e, "module AST"))
}

/// Loads one module or an ordered array of modules (primary last).
pub fn parse_program(text: &str) -> RunResult<Vec<Module>> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|e| parse_error(&e, "AST document"))?;
    let modules: Vec<Module> = if json.is_array() {
        serde_json::from_value(json).map_err(|e| parse_error(&e, "module AST array"))?
    } else {
        vec![serde_json::from_value(json).map_err(|e| parse_error(&e, "module AST"))?]
    };
    if modules.is_empty() {
        return Err(RunError::new(ErrorKind::ParseError, "AST document contains no modules"));
    }
    Ok(modules)
}

/// Converts one CLI argument, written as a JSON literal, into a value.
///
/// Only numbers (truncated to integers), booleans, strings, and arrays
/// translate; anything else is rejected with a hint.
pub fn literal_value(text: &str) -> RunResult<Value> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| parse_error(&e, &format!("argument literal '{text}'")))?;
    literal_from_json(&json)
}

fn literal_from_json(json: &serde_json::Value) -> RunResult<Value> {
    match json {
        serde_json::Value::Bool(v) => Ok(Value::Bool(*v)),
        serde_json::Value::Number(n) => {
            let v = n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64);
            Ok(Value::Int(v))
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => {
            let values: RunResult<Vec<Value>> = items.iter().map(literal_from_json).collect();
            Ok(Value::List(values?))
        }
        other => Err(RunError::new(
            ErrorKind::ParseError,
            format!("Unsupported argument literal: {other}"),
        )
        .with_hint("only numbers, booleans, strings, and arrays translate into values")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_translate() {
        assert_eq!(literal_value("10").unwrap(), Value::Int(10));
        assert_eq!(literal_value("3.7").unwrap(), Value::Int(3));
        assert_eq!(literal_value("true").unwrap(), Value::Bool(true));
        assert_eq!(literal_value("\"hi\"").unwrap(), Value::Str("hi".into()));
        assert_eq!(
            literal_value("[1, \"a\"]").unwrap(),
            Value::List(vec![Value::Int(1), Value::Str("a".into())]),
        );
    }

    #[test]
    fn objects_and_null_are_rejected() {
        assert_eq!(literal_value("{}").unwrap_err().kind, ErrorKind::ParseError);
        assert_eq!(literal_value("null").unwrap_err().kind, ErrorKind::ParseError);
    }

    #[test]
    fn malformed_json_reports_position() {
        let err = literal_value("[1,").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert!(err.location.is_some());
    }
}
