//! Assertion intrinsics.

use crate::{
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    value::Value,
};

pub(super) fn assert(condition: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let Value::Bool(condition) = condition else {
        return Err(RunError::non_boolean_condition(condition.kind_name()).with_loc(loc));
    };
    if *condition {
        Ok(Value::Unit)
    } else {
        Err(RunError::assertion_failed().with_loc(loc))
    }
}

pub(super) fn assert_equal(expected: &Value, actual: &Value, loc: &CodeLoc) -> RunResult<Value> {
    if expected == actual {
        Ok(Value::Unit)
    } else {
        Err(RunError::new(
            ErrorKind::AssertionFailed,
            format!("Assertion failed: expected {expected}, actual {actual}"),
        )
        .with_loc(loc))
    }
}
