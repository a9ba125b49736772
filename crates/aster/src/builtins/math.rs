//! Integer math intrinsics.

use crate::{
    error::{CodeLoc, RunResult},
    value::Value,
};

pub(super) fn abs(value: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let v = value.expect_int("math.abs").map_err(|e| e.with_loc(loc))?;
    Ok(Value::Int(v.wrapping_abs()))
}

pub(super) fn min(left: &Value, right: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let l = left.expect_int("math.min").map_err(|e| e.with_loc(loc))?;
    let r = right.expect_int("math.min").map_err(|e| e.with_loc(loc))?;
    Ok(Value::Int(l.min(r)))
}

pub(super) fn max(left: &Value, right: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let l = left.expect_int("math.max").map_err(|e| e.with_loc(loc))?;
    let r = right.expect_int("math.max").map_err(|e| e.with_loc(loc))?;
    Ok(Value::Int(l.max(r)))
}
