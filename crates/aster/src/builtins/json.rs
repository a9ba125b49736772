//! JSON codec intrinsics.
//!
//! `json.encode` serializes any value from the supported subset (everything
//! but actor references); `json.decode` parses strings, numbers, booleans,
//! arrays, and objects into the corresponding value kinds, honoring the
//! `_constructor` convention.

use crate::{
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    value::Value,
};

pub(super) fn encode(value: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let json = value.to_json().map_err(|e| e.with_loc(loc))?;
    let text = serde_json::to_string(&json)
        .map_err(|e| RunError::new(ErrorKind::WrongOperandType, format!("json.encode failed: {e}")).with_loc(loc))?;
    Ok(Value::Str(text))
}

pub(super) fn decode(text: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let t = text.expect_str("json.decode").map_err(|e| e.with_loc(loc))?;
    let json: serde_json::Value = serde_json::from_str(t)
        .map_err(|e| RunError::new(ErrorKind::JsonDecodeError, format!("json.decode failed: {e}")).with_loc(loc))?;
    Ok(Value::from_json(&json))
}
