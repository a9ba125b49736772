//! List intrinsics.

use crate::{
    error::{CodeLoc, RunResult},
    value::Value,
};

pub(super) fn len(list: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let items = list.expect_list("list.len").map_err(|e| e.with_loc(loc))?;
    Ok(Value::Int(items.len() as i64))
}
