//! String intrinsics.
//!
//! Strings are Unicode; `str.at` indexes by code point and `str.slice` takes
//! a half-open code-point range, clamping out-of-range bounds.

use crate::{
    error::{CodeLoc, RunResult},
    value::Value,
};

pub(super) fn concat(left: &Value, right: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let l = left.expect_str("str.concat").map_err(|e| e.with_loc(loc))?;
    let r = right.expect_str("str.concat").map_err(|e| e.with_loc(loc))?;
    Ok(Value::Str(format!("{l}{r}")))
}

pub(super) fn len(text: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let t = text.expect_str("str.len").map_err(|e| e.with_loc(loc))?;
    Ok(Value::Int(t.chars().count() as i64))
}

pub(super) fn slice(text: &Value, start: &Value, end: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let t = text.expect_str("str.slice").map_err(|e| e.with_loc(loc))?;
    let start = start.expect_int("str.slice start").map_err(|e| e.with_loc(loc))?;
    let end = end.expect_int("str.slice end").map_err(|e| e.with_loc(loc))?;

    let length = t.chars().count() as i64;
    let start = start.clamp(0, length) as usize;
    let end = end.clamp(0, length) as usize;
    if start >= end {
        return Ok(Value::Str(String::new()));
    }
    Ok(Value::Str(t.chars().skip(start).take(end - start).collect()))
}

pub(super) fn at(text: &Value, index: &Value, loc: &CodeLoc) -> RunResult<Value> {
    let t = text.expect_str("str.at").map_err(|e| e.with_loc(loc))?;
    let index = index.expect_int("str.at index").map_err(|e| e.with_loc(loc))?;
    if index < 0 {
        return Ok(Value::none());
    }
    match t.chars().nth(index as usize) {
        Some(c) => Ok(Value::some(Value::Str(c.to_string()))),
        None => Ok(Value::none()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Str(s.to_owned())
    }

    #[test]
    fn slice_clamps_out_of_range_bounds() {
        let loc = CodeLoc::synthetic();
        assert_eq!(slice(&text("hello"), &Value::Int(-3), &Value::Int(99), &loc).unwrap(), text("hello"));
        assert_eq!(slice(&text("hello"), &Value::Int(1), &Value::Int(3), &loc).unwrap(), text("el"));
        assert_eq!(slice(&text("hello"), &Value::Int(4), &Value::Int(2), &loc).unwrap(), text(""));
    }

    #[test]
    fn at_indexes_by_code_point() {
        let loc = CodeLoc::synthetic();
        assert_eq!(at(&text("déjà"), &Value::Int(1), &loc).unwrap(), Value::some(text("é")));
        assert_eq!(at(&text("déjà"), &Value::Int(4), &loc).unwrap(), Value::none());
        assert_eq!(at(&text("déjà"), &Value::Int(-1), &loc).unwrap(), Value::none());
    }

    #[test]
    fn len_counts_code_points() {
        let loc = CodeLoc::synthetic();
        assert_eq!(len(&text("déjà"), &loc).unwrap(), Value::Int(4));
    }
}
