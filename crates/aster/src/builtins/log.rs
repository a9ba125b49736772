//! Structured logging intrinsics.

use crate::{
    error::{CodeLoc, RunError},
    eval::{EvalResult, Evaluator},
    report::LogLevel,
    value::Value,
};

/// `Log.debug` / `Log.trace`: a string label plus a constructor payload.
///
/// In JSON mode the event lands in the run's log buffer; in text mode it goes
/// to the process's human-readable log sink.
pub(super) fn emit(
    ev: &mut Evaluator,
    level: LogLevel,
    label: &Value,
    payload: &Value,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let label = label.expect_str("Log label").map_err(|e| e.with_loc(loc))?;
    if !matches!(payload, Value::Constructor(_)) {
        return Err(RunError::wrong_operand("a constructor value", payload.kind_name(), "Log payload")
            .with_loc(loc)
            .into());
    }
    ev.rt.emit_log(level, label, payload, Some(loc));
    Ok(Value::Unit)
}
