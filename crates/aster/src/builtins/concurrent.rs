//! Scheduler-control intrinsics.

use crate::{
    actors,
    error::CodeLoc,
    eval::{EvalResult, Evaluator},
    value::Value,
};

/// Drains all pending deliveries; returns how many messages ran.
pub(super) fn flush(ev: &mut Evaluator) -> EvalResult<Value> {
    Ok(Value::Int(actors::flush(ev)?))
}

/// Delivers at most one message; returns whether one ran.
pub(super) fn step(ev: &mut Evaluator) -> EvalResult<Value> {
    Ok(Value::Bool(actors::step(ev)?))
}

/// Terminates an actor subtree. Stopping an already-destroyed actor is a no-op.
pub(super) fn stop(ev: &mut Evaluator, actor: &Value, loc: &CodeLoc) -> EvalResult<Value> {
    let id = actor.expect_actor_ref("Concurrent.stop").map_err(|e| e.with_loc(loc))?;
    actors::stop_subtree(ev.rt, id);
    Ok(Value::Unit)
}
