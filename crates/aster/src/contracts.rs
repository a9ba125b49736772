//! Contract enforcement.
//!
//! A function's contract (a `ContractDecl` of the same name) is checked
//! around each qualifying call: `requires` clauses run before the body with
//! only the parameter bindings in scope, `ensures` clauses run after a normal
//! return with the additional binding `result`. Clauses may not call
//! effectful functions; the type checker enforces that and the evaluator
//! trusts it.

use crate::{
    env::Env,
    error::{ErrorKind, RunError},
    eval::{EvalResult, Evaluator},
    runtime::ContractEntry,
    value::Value,
};

/// Name bound to the return value inside `ensures` clauses.
const RESULT_BINDING: &str = "result";

pub(crate) fn check_requires(ev: &mut Evaluator, contract: &ContractEntry, param_env: &Env) -> EvalResult<()> {
    for clause in &contract.decl.requires {
        let mut env = param_env.clone();
        let value = ev.eval_expr(clause, &mut env, &contract.module)?;
        if value != Value::Bool(true) {
            return Err(RunError::new(
                ErrorKind::ContractRequiresFailure,
                format!("Contract requires clause failed for '{}'", contract.decl.name),
            )
            .with_loc(&clause.loc)
            .into());
        }
    }
    Ok(())
}

pub(crate) fn check_ensures(
    ev: &mut Evaluator,
    contract: &ContractEntry,
    param_env: &Env,
    result: &Value,
) -> EvalResult<()> {
    for clause in &contract.decl.ensures {
        let mut env = param_env.clone();
        env.bind(RESULT_BINDING, result.clone());
        let value = ev.eval_expr(clause, &mut env, &contract.module)?;
        if value != Value::Bool(true) {
            return Err(RunError::new(
                ErrorKind::ContractEnsuresFailure,
                format!("Contract ensures clause failed for '{}'", contract.decl.name),
            )
            .with_loc(&clause.loc)
            .into());
        }
    }
    Ok(())
}
