//! Higher-order iteration intrinsics.
//!
//! The callee is referenced by function name and resolved from the calling
//! module. Sequential and "parallel" variants share one implementation —
//! evaluation is sequential left-to-right either way — but the parallel forms
//! additionally require the referenced function to declare zero effects, so a
//! future rewrite may exploit real parallelism.

use crate::{
    args::ActualArg,
    ast::QualifiedName,
    error::{CodeLoc, ErrorKind, RunError},
    eval::{EvalResult, Evaluator},
    runtime::FunctionEntry,
    value::Value,
};

/// Resolves the function named by `fn_value`, checking arity and, for the
/// parallel variants, the zero-effect purity gate.
fn resolve_function(
    ev: &Evaluator,
    builtin: &str,
    fn_value: &Value,
    arity: usize,
    pure_required: bool,
    module: &QualifiedName,
    loc: &CodeLoc,
) -> Result<FunctionEntry, RunError> {
    let name = fn_value
        .expect_str(&format!("{builtin} function reference"))
        .map_err(|e| e.with_loc(loc))?;
    let Some(entry) = ev.rt.lookup_function(module, name) else {
        return Err(RunError::unknown_function(name).with_loc(loc));
    };
    if entry.decl.params.len() != arity {
        return Err(RunError::new(
            ErrorKind::WrongArity,
            format!(
                "'{builtin}' expects a function of {arity} parameter(s); '{name}' has {}",
                entry.decl.params.len()
            ),
        )
        .with_loc(loc));
    }
    if pure_required && !entry.decl.effects.is_empty() {
        return Err(RunError::new(
            ErrorKind::TypeError,
            format!("'{builtin}' requires a pure function; '{name}' declares effects"),
        )
        .with_loc(loc));
    }
    Ok(entry)
}

pub(super) fn map(
    ev: &mut Evaluator,
    builtin: &str,
    list: Value,
    fn_value: &Value,
    pure_required: bool,
    module: &QualifiedName,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let items = list.expect_list(builtin).map_err(|e| e.with_loc(loc))?.to_vec();
    let entry = resolve_function(ev, builtin, fn_value, 1, pure_required, module, loc)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(ev.call_function(&entry, vec![ActualArg::positional(item)], loc)?);
    }
    Ok(Value::List(out))
}

pub(super) fn filter(
    ev: &mut Evaluator,
    builtin: &str,
    list: Value,
    fn_value: &Value,
    pure_required: bool,
    module: &QualifiedName,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let items = list.expect_list(builtin).map_err(|e| e.with_loc(loc))?.to_vec();
    let entry = resolve_function(ev, builtin, fn_value, 1, pure_required, module, loc)?;
    let mut out = Vec::new();
    for item in items {
        let keep = ev.call_function(&entry, vec![ActualArg::positional(item.clone())], loc)?;
        let Value::Bool(keep) = keep else {
            return Err(RunError::new(
                ErrorKind::NonBooleanCondition,
                format!("'{builtin}' predicate must return Bool, got {}", keep.kind_name()),
            )
            .with_loc(loc)
            .into());
        };
        if keep {
            out.push(item);
        }
    }
    Ok(Value::List(out))
}

pub(super) fn fold(
    ev: &mut Evaluator,
    builtin: &str,
    list: Value,
    fn_value: &Value,
    init: Value,
    pure_required: bool,
    module: &QualifiedName,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let items = list.expect_list(builtin).map_err(|e| e.with_loc(loc))?.to_vec();
    let entry = resolve_function(ev, builtin, fn_value, 2, pure_required, module, loc)?;
    let mut acc = init;
    for item in items {
        acc = ev.call_function(
            &entry,
            vec![ActualArg::positional(acc), ActualArg::positional(item)],
            loc,
        )?;
    }
    Ok(acc)
}

pub(super) fn for_each(
    ev: &mut Evaluator,
    builtin: &str,
    list: Value,
    fn_value: &Value,
    pure_required: bool,
    module: &QualifiedName,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let items = list.expect_list(builtin).map_err(|e| e.with_loc(loc))?.to_vec();
    let entry = resolve_function(ev, builtin, fn_value, 1, pure_required, module, loc)?;
    for item in items {
        let result = ev.call_function(&entry, vec![ActualArg::positional(item)], loc)?;
        if result != Value::Unit {
            return Err(RunError::wrong_operand("an action returning unit", result.kind_name(), builtin)
                .with_loc(loc)
                .into());
        }
    }
    Ok(Value::Unit)
}
