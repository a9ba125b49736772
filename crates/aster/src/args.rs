//! Call-argument binding.
//!
//! Aligns a call's mixed positional/named actuals against a parameter list.
//! Shared by user function calls, built-ins, actor spawn, actor message
//! dispatch, and synchronous handler delivery, so every call form diagnoses
//! argument mistakes the same way.

use indexmap::IndexMap;

use crate::{
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    value::Value,
};

/// An evaluated actual argument; positional when `name` is absent.
#[derive(Debug, Clone)]
pub(crate) struct ActualArg {
    pub name: Option<String>,
    pub value: Value,
}

impl ActualArg {
    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

fn bind_error(message: String, loc: &CodeLoc) -> RunError {
    RunError::new(ErrorKind::WrongArity, message).with_loc(loc)
}

/// Binds actuals to `params`, producing a parameter-name → value map.
///
/// Positional actuals consume parameters left to right; named actuals bind by
/// name. Issues are diagnosed deterministically: a positional actual after a
/// named one, too many actuals, an unknown parameter name, a parameter bound
/// twice, and finally any missing parameter (in declaration order).
pub(crate) fn bind_arguments(
    callee: &str,
    params: &[&str],
    actuals: Vec<ActualArg>,
    loc: &CodeLoc,
) -> RunResult<IndexMap<String, Value>> {
    let mut bound: IndexMap<String, Value> = IndexMap::with_capacity(params.len());
    let mut next_positional = 0usize;
    let mut seen_named = false;

    for actual in actuals {
        match actual.name {
            None => {
                if seen_named {
                    return Err(bind_error(
                        format!("Positional argument after named argument in call to '{callee}'"),
                        loc,
                    ));
                }
                let Some(param) = params.get(next_positional) else {
                    return Err(bind_error(
                        format!(
                            "Too many arguments in call to '{callee}': expected {}, got more",
                            params.len()
                        ),
                        loc,
                    ));
                };
                bound.insert((*param).to_owned(), actual.value);
                next_positional += 1;
            }
            Some(name) => {
                seen_named = true;
                if !params.contains(&name.as_str()) {
                    return Err(bind_error(
                        format!("Unknown parameter '{name}' in call to '{callee}'"),
                        loc,
                    ));
                }
                if bound.contains_key(&name) {
                    return Err(bind_error(
                        format!("Parameter '{name}' bound twice in call to '{callee}'"),
                        loc,
                    ));
                }
                bound.insert(name, actual.value);
            }
        }
    }

    for param in params {
        if !bound.contains_key(*param) {
            return Err(bind_error(
                format!("Missing parameter '{param}' in call to '{callee}'"),
                loc,
            ));
        }
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &[&str] = &["a", "b", "c"];

    fn loc() -> CodeLoc {
        CodeLoc::synthetic()
    }

    #[test]
    fn positional_then_named_binds() {
        let bound = bind_arguments(
            "f",
            PARAMS,
            vec![
                ActualArg::positional(Value::Int(1)),
                ActualArg::named("c", Value::Int(3)),
                ActualArg::named("b", Value::Int(2)),
            ],
            &loc(),
        )
        .unwrap();
        assert_eq!(bound["a"], Value::Int(1));
        assert_eq!(bound["b"], Value::Int(2));
        assert_eq!(bound["c"], Value::Int(3));
    }

    #[test]
    fn positional_after_named_is_rejected() {
        let err = bind_arguments(
            "f",
            PARAMS,
            vec![
                ActualArg::named("a", Value::Int(1)),
                ActualArg::positional(Value::Int(2)),
            ],
            &loc(),
        )
        .unwrap_err();
        assert!(err.message.contains("Positional argument after named"));
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let err = bind_arguments(
            "f",
            PARAMS,
            vec![
                ActualArg::positional(Value::Int(1)),
                ActualArg::named("a", Value::Int(2)),
                ActualArg::named("b", Value::Int(3)),
                ActualArg::named("c", Value::Int(4)),
            ],
            &loc(),
        )
        .unwrap_err();
        assert!(err.message.contains("bound twice"), "{}", err.message);
    }

    #[test]
    fn unknown_missing_and_excess_are_rejected() {
        let unknown = bind_arguments("f", PARAMS, vec![ActualArg::named("z", Value::Unit)], &loc()).unwrap_err();
        assert!(unknown.message.contains("Unknown parameter 'z'"));

        let missing = bind_arguments("f", PARAMS, vec![ActualArg::positional(Value::Unit)], &loc()).unwrap_err();
        assert!(missing.message.contains("Missing parameter 'b'"));

        let excess = bind_arguments(
            "f",
            &["a"],
            vec![ActualArg::positional(Value::Unit), ActualArg::positional(Value::Unit)],
            &loc(),
        )
        .unwrap_err();
        assert!(excess.message.contains("Too many arguments"));
        assert_eq!(excess.kind, ErrorKind::WrongArity);
    }
}
