//! The property-testing engine.
//!
//! Runs each property for N iterations (declared or 50): typed random values
//! are generated from the seeded RNG, per-parameter predicates are satisfied
//! by retrying up to a cap, the body is evaluated, and any raised error or
//! non-unit early return counts as a counterexample. Counterexamples are
//! minimized by type-directed shrinking before being reported with the
//! original failure message.

use crate::{
    ast::{PropertyDecl, QualifiedName, TypeExpr},
    env::Env,
    error::{ErrorKind, RunError, RunResult},
    eval::{Evaluator, Interrupt},
    rng::XorShift32,
    runtime::{Runtime, TypeDecl},
    value::{ConstructorValue, Value},
};

pub(crate) const DEFAULT_ITERATIONS: u32 = 50;
/// Seed used when the runtime was never seeded explicitly.
pub(crate) const DEFAULT_SEED: u32 = 1;

const PREDICATE_ATTEMPTS: u32 = 100;
const MAX_SHRINK_ATTEMPTS: u32 = 100;
/// Structural depth at which generation falls back to type defaults.
const MAX_GEN_DEPTH: u32 = 4;

const INT_LOW: i64 = -20;
const INT_HIGH: i64 = 20;
const STRING_MAX_LEN: usize = 5;
const LIST_MAX_LEN: usize = 3;
const NONE_PROBABILITY: f64 = 0.3;

/// A minimized counterexample plus the original failure message.
#[derive(Debug, Clone)]
pub(crate) struct PropertyFailure {
    pub inputs: Vec<(String, Value)>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub(crate) enum PropertyOutcome {
    Passed { iterations: u32 },
    Failed(PropertyFailure),
}

/// Runs one property to completion. A generation failure (predicate retry cap
/// exceeded, ungeneratable type) surfaces as an error distinct from a
/// counterexample.
pub(crate) fn run_property(ev: &mut Evaluator, prop: &PropertyDecl, module: &QualifiedName) -> RunResult<PropertyOutcome> {
    let mut rng = ev.rt.rng.unwrap_or_else(|| XorShift32::new(DEFAULT_SEED));
    let result = run_property_inner(ev, prop, module, &mut rng);
    ev.rt.rng = Some(rng);
    result
}

fn run_property_inner(
    ev: &mut Evaluator,
    prop: &PropertyDecl,
    module: &QualifiedName,
    rng: &mut XorShift32,
) -> RunResult<PropertyOutcome> {
    let iterations = prop.iterations.unwrap_or(DEFAULT_ITERATIONS);
    for _ in 0..iterations {
        let mut inputs: Vec<(String, Value)> = Vec::with_capacity(prop.params.len());
        for (index, param) in prop.params.iter().enumerate() {
            let mut attempts = 0;
            let value = loop {
                attempts += 1;
                let candidate = generate(ev.rt, rng, &param.ty, module, 0)?;
                if predicate_holds(ev, prop, index, &inputs, &candidate, module)? {
                    break candidate;
                }
                if attempts >= PREDICATE_ATTEMPTS {
                    return Err(RunError::new(
                        ErrorKind::GenerationFailure,
                        format!(
                            "Could not generate a value for '{}' satisfying its predicate after {PREDICATE_ATTEMPTS} attempts",
                            param.name
                        ),
                    ));
                }
            };
            inputs.push((param.name.clone(), value));
        }

        if let Some(message) = counterexample_message(ev, prop, &inputs, module)? {
            let inputs = shrink(ev, prop, inputs, module)?;
            return Ok(PropertyOutcome::Failed(PropertyFailure { inputs, message }));
        }
    }
    Ok(PropertyOutcome::Passed { iterations })
}

/// Evaluates the property body under the given inputs; `Some(message)` when
/// the inputs are a counterexample.
fn counterexample_message(
    ev: &mut Evaluator,
    prop: &PropertyDecl,
    inputs: &[(String, Value)],
    module: &QualifiedName,
) -> RunResult<Option<String>> {
    let mut env = Env::from_bindings(inputs.iter().cloned());
    match ev.run_block(&prop.body, &mut env, module) {
        Ok(_) | Err(Interrupt::Return(Value::Unit)) => Ok(None),
        Err(Interrupt::Return(value)) => Ok(Some(format!("Property returned {value}"))),
        Err(Interrupt::Error(err)) => Ok(Some(err.message)),
    }
}

/// Checks the parameter's predicate with `candidate` substituted at `index`
/// (other current inputs stay bound).
fn predicate_holds(
    ev: &mut Evaluator,
    prop: &PropertyDecl,
    index: usize,
    inputs: &[(String, Value)],
    candidate: &Value,
    module: &QualifiedName,
) -> RunResult<bool> {
    let Some(predicate) = &prop.params[index].predicate else {
        return Ok(true);
    };
    let mut env = Env::new();
    for (i, (name, value)) in inputs.iter().enumerate() {
        if i != index {
            env.bind(name.clone(), value.clone());
        }
    }
    env.bind(prop.params[index].name.clone(), candidate.clone());

    let value = match ev.eval_expr(predicate, &mut env, module) {
        Ok(value) => value,
        Err(Interrupt::Error(err)) => return Err(err),
        Err(Interrupt::Return(_)) => Value::Unit,
    };
    match value {
        Value::Bool(holds) => Ok(holds),
        other => Err(RunError::new(
            ErrorKind::NonBooleanCondition,
            format!(
                "Predicate for '{}' must evaluate to Bool, got {}",
                prop.params[index].name,
                other.kind_name()
            ),
        )),
    }
}

// --- generation ---

/// Generates a value of the given type from the RNG stream.
///
/// Integers are uniform in [-20, 20], strings lowercase of length 0–5, lists
/// of length 0–3, optionals `None` with probability 0.3; records, schemas,
/// and sums recurse. At the depth cap the type's default takes over.
fn generate(rt: &Runtime, rng: &mut XorShift32, ty: &TypeExpr, module: &QualifiedName, depth: u32) -> RunResult<Value> {
    if depth >= MAX_GEN_DEPTH {
        return rt.default_for_type(ty, module);
    }
    match ty {
        TypeExpr::Optional { inner } => {
            if rng.next_chance(NONE_PROBABILITY) {
                Ok(Value::none())
            } else {
                Ok(Value::some(generate(rt, rng, inner, module, depth + 1)?))
            }
        }
        TypeExpr::Named { name, args } => match name.as_str() {
            "Int" => Ok(Value::Int(rng.next_in_range(INT_LOW, INT_HIGH))),
            "Bool" => Ok(Value::Bool(rng.next_chance(0.5))),
            "String" => {
                let len = rng.next_index(STRING_MAX_LEN + 1);
                let mut out = String::with_capacity(len);
                for _ in 0..len {
                    let c = b'a' + rng.next_index(26) as u8;
                    out.push(char::from(c));
                }
                Ok(Value::Str(out))
            }
            "List" => {
                let Some(element_ty) = args.first() else {
                    return Err(RunError::new(
                        ErrorKind::GenerationFailure,
                        "Cannot generate a List without an element type",
                    ));
                };
                let len = rng.next_index(LIST_MAX_LEN + 1);
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(generate(rt, rng, element_ty, module, depth + 1)?);
                }
                Ok(Value::List(items))
            }
            "Unit" => Ok(Value::Unit),
            _ => match rt.lookup_type(module, name) {
                Some(TypeDecl::Record(decl)) => generate_fields(rt, rng, &decl.name, &decl.fields, module, depth),
                Some(TypeDecl::Schema(decl)) => generate_fields(rt, rng, &decl.name, &decl.fields, module, depth),
                Some(TypeDecl::Sum(decl)) => {
                    if decl.variants.is_empty() {
                        return Err(RunError::new(
                            ErrorKind::GenerationFailure,
                            format!("Sum type '{}' has no variants", decl.name),
                        ));
                    }
                    let variant = &decl.variants[rng.next_index(decl.variants.len())];
                    generate_fields(rt, rng, &variant.name, &variant.fields, module, depth)
                }
                Some(TypeDecl::Alias(decl)) => generate(rt, rng, &decl.target, module, depth),
                None => Err(RunError::new(
                    ErrorKind::GenerationFailure,
                    format!("Cannot generate a value of type '{name}'"),
                )),
            },
        },
    }
}

fn generate_fields(
    rt: &Runtime,
    rng: &mut XorShift32,
    tag: &str,
    fields: &[crate::ast::FieldDecl],
    module: &QualifiedName,
    depth: u32,
) -> RunResult<Value> {
    let mut ctor = ConstructorValue::new(tag);
    for field in fields {
        let value = if field.optional && rng.next_chance(NONE_PROBABILITY) {
            Value::none()
        } else {
            generate(rt, rng, &field.ty, module, depth + 1)?
        };
        ctor.fields.insert(field.name.clone(), value);
    }
    Ok(Value::Constructor(ctor))
}

// --- shrinking ---

/// Repeatedly applies the first accepted shrink step until no candidate still
/// fails or the attempt cap is hit. A candidate is accepted only if it is
/// strictly smaller than the value it replaces, keeps satisfying the
/// parameter's predicate, and the property still fails on it — strict
/// shrinkage is what makes the search terminate instead of oscillating
/// between neighbors.
fn shrink(
    ev: &mut Evaluator,
    prop: &PropertyDecl,
    original: Vec<(String, Value)>,
    module: &QualifiedName,
) -> RunResult<Vec<(String, Value)>> {
    let mut current = original;
    let mut attempts = 0u32;
    'search: loop {
        for index in 0..current.len() {
            for candidate in shrink_candidates(&current[index].1) {
                if attempts >= MAX_SHRINK_ATTEMPTS {
                    break 'search;
                }
                if value_size(&candidate) >= value_size(&current[index].1) {
                    continue;
                }
                attempts += 1;
                if !predicate_holds(ev, prop, index, &current, &candidate, module)? {
                    continue;
                }
                let mut trial = current.clone();
                trial[index].1 = candidate;
                if counterexample_message(ev, prop, &trial, module)?.is_some() {
                    current = trial;
                    continue 'search;
                }
            }
        }
        break;
    }
    Ok(current)
}

/// Structural size used to order shrink candidates.
fn value_size(value: &Value) -> u64 {
    match value {
        Value::Int(v) => v.unsigned_abs(),
        Value::Bool(v) => u64::from(*v),
        Value::Str(s) => s.chars().count() as u64,
        Value::List(items) => items.len() as u64 + items.iter().map(value_size).sum::<u64>(),
        Value::Constructor(ctor) => ctor.fields.len() as u64 + ctor.fields.values().map(value_size).sum::<u64>(),
        Value::ActorRef(_) | Value::Unit => 0,
    }
}

/// Type-directed smaller candidates, most aggressive first.
fn shrink_candidates(value: &Value) -> Vec<Value> {
    match value {
        Value::Int(v) => {
            let mut out = vec![0, v / 2, v - 1, v + 1];
            out.dedup();
            out.retain(|candidate| candidate != v);
            out.into_iter().map(Value::Int).collect()
        }
        Value::Str(s) => {
            if s.is_empty() {
                return Vec::new();
            }
            let chars: Vec<char> = s.chars().collect();
            let variants = [
                String::new(),
                chars[1..].iter().collect(),
                chars[..chars.len() - 1].iter().collect(),
                chars[..chars.len() / 2].iter().collect(),
            ];
            let mut out: Vec<Value> = Vec::new();
            for variant in variants {
                if variant != *s && !out.contains(&Value::Str(variant.clone())) {
                    out.push(Value::Str(variant));
                }
            }
            out
        }
        Value::List(items) => {
            if items.is_empty() {
                return Vec::new();
            }
            let mut out = vec![
                Value::List(Vec::new()),
                Value::List(items[1..].to_vec()),
                Value::List(items[..items.len() - 1].to_vec()),
                Value::List(items[..items.len() / 2].to_vec()),
            ];
            out.retain(|candidate| candidate != value);
            for (index, item) in items.iter().enumerate() {
                for candidate in shrink_candidates(item) {
                    let mut shrunk = items.clone();
                    shrunk[index] = candidate;
                    out.push(Value::List(shrunk));
                }
            }
            out
        }
        Value::Constructor(ctor) => {
            let mut out = Vec::new();
            if ctor.name == "Some" {
                out.push(Value::none());
            }
            for (name, field_value) in &ctor.fields {
                for candidate in shrink_candidates(field_value) {
                    let mut shrunk = ctor.clone();
                    shrunk.fields.insert(name.clone(), candidate);
                    out.push(Value::Constructor(shrunk));
                }
            }
            out
        }
        Value::Bool(_) | Value::ActorRef(_) | Value::Unit => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_candidates_lead_with_zero() {
        let candidates = shrink_candidates(&Value::Int(10));
        assert_eq!(candidates[0], Value::Int(0));
        assert!(candidates.contains(&Value::Int(5)));
        assert!(candidates.contains(&Value::Int(9)));
        assert!(candidates.contains(&Value::Int(11)));
    }

    #[test]
    fn zero_only_suggests_neighbors() {
        let candidates = shrink_candidates(&Value::Int(0));
        assert_eq!(candidates, vec![Value::Int(-1), Value::Int(1)]);
    }

    #[test]
    fn some_shrinks_to_none() {
        let candidates = shrink_candidates(&Value::some(Value::Int(3)));
        assert_eq!(candidates[0], Value::none());
    }

    #[test]
    fn strings_and_lists_propose_shorter_forms() {
        let candidates = shrink_candidates(&Value::Str("abcd".into()));
        assert_eq!(candidates[0], Value::Str(String::new()));
        assert!(candidates.contains(&Value::Str("bcd".into())));
        assert!(candidates.contains(&Value::Str("abc".into())));
        assert!(candidates.contains(&Value::Str("ab".into())));

        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let candidates = shrink_candidates(&list);
        assert_eq!(candidates[0], Value::List(Vec::new()));
        assert!(!candidates.contains(&list));
    }

    #[test]
    fn terminal_values_do_not_shrink() {
        assert!(shrink_candidates(&Value::Unit).is_empty());
        assert!(shrink_candidates(&Value::Bool(true)).is_empty());
        assert!(shrink_candidates(&Value::Str(String::new())).is_empty());
    }
}
