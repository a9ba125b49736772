//! The tree-walking evaluator.
//!
//! Walks blocks, statements, and expressions against an [`Env`], threading all
//! effects through the shared [`Runtime`]. Call dispatch tries, in order:
//! built-ins, `binding.send` sugar, `Actor.spawn`, `Actor.Handler` synchronous
//! delivery, and finally resolved user functions (with contract enforcement).

use std::rc::Rc;

use crate::{
    actors,
    args::{ActualArg, bind_arguments},
    ast::{BinaryOp, CallArg, CalleePath, Expr, ExprLoc, MatchCase, Pattern, QualifiedName, Stmt},
    builtins::{self, Builtin},
    contracts,
    env::Env,
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    report::TraceStep,
    runtime::{FunctionEntry, Runtime},
    value::{ConstructorValue, Value},
};

/// Hard cap on user-call nesting; runaway recursion fails instead of
/// exhausting the host stack.
const MAX_CALL_DEPTH: u32 = 512;

/// Why evaluation of the current construct stopped early.
///
/// `Return` is ordinary control flow (an early `return` unwinding to the
/// nearest function/handler boundary); `Error` aborts the current call and
/// unwinds to the driver.
#[derive(Debug)]
pub(crate) enum Interrupt {
    Error(RunError),
    Return(Value),
}

impl From<RunError> for Interrupt {
    fn from(err: RunError) -> Self {
        Self::Error(err)
    }
}

pub(crate) type EvalResult<T> = Result<T, Interrupt>;

/// Converts an evaluation outcome at a function boundary, where `Return`
/// becomes the call's value.
pub(crate) fn at_boundary(result: EvalResult<Value>) -> Result<Value, Interrupt> {
    match result {
        Err(Interrupt::Return(value)) => Ok(value),
        other => other,
    }
}

pub(crate) struct Evaluator<'rt> {
    pub(crate) rt: &'rt mut Runtime,
    depth: u32,
}

impl<'rt> Evaluator<'rt> {
    pub(crate) fn new(rt: &'rt mut Runtime) -> Self {
        Self { rt, depth: 0 }
    }

    /// Calls a function by (possibly bare) name from the primary module.
    pub(crate) fn call_named(&mut self, name: &str, actuals: Vec<ActualArg>) -> RunResult<Value> {
        let module = self.rt.primary_module.clone();
        let Some(entry) = self.rt.lookup_function(&module, name) else {
            return Err(RunError::unknown_function(name));
        };
        match self.call_function(&entry, actuals, &CodeLoc::synthetic()) {
            Ok(value) | Err(Interrupt::Return(value)) => Ok(value),
            Err(Interrupt::Error(err)) => Err(err),
        }
    }

    /// Runs a free-standing block (test or property body) in the given module.
    pub(crate) fn run_block(&mut self, block: &[Stmt], env: &mut Env, module: &QualifiedName) -> EvalResult<Value> {
        self.eval_block(block, env, module)
    }

    // --- functions ---

    pub(crate) fn call_function(
        &mut self,
        entry: &FunctionEntry,
        actuals: Vec<ActualArg>,
        loc: &CodeLoc,
    ) -> EvalResult<Value> {
        let decl = Rc::clone(&entry.decl);
        let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
        let bound = bind_arguments(&decl.name, &params, actuals, loc)?;

        if self.depth >= MAX_CALL_DEPTH {
            return Err(RunError::new(
                ErrorKind::RecursionLimit,
                format!("Call depth exceeded {MAX_CALL_DEPTH} calling '{}'", decl.name),
            )
            .with_loc(loc)
            .into());
        }
        self.depth += 1;
        let result = self.call_function_body(entry, bound);
        self.depth -= 1;
        result
    }

    fn call_function_body(
        &mut self,
        entry: &FunctionEntry,
        bound: indexmap::IndexMap<String, Value>,
    ) -> EvalResult<Value> {
        let decl = Rc::clone(&entry.decl);
        if self.rt.tracing {
            let args: Vec<String> = bound.values().map(ToString::to_string).collect();
            self.rt.trace(
                TraceStep::Call,
                format!("call {}({})", decl.name, args.join(", ")),
                None,
                self.depth,
            );
        }

        let qualified = entry.module.member(&decl.name);
        let contract = self.rt.contracts.get(&qualified).cloned();

        let mut env = Env::from_bindings(bound);
        let param_env = contract.as_ref().map(|_| env.clone());
        if let (Some(contract), Some(param_env)) = (&contract, &param_env) {
            contracts::check_requires(self, contract, param_env)?;
        }

        let value = at_boundary(self.eval_block(&decl.body, &mut env, &entry.module))?;

        if let (Some(contract), Some(param_env)) = (&contract, &param_env) {
            contracts::check_ensures(self, contract, param_env, &value)?;
        }

        if self.rt.tracing {
            self.rt.trace(
                TraceStep::Return,
                format!("return from {}", decl.name),
                Some(value.to_string()),
                self.depth,
            );
        }
        Ok(value)
    }

    // --- blocks and statements ---

    /// Evaluates statements in order. The block's value is the value of its
    /// last statement when that statement is an expression, `unit` otherwise.
    pub(crate) fn eval_block(&mut self, block: &[Stmt], env: &mut Env, module: &QualifiedName) -> EvalResult<Value> {
        let mut last = Value::Unit;
        for stmt in block {
            last = self.eval_stmt(stmt, env, module)?.unwrap_or(Value::Unit);
        }
        Ok(last)
    }

    /// Evaluates one statement; `Some(value)` when it was an expression statement.
    fn eval_stmt(&mut self, stmt: &Stmt, env: &mut Env, module: &QualifiedName) -> EvalResult<Option<Value>> {
        match stmt {
            Stmt::Let { name, value } => {
                let v = self.eval_expr(value, env, module)?;
                if self.rt.tracing {
                    let depth = self.depth;
                    self.rt
                        .trace(TraceStep::Let, format!("let {name}"), Some(v.to_string()), depth);
                }
                env.bind(name.clone(), v);
                Ok(None)
            }
            Stmt::Assign { name, value } => {
                let v = self.eval_expr(value, env, module)?;
                if !env.assign(name, v) {
                    return Err(RunError::unknown_variable(name).with_loc(&value.loc).into());
                }
                Ok(None)
            }
            Stmt::Return { value } => {
                let v = self.eval_expr(value, env, module)?;
                Err(Interrupt::Return(v))
            }
            Stmt::Expr { value } => {
                let v = self.eval_expr(value, env, module)?;
                if self.rt.tracing {
                    let depth = self.depth;
                    self.rt
                        .trace(TraceStep::Expr, "expr".to_owned(), Some(v.to_string()), depth);
                }
                Ok(Some(v))
            }
            Stmt::AsyncGroup { body, .. } => {
                self.eval_async_group(body, env, module)?;
                Ok(None)
            }
            Stmt::Async { loc, .. } => Err(RunError::new(
                ErrorKind::TypeError,
                "An async block is only allowed directly inside async_group",
            )
            .with_loc(loc)
            .into()),
        }
    }

    // --- structured concurrency ---

    /// Runs an `async_group` body. `async` children become cooperative tasks;
    /// an outer `return` (direct or from a nested statement) drains scheduled
    /// tasks before propagating.
    fn eval_async_group(&mut self, body: &[Stmt], env: &mut Env, module: &QualifiedName) -> EvalResult<()> {
        let mut tasks: Vec<AsyncTask<'_>> = Vec::new();
        for stmt in body {
            if let Stmt::Async { body: task_body, .. } = stmt {
                tasks.push(AsyncTask {
                    stmts: task_body,
                    cursor: 0,
                    cancelled: false,
                    env: env.clone(),
                });
                continue;
            }
            match self.eval_stmt(stmt, env, module) {
                Ok(_) => {}
                Err(Interrupt::Return(value)) => {
                    self.drain_tasks(&mut tasks, module)?;
                    return Err(Interrupt::Return(value));
                }
                Err(err) => return Err(err),
            }
        }
        self.drain_tasks(&mut tasks, module)
    }

    /// Advances every live task round-robin, one statement per turn. The first
    /// error cancels all siblings and propagates.
    fn drain_tasks(&mut self, tasks: &mut [AsyncTask<'_>], module: &QualifiedName) -> EvalResult<()> {
        loop {
            let mut progressed = false;
            for index in 0..tasks.len() {
                if tasks[index].cancelled || tasks[index].cursor >= tasks[index].stmts.len() {
                    continue;
                }
                let stmts = tasks[index].stmts;
                let stmt = &stmts[tasks[index].cursor];
                tasks[index].cursor += 1;
                progressed = true;

                let mut task_env = std::mem::take(&mut tasks[index].env);
                let step = self.eval_stmt(stmt, &mut task_env, module);
                tasks[index].env = task_env;

                match step {
                    Ok(_) => {}
                    Err(Interrupt::Return(_)) => {
                        for task in tasks.iter_mut() {
                            task.cancelled = true;
                        }
                        return Err(RunError::new(
                            ErrorKind::TypeError,
                            "return is not allowed inside an async block",
                        )
                        .into());
                    }
                    Err(err) => {
                        for task in tasks.iter_mut() {
                            task.cancelled = true;
                        }
                        return Err(err);
                    }
                }
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    // --- expressions ---

    pub(crate) fn eval_expr(&mut self, expr: &ExprLoc, env: &mut Env, module: &QualifiedName) -> EvalResult<Value> {
        let loc = &expr.loc;
        match &expr.expr {
            Expr::Int { value } => Ok(Value::Int(*value)),
            Expr::Bool { value } => Ok(Value::Bool(*value)),
            Expr::Str { value } => Ok(Value::Str(value.clone())),
            Expr::List { items } => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_expr(item, env, module)?);
                }
                Ok(Value::List(out))
            }
            Expr::Var { name } => env
                .get(name)
                .cloned()
                .ok_or_else(|| RunError::unknown_variable(name).with_loc(loc).into()),
            Expr::Binary { op, left, right } => {
                let l = self.eval_expr(left, env, module)?;
                let r = self.eval_expr(right, env, module)?;
                eval_binary(*op, l, r, loc)
            }
            Expr::If {
                cond,
                then_block,
                else_block,
            } => {
                let condition = self.eval_expr(cond, env, module)?;
                let Value::Bool(condition) = condition else {
                    return Err(RunError::non_boolean_condition(condition.kind_name())
                        .with_loc(&cond.loc)
                        .into());
                };
                if condition {
                    let mut branch_env = env.clone();
                    self.eval_block(then_block, &mut branch_env, module)
                } else if let Some(else_block) = else_block {
                    let mut branch_env = env.clone();
                    self.eval_block(else_block, &mut branch_env, module)
                } else {
                    Ok(Value::Unit)
                }
            }
            Expr::Match { scrutinee, cases } => {
                let value = self.eval_expr(scrutinee, env, module)?;
                if self.rt.tracing {
                    let depth = self.depth;
                    self.rt
                        .trace(TraceStep::Match, "match".to_owned(), Some(value.to_string()), depth);
                }
                self.eval_match(&value, cases, env, module, loc)
            }
            Expr::Construct { name, fields } => {
                let mut ctor = ConstructorValue::new(name.clone());
                for field in fields {
                    let v = self.eval_expr(&field.value, env, module)?;
                    ctor.fields.insert(field.name.clone(), v);
                }
                Ok(Value::Constructor(ctor))
            }
            Expr::FieldAccess { object, field } => {
                let value = self.eval_expr(object, env, module)?;
                let ctor = value.expect_constructor("Field access").map_err(|e| e.with_loc(loc))?;
                ctor.fields.get(field).cloned().ok_or_else(|| {
                    RunError::new(
                        ErrorKind::WrongOperandType,
                        format!("No field '{field}' on '{}'", ctor.name),
                    )
                    .with_loc(loc)
                    .into()
                })
            }
            Expr::Index { object, index } => {
                let value = self.eval_expr(object, env, module)?;
                let items = value.expect_list("Indexing").map_err(|e| e.with_loc(loc))?;
                let i = self
                    .eval_expr(index, env, module)?
                    .expect_int("List index")
                    .map_err(|e| e.with_loc(loc))?;
                if i < 0 || i as usize >= items.len() {
                    return Err(RunError::index_out_of_bounds(i, items.len()).with_loc(loc).into());
                }
                Ok(items[i as usize].clone())
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, env, module, loc),
            Expr::Hole => Err(RunError::unfilled_hole().with_loc(loc).into()),
        }
    }

    fn eval_match(
        &mut self,
        value: &Value,
        cases: &[MatchCase],
        env: &mut Env,
        module: &QualifiedName,
        loc: &CodeLoc,
    ) -> EvalResult<Value> {
        for case in cases {
            let mut bindings = Vec::new();
            if match_pattern(&case.pattern, value, &mut bindings) {
                let mut case_env = env.clone();
                for (name, bound) in bindings {
                    case_env.bind(name, bound);
                }
                return self.eval_block(&case.body, &mut case_env, module);
            }
        }
        Err(RunError::non_exhaustive_match().with_loc(loc).into())
    }

    // --- call dispatch ---

    fn eval_call(
        &mut self,
        callee: &CalleePath,
        args: &[CallArg],
        env: &mut Env,
        module: &QualifiedName,
        loc: &CodeLoc,
    ) -> EvalResult<Value> {
        let dotted = callee.dotted();

        // 1. built-ins
        if let Ok(builtin) = dotted.parse::<Builtin>() {
            let actuals = self.eval_actuals(args, env, module)?;
            return builtins::call(self, builtin, actuals, module, loc);
        }

        // 2. actor-send sugar: `target.send(Message{..})` for a local actor-ref binding
        if callee.0.len() == 2 && callee.last() == "send" {
            if let Some(Value::ActorRef(target)) = env.get(&callee.0[0]).cloned() {
                let actuals = self.eval_actuals(args, env, module)?;
                return actors::send_sugar(self, target, actuals, loc);
            }
        }

        if let Some(prefix) = callee.prefix() {
            if let Some(entry) = self.rt.lookup_actor(module, &prefix) {
                // 3. actor spawn
                if callee.last() == "spawn" {
                    let actuals = self.eval_actuals(args, env, module)?;
                    return actors::spawn(self, &entry, actuals, loc);
                }
                // 4. synchronous handler delivery, bypassing the mailbox
                if let Some(handler) = entry.decl.handler(callee.last()) {
                    if handler.params.first().is_some_and(|p| p.name == "actor") {
                        let actuals = self.eval_actuals(args, env, module)?;
                        return actors::call_handler_sync(self, &entry, callee.last(), actuals, loc);
                    }
                }
            }
        }

        // 5. user function
        let Some(entry) = self.rt.lookup_function(module, &dotted) else {
            return Err(RunError::unknown_function(&dotted).with_loc(loc).into());
        };
        let actuals = self.eval_actuals(args, env, module)?;
        self.call_function(&entry, actuals, loc)
    }

    /// Evaluates call actuals in source order.
    fn eval_actuals(&mut self, args: &[CallArg], env: &mut Env, module: &QualifiedName) -> EvalResult<Vec<ActualArg>> {
        let mut actuals = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.eval_expr(&arg.value, env, module)?;
            actuals.push(ActualArg {
                name: arg.name.clone(),
                value,
            });
        }
        Ok(actuals)
    }
}

/// Applies a binary operator to two already-evaluated operands.
///
/// Arithmetic is integer-only with wrapping semantics and truncating signed
/// division; `==`/`!=` are structural over any two values; comparisons are
/// integer-only; `&&`/`||` are boolean-only and strict.
fn eval_binary(op: BinaryOp, left: Value, right: Value, loc: &CodeLoc) -> EvalResult<Value> {
    let operands = |expected: &str| {
        Interrupt::Error(
            RunError::wrong_operand(
                expected,
                &format!("{} and {}", left.kind_name(), right.kind_name()),
                &format!("Operator '{}'", op.symbol()),
            )
            .with_loc(loc),
        )
    };
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (Value::Int(l), Value::Int(r)) = (&left, &right) else {
                return Err(operands("Int operands"));
            };
            let result = match op {
                BinaryOp::Add => l.wrapping_add(*r),
                BinaryOp::Sub => l.wrapping_sub(*r),
                BinaryOp::Mul => l.wrapping_mul(*r),
                BinaryOp::Div => {
                    if *r == 0 {
                        return Err(RunError::division_by_zero().with_loc(loc).into());
                    }
                    l.wrapping_div(*r)
                }
                _ => unreachable!(),
            };
            Ok(Value::Int(result))
        }
        BinaryOp::Lt | BinaryOp::LtE | BinaryOp::Gt | BinaryOp::GtE => {
            let (Value::Int(l), Value::Int(r)) = (&left, &right) else {
                return Err(operands("Int operands"));
            };
            let result = match op {
                BinaryOp::Lt => l < r,
                BinaryOp::LtE => l <= r,
                BinaryOp::Gt => l > r,
                BinaryOp::GtE => l >= r,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        // Both sides are already evaluated: boolean operators are strict.
        BinaryOp::And | BinaryOp::Or => {
            let (Value::Bool(l), Value::Bool(r)) = (&left, &right) else {
                return Err(operands("Bool operands"));
            };
            Ok(Value::Bool(if op == BinaryOp::And { *l && *r } else { *l || *r }))
        }
    }
}

/// One cooperative task of an `async_group`.
struct AsyncTask<'a> {
    stmts: &'a [Stmt],
    cursor: usize,
    cancelled: bool,
    env: Env,
}

/// Matches a pattern against a value, collecting bindings on success.
///
/// Bindings may be partially collected on failure; callers only apply them
/// when the whole pattern matched.
fn match_pattern(pattern: &Pattern, value: &Value, bindings: &mut Vec<(String, Value)>) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Var { name } => {
            bindings.push((name.clone(), value.clone()));
            true
        }
        Pattern::Int { value: expected } => matches!(value, Value::Int(v) if v == expected),
        Pattern::Bool { value: expected } => matches!(value, Value::Bool(v) if v == expected),
        Pattern::Str { value: expected } => matches!(value, Value::Str(v) if v == expected),
        Pattern::Constructor { name, fields } => {
            let Value::Constructor(ctor) = value else {
                return false;
            };
            if ctor.name != *name {
                return false;
            }
            fields.iter().all(|field| {
                ctor.fields
                    .get(&field.name)
                    .is_some_and(|v| match_pattern(&field.pattern, v, bindings))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctor(name: &str, fields: &[(&str, Value)]) -> Value {
        let mut c = ConstructorValue::new(name);
        for (k, v) in fields {
            c.fields.insert((*k).to_owned(), v.clone());
        }
        Value::Constructor(c)
    }

    #[test]
    fn constructor_patterns_bind_fields() {
        let value = ctor("Circle", &[("r", Value::Int(5))]);
        let pattern = Pattern::Constructor {
            name: "Circle".to_owned(),
            fields: vec![crate::ast::FieldPattern {
                name: "r".to_owned(),
                pattern: Pattern::Var { name: "r".to_owned() },
            }],
        };
        let mut bindings = Vec::new();
        assert!(match_pattern(&pattern, &value, &mut bindings));
        assert_eq!(bindings, vec![("r".to_owned(), Value::Int(5))]);
    }

    #[test]
    fn mismatched_tag_does_not_match() {
        let value = ctor("Square", &[("s", Value::Int(3))]);
        let pattern = Pattern::Constructor {
            name: "Circle".to_owned(),
            fields: vec![],
        };
        let mut bindings = Vec::new();
        assert!(!match_pattern(&pattern, &value, &mut bindings));
    }

    #[test]
    fn literal_patterns_compare_structurally() {
        let mut bindings = Vec::new();
        assert!(match_pattern(&Pattern::Int { value: 4 }, &Value::Int(4), &mut bindings));
        assert!(!match_pattern(&Pattern::Int { value: 4 }, &Value::Bool(true), &mut bindings));
        assert!(match_pattern(&Pattern::Wildcard, &Value::Unit, &mut bindings));
    }
}
