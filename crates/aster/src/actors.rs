//! The actor runtime.
//!
//! Actor instances own immutable constructor bindings, mutable state fields,
//! and a FIFO mailbox. Deliveries are driven by the shared scheduler queue:
//! eagerly on `send` in immediate mode (behind the re-entrance guard), or via
//! the `Concurrent.step`/`Concurrent.flush` built-ins in deterministic mode.
//! Handler failures during asynchronous delivery travel up the supervision
//! tree as `ChildFailed` messages instead of unwinding into the sender.

use std::{collections::VecDeque, rc::Rc};

use indexmap::IndexMap;

use crate::{
    args::{ActualArg, bind_arguments},
    ast::{ActorDecl, HandlerDecl, QualifiedName, TypeExpr},
    env::Env,
    error::{CodeLoc, RunError},
    eval::{EvalResult, Evaluator, Interrupt, at_boundary},
    runtime::{ActorEntry, Runtime, SchedulerMode},
    value::{ActorId, ConstructorValue, Value},
};

/// Message tag delivered to the nearest handling ancestor when a descendant fails.
pub(crate) const CHILD_FAILED_TAG: &str = "ChildFailed";

/// Name of the leading self-reference parameter of synchronously callable handlers.
const SELF_PARAM: &str = "actor";

/// One live actor.
#[derive(Debug)]
pub(crate) struct ActorInstance {
    pub decl: Rc<ActorDecl>,
    pub module: QualifiedName,
    /// Constructor-argument bindings; immutable after spawn.
    pub ctor: IndexMap<String, Value>,
    /// State-field values, initialized from the field types' defaults.
    pub state: IndexMap<String, Value>,
    pub mailbox: VecDeque<ConstructorValue>,
    pub terminated: bool,
    pub supervisor: Option<ActorId>,
}

/// Parent/children links of one actor in the supervision tree.
#[derive(Debug, Default)]
pub(crate) struct SupervisionNode {
    pub parent: Option<ActorId>,
    pub children: Vec<ActorId>,
}

// --- lifecycle ---

/// Creates a fresh instance: next id, default-initialized state, constructor
/// params bound from the call arguments, supervised by the currently
/// executing actor (if any).
pub(crate) fn spawn(ev: &mut Evaluator, entry: &ActorEntry, actuals: Vec<ActualArg>, loc: &CodeLoc) -> EvalResult<Value> {
    let decl = Rc::clone(&entry.decl);
    let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
    let ctor = bind_arguments(&decl.name, &params, actuals, loc)?;

    let mut state = IndexMap::with_capacity(decl.state.len());
    for field in &decl.state {
        let value = ev.rt.default_for_type(&field.ty, &entry.module).map_err(|e| e.with_loc(loc))?;
        state.insert(field.name.clone(), value);
    }

    let id = ev.rt.fresh_actor_id();
    let supervisor = ev.rt.current_actor_stack.last().copied();
    ev.rt.actor_instances.insert(
        id,
        ActorInstance {
            decl,
            module: entry.module.clone(),
            ctor,
            state,
            mailbox: VecDeque::new(),
            terminated: false,
            supervisor,
        },
    );
    ev.rt.supervision.insert(
        id,
        SupervisionNode {
            parent: supervisor,
            children: Vec::new(),
        },
    );
    if let Some(parent) = supervisor {
        if let Some(node) = ev.rt.supervision.get_mut(&parent) {
            node.children.push(id);
        }
    }
    Ok(Value::ActorRef(id))
}

/// Destroys an actor and all descendants, children first. Terminated
/// instances silently drop any subsequent send.
pub(crate) fn stop_subtree(rt: &mut Runtime, id: ActorId) {
    let children = rt.supervision.get(&id).map(|node| node.children.clone()).unwrap_or_default();
    for child in children {
        stop_subtree(rt, child);
    }
    if let Some(mut instance) = rt.actor_instances.remove(&id) {
        instance.terminated = true;
        instance.mailbox.clear();
    }
    if let Some(node) = rt.supervision.remove(&id) {
        if let Some(parent) = node.parent {
            if let Some(parent_node) = rt.supervision.get_mut(&parent) {
                parent_node.children.retain(|child| *child != id);
            }
        }
    }
}

// --- messaging ---

/// `target.send(Message{..})` sugar: enqueues the lone constructor argument.
pub(crate) fn send_sugar(
    ev: &mut Evaluator,
    target: ActorId,
    actuals: Vec<ActualArg>,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let mut bound = bind_arguments("send", &["message"], actuals, loc)?;
    let message = bound.shift_remove("message").expect("binder guarantees the parameter");
    let message = match message {
        Value::Constructor(ctor) => ctor,
        other => {
            return Err(RunError::wrong_operand("a constructor value", other.kind_name(), "send")
                .with_loc(loc)
                .into());
        }
    };
    send(ev, target, message)?;
    Ok(Value::Unit)
}

/// Appends a message to the target's mailbox and enqueues a delivery record.
///
/// A send to a destroyed actor is silently dropped. In immediate mode this
/// drains all pending deliveries before returning, so a send may run an
/// arbitrary amount of code.
pub(crate) fn send(ev: &mut Evaluator, target: ActorId, message: ConstructorValue) -> EvalResult<()> {
    match ev.rt.actor_instances.get_mut(&target) {
        Some(instance) if !instance.terminated => {
            instance.mailbox.push_back(message);
            ev.rt.pending_deliveries.push_back(target);
        }
        _ => return Ok(()),
    }
    if ev.rt.scheduler_mode == SchedulerMode::Immediate && !ev.rt.is_processing {
        flush(ev)?;
    }
    Ok(())
}

/// Drains all pending deliveries; returns how many messages actually ran.
pub(crate) fn flush(ev: &mut Evaluator) -> EvalResult<i64> {
    if ev.rt.is_processing {
        return Ok(0);
    }
    ev.rt.is_processing = true;
    let mut delivered = 0;
    let result = loop {
        let Some(target) = ev.rt.pending_deliveries.pop_front() else {
            break Ok(delivered);
        };
        match deliver_to(ev, target) {
            Ok(true) => delivered += 1,
            Ok(false) => {}
            Err(err) => break Err(err),
        }
    };
    ev.rt.is_processing = false;
    result
}

/// Delivers at most one message; returns whether one ran. Stale records
/// (terminated targets, drained mailboxes) are discarded along the way.
pub(crate) fn step(ev: &mut Evaluator) -> EvalResult<bool> {
    if ev.rt.is_processing {
        return Ok(false);
    }
    ev.rt.is_processing = true;
    let result = loop {
        let Some(target) = ev.rt.pending_deliveries.pop_front() else {
            break Ok(false);
        };
        match deliver_to(ev, target) {
            Ok(true) => break Ok(true),
            Ok(false) => {}
            Err(err) => break Err(err),
        }
    };
    ev.rt.is_processing = false;
    result
}

/// Processes one delivery record: pops one message from the target's mailbox
/// and runs its handler, routing failures into the supervision tree.
fn deliver_to(ev: &mut Evaluator, target: ActorId) -> EvalResult<bool> {
    let message = match ev.rt.actor_instances.get_mut(&target) {
        Some(instance) if !instance.terminated => instance.mailbox.pop_front(),
        _ => None,
    };
    let Some(message) = message else {
        return Ok(false);
    };

    match run_handler_message(ev, target, &message) {
        Ok(_) => Ok(true),
        Err(Interrupt::Error(err)) => {
            handle_failure(ev, target, &message.name, err)?;
            Ok(true)
        }
        Err(interrupt @ Interrupt::Return(_)) => Err(interrupt),
    }
}

// --- handler execution ---

/// Binds a delivered message to its handler's parameters.
///
/// A single-parameter handler whose parameter type names the message tag
/// receives the whole constructor value; otherwise parameters bind from the
/// message's named fields. A leading `actor` parameter binds to the receiving
/// instance itself.
fn message_bindings(
    handler: &HandlerDecl,
    target: ActorId,
    message: &ConstructorValue,
) -> Result<IndexMap<String, Value>, RunError> {
    if handler.params.len() == 1 {
        let param = &handler.params[0];
        if matches!(&param.ty, TypeExpr::Named { name, .. } if *name == message.name) {
            let mut bound = IndexMap::with_capacity(1);
            bound.insert(param.name.clone(), Value::Constructor(message.clone()));
            return Ok(bound);
        }
    }

    let mut params: Vec<&str> = Vec::with_capacity(handler.params.len());
    let mut leading_self = false;
    for (index, param) in handler.params.iter().enumerate() {
        if index == 0 && param.name == SELF_PARAM {
            leading_self = true;
            continue;
        }
        params.push(param.name.as_str());
    }
    let actuals = message
        .fields
        .iter()
        .map(|(name, value)| ActualArg::named(name.clone(), value.clone()))
        .collect();
    let mut bound = bind_arguments(&handler.message, &params, actuals, &handler.loc)?;
    if leading_self {
        bound.insert(SELF_PARAM.to_owned(), Value::ActorRef(target));
    }
    Ok(bound)
}

fn run_handler_message(ev: &mut Evaluator, target: ActorId, message: &ConstructorValue) -> EvalResult<Value> {
    let (decl, module) = {
        let instance = ev
            .rt
            .actor_instances
            .get(&target)
            .expect("delivery checked the instance");
        (Rc::clone(&instance.decl), instance.module.clone())
    };
    let Some(handler) = decl.handler(&message.name) else {
        return Err(RunError::no_handler(&decl.name, &message.name).into());
    };
    let bindings = message_bindings(handler, target, message)?;
    run_handler_core(ev, target, handler, &module, bindings)
}

/// Runs a handler body in a fresh environment of constructor params, current
/// state-field values, and message bindings, then writes state back.
///
/// Write-back is conservative: a field is updated from the handler's
/// environment only if its current value still equals the pre-handler value,
/// so a re-entrant delivery that already moved the state wins.
fn run_handler_core(
    ev: &mut Evaluator,
    target: ActorId,
    handler: &HandlerDecl,
    module: &QualifiedName,
    bindings: IndexMap<String, Value>,
) -> EvalResult<Value> {
    let pre_state = {
        let instance = ev
            .rt
            .actor_instances
            .get(&target)
            .expect("caller checked the instance");
        instance.state.clone()
    };

    let mut env = Env::new();
    {
        let instance = ev.rt.actor_instances.get(&target).expect("caller checked the instance");
        for (name, value) in &instance.ctor {
            env.bind(name.clone(), value.clone());
        }
    }
    for (name, value) in &pre_state {
        env.bind(name.clone(), value.clone());
    }
    for (name, value) in bindings {
        env.bind(name, value);
    }

    ev.rt.current_actor_stack.push(target);
    let outcome = at_boundary(ev.run_block(&handler.body, &mut env, module));
    ev.rt.current_actor_stack.pop();
    let value = outcome?;

    if let Some(instance) = ev.rt.actor_instances.get_mut(&target) {
        for (name, pre_value) in &pre_state {
            let unchanged = instance.state.get(name) == Some(pre_value);
            if unchanged {
                if let Some(post) = env.get(name) {
                    instance.state.insert(name.clone(), post.clone());
                }
            }
        }
    }
    Ok(value)
}

/// Synchronous delivery via the `Actor.Handler(ref, ...)` call form.
///
/// Bypasses the mailbox and returns the handler's value. A failure escapes to
/// the caller unchanged — no supervision notification — though the instance's
/// subtree is still destroyed.
pub(crate) fn call_handler_sync(
    ev: &mut Evaluator,
    entry: &ActorEntry,
    handler_name: &str,
    actuals: Vec<ActualArg>,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let decl = Rc::clone(&entry.decl);
    let handler = decl.handler(handler_name).expect("dispatch checked the handler");
    let params: Vec<&str> = handler.params.iter().map(|p| p.name.as_str()).collect();
    let bound = bind_arguments(&format!("{}.{handler_name}", decl.name), &params, actuals, loc)?;

    let target = bound
        .get(SELF_PARAM)
        .expect("dispatch checked the leading actor parameter")
        .expect_actor_ref("Synchronous handler delivery")
        .map_err(|e| e.with_loc(loc))?;
    if !ev.rt.actor_instances.contains_key(&target) {
        return Err(RunError::actor_not_running(&decl.name).with_loc(loc).into());
    }

    match run_handler_core(ev, target, handler, &entry.module, bound) {
        Ok(value) => Ok(value),
        Err(Interrupt::Error(err)) => {
            stop_subtree(ev.rt, target);
            Err(err.into())
        }
        Err(interrupt @ Interrupt::Return(_)) => Err(interrupt),
    }
}

// --- supervision ---

/// Routes an asynchronous handler failure: destroys the failing subtree, then
/// notifies the nearest live ancestor that declares a `ChildFailed` handler.
/// The notification is enqueued only after destruction completes. With no
/// handling ancestor the error surfaces to whoever triggered the delivery.
fn handle_failure(ev: &mut Evaluator, failed: ActorId, tag: &str, err: RunError) -> EvalResult<()> {
    let decl_name = ev
        .rt
        .actor_instances
        .get(&failed)
        .map(|instance| instance.decl.name.clone())
        .unwrap_or_default();

    let mut ancestors = Vec::new();
    let mut cursor = ev.rt.supervision.get(&failed).and_then(|node| node.parent);
    while let Some(id) = cursor {
        ancestors.push(id);
        cursor = ev.rt.supervision.get(&id).and_then(|node| node.parent);
    }

    stop_subtree(ev.rt, failed);

    for ancestor in ancestors {
        let handles = ev
            .rt
            .actor_instances
            .get(&ancestor)
            .is_some_and(|instance| !instance.terminated && instance.decl.handler(CHILD_FAILED_TAG).is_some());
        if handles {
            let notification = ConstructorValue::new(CHILD_FAILED_TAG)
                .with_field("child", Value::ActorRef(failed))
                .with_field("reason", Value::Str(err.message.clone()))
                .with_field("message", Value::Str(tag.to_owned()))
                .with_field("actor", Value::Str(decl_name));
            let instance = ev
                .rt
                .actor_instances
                .get_mut(&ancestor)
                .expect("liveness checked above");
            instance.mailbox.push_back(notification);
            ev.rt.pending_deliveries.push_back(ancestor);
            return Ok(());
        }
    }
    Err(err.into())
}
