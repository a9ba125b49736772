//! Runtime assembly and shared runtime state.
//!
//! [`Runtime::assemble`] turns an ordered sequence of loaded modules (primary
//! module last) plus the symbol table into the mutable state every subsystem
//! shares: declaration indexes, the actor registry, the scheduler queue, the
//! seeded RNG, and the log/trace buffers. Indexes are immutable after
//! assembly; everything else belongs to one invocation.

use std::{collections::VecDeque, rc::Rc};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    actors::{ActorInstance, SupervisionNode},
    ast::{
        ActorDecl, ContractDecl, Decl, FunctionDecl, Module, PropertyDecl, QualifiedName, RecordDecl, SchemaDecl,
        SumDecl, TestDecl, TypeAliasDecl, TypeExpr,
    },
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    report::{LogLevel, LogRecord, TraceRecord, TraceStep},
    rng::XorShift32,
    symbols::SymbolTable,
    value::{ActorId, ConstructorValue, Value},
};

/// How the scheduler drains pending deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerMode {
    /// `send` drains all pending deliveries before returning to user code.
    #[default]
    Immediate,
    /// `send` only enqueues; `Concurrent.step`/`Concurrent.flush` drive delivery.
    Deterministic,
}

/// Whether structured records or human-readable text leave the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

/// A function declaration together with its defining module (the resolution
/// context for names in its body and contract clauses).
#[derive(Debug, Clone)]
pub(crate) struct FunctionEntry {
    pub decl: Rc<FunctionDecl>,
    pub module: QualifiedName,
}

#[derive(Debug, Clone)]
pub(crate) struct ContractEntry {
    pub decl: Rc<ContractDecl>,
    pub module: QualifiedName,
}

#[derive(Debug, Clone)]
pub(crate) struct ActorEntry {
    pub decl: Rc<ActorDecl>,
    pub module: QualifiedName,
}

/// A type declaration usable for default synthesis and generation.
#[derive(Debug, Clone)]
pub(crate) enum TypeDecl {
    Record(Rc<RecordDecl>),
    Sum(Rc<SumDecl>),
    Schema(Rc<SchemaDecl>),
    Alias(Rc<TypeAliasDecl>),
}

/// Default synthesis recursion cap; self-referential types bottom out here.
const MAX_DEFAULT_DEPTH: u32 = 16;

/// Mutable runtime state; lifetime is one invocation.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) functions: AHashMap<String, FunctionEntry>,
    pub(crate) contracts: AHashMap<String, ContractEntry>,
    pub(crate) tests: Vec<Rc<TestDecl>>,
    pub(crate) properties: Vec<Rc<PropertyDecl>>,
    pub(crate) type_decls: AHashMap<String, TypeDecl>,
    pub(crate) actors: AHashMap<String, ActorEntry>,
    pub(crate) symbols: SymbolTable,
    pub(crate) primary_module: QualifiedName,

    pub(crate) actor_instances: AHashMap<ActorId, ActorInstance>,
    pub(crate) supervision: AHashMap<ActorId, SupervisionNode>,
    pub(crate) pending_deliveries: VecDeque<ActorId>,
    pub(crate) scheduler_mode: SchedulerMode,
    /// Re-entrance guard: true while the drain loop is running, so a `send`
    /// inside a handler enqueues instead of nesting another drain.
    pub(crate) is_processing: bool,
    /// Currently executing actors, innermost last; a spawn records the top as
    /// its supervisor.
    pub(crate) current_actor_stack: Vec<ActorId>,
    pub(crate) next_actor_id: ActorId,

    pub(crate) rng: Option<XorShift32>,

    pub(crate) tracing: bool,
    pub(crate) traces: Vec<TraceRecord>,
    pub(crate) logs: Vec<LogRecord>,
    pub(crate) output_mode: OutputMode,
}

impl Runtime {
    /// Builds the runtime from loaded modules; the primary module is last.
    ///
    /// Every declaration of every module gets a fully qualified index entry;
    /// the primary module's declarations are additionally indexed by bare name
    /// so callers of the entry module need not qualify. Tests and properties
    /// from non-primary modules are ignored.
    #[must_use]
    pub fn assemble(modules: &[Module], symbols: SymbolTable) -> Self {
        let primary = modules
            .last()
            .map_or_else(|| QualifiedName::new(["main"]), |m| m.name.clone());

        let mut runtime = Self {
            functions: AHashMap::new(),
            contracts: AHashMap::new(),
            tests: Vec::new(),
            properties: Vec::new(),
            type_decls: AHashMap::new(),
            actors: AHashMap::new(),
            symbols,
            primary_module: primary,
            actor_instances: AHashMap::new(),
            supervision: AHashMap::new(),
            pending_deliveries: VecDeque::new(),
            scheduler_mode: SchedulerMode::default(),
            is_processing: false,
            current_actor_stack: Vec::new(),
            next_actor_id: 1,
            rng: None,
            tracing: false,
            traces: Vec::new(),
            logs: Vec::new(),
            output_mode: OutputMode::default(),
        };

        for (position, module) in modules.iter().enumerate() {
            let is_primary = position + 1 == modules.len();
            runtime.index_module(module, is_primary);
        }
        runtime
    }

    fn index_module(&mut self, module: &Module, is_primary: bool) {
        for decl in &module.decls {
            let qualified = module.name.member(decl.name());
            match decl {
                Decl::Function(d) => {
                    let entry = FunctionEntry {
                        decl: Rc::new(d.clone()),
                        module: module.name.clone(),
                    };
                    if is_primary {
                        self.functions.insert(d.name.clone(), entry.clone());
                    }
                    self.functions.insert(qualified, entry);
                }
                Decl::Contract(d) => {
                    let entry = ContractEntry {
                        decl: Rc::new(d.clone()),
                        module: module.name.clone(),
                    };
                    if is_primary {
                        self.contracts.insert(d.name.clone(), entry.clone());
                    }
                    self.contracts.insert(qualified, entry);
                }
                Decl::Actor(d) => {
                    let entry = ActorEntry {
                        decl: Rc::new(d.clone()),
                        module: module.name.clone(),
                    };
                    if is_primary {
                        self.actors.insert(d.name.clone(), entry.clone());
                    }
                    self.actors.insert(qualified, entry);
                }
                Decl::Record(d) => {
                    self.index_type(qualified, d.name.clone(), TypeDecl::Record(Rc::new(d.clone())), is_primary);
                }
                Decl::Sum(d) => {
                    self.index_type(qualified, d.name.clone(), TypeDecl::Sum(Rc::new(d.clone())), is_primary);
                }
                Decl::Schema(d) => {
                    self.index_type(qualified, d.name.clone(), TypeDecl::Schema(Rc::new(d.clone())), is_primary);
                }
                Decl::TypeAlias(d) => {
                    self.index_type(qualified, d.name.clone(), TypeDecl::Alias(Rc::new(d.clone())), is_primary);
                }
                Decl::Test(d) => {
                    if is_primary {
                        self.tests.push(Rc::new(d.clone()));
                    }
                }
                Decl::Property(d) => {
                    if is_primary {
                        self.properties.push(Rc::new(d.clone()));
                    }
                }
                Decl::Effect(_) => {}
            }
        }
    }

    fn index_type(&mut self, qualified: String, bare: String, decl: TypeDecl, is_primary: bool) {
        if is_primary {
            self.type_decls.insert(bare, decl.clone());
        }
        self.type_decls.insert(qualified, decl);
    }

    // --- configuration ---

    pub fn set_scheduler_mode(&mut self, mode: SchedulerMode) {
        self.scheduler_mode = mode;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.rng = Some(XorShift32::new(seed));
    }

    pub fn set_tracing(&mut self, enabled: bool) {
        self.tracing = enabled;
    }

    // --- lookups ---

    pub(crate) fn lookup_function(&self, from: &QualifiedName, name: &str) -> Option<FunctionEntry> {
        let resolved = self.symbols.resolve(from, name);
        self.functions.get(&resolved).cloned()
    }

    pub(crate) fn lookup_actor(&self, from: &QualifiedName, name: &str) -> Option<ActorEntry> {
        let resolved = self.symbols.resolve(from, name);
        self.actors.get(&resolved).cloned()
    }

    pub(crate) fn lookup_type(&self, from: &QualifiedName, name: &str) -> Option<TypeDecl> {
        let resolved = self.symbols.resolve(from, name);
        self.type_decls.get(&resolved).cloned()
    }

    pub(crate) fn fresh_actor_id(&mut self) -> ActorId {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        id
    }

    // --- default-value synthesis ---

    /// Synthesizes the default value of a type expression: zero, false, the
    /// empty string or list, `None` for optionals, defaulted fields for
    /// records and schemas, and the first zero-field variant of a sum (or the
    /// first variant with defaulted fields when none is field-free).
    pub(crate) fn default_for_type(&self, ty: &TypeExpr, from: &QualifiedName) -> RunResult<Value> {
        self.default_for_type_at(ty, from, 0)
    }

    fn default_for_type_at(&self, ty: &TypeExpr, from: &QualifiedName, depth: u32) -> RunResult<Value> {
        if depth > MAX_DEFAULT_DEPTH {
            return Err(RunError::new(
                ErrorKind::TypeError,
                "Default synthesis recursed too deep; is the type self-referential?",
            ));
        }
        match ty {
            TypeExpr::Optional { .. } => Ok(Value::none()),
            TypeExpr::Named { name, .. } => match name.as_str() {
                "Int" => Ok(Value::Int(0)),
                "Bool" => Ok(Value::Bool(false)),
                "String" => Ok(Value::Str(String::new())),
                "List" => Ok(Value::List(Vec::new())),
                "Unit" => Ok(Value::Unit),
                _ => match self.lookup_type(from, name) {
                    Some(TypeDecl::Record(decl)) => self.default_fields(&decl.name, &decl.fields, from, depth),
                    Some(TypeDecl::Schema(decl)) => self.default_fields(&decl.name, &decl.fields, from, depth),
                    Some(TypeDecl::Sum(decl)) => {
                        let variant = decl
                            .variants
                            .iter()
                            .find(|v| v.fields.is_empty())
                            .or_else(|| decl.variants.first())
                            .ok_or_else(|| {
                                RunError::new(ErrorKind::TypeError, format!("Sum type '{}' has no variants", decl.name))
                            })?;
                        self.default_fields(&variant.name, &variant.fields, from, depth)
                    }
                    Some(TypeDecl::Alias(decl)) => self.default_for_type_at(&decl.target, from, depth + 1),
                    None => Err(RunError::new(
                        ErrorKind::TypeError,
                        format!("No default value for type '{name}'"),
                    )),
                },
            },
        }
    }

    fn default_fields(
        &self,
        tag: &str,
        fields: &[crate::ast::FieldDecl],
        from: &QualifiedName,
        depth: u32,
    ) -> RunResult<Value> {
        let mut ctor = ConstructorValue::new(tag);
        for field in fields {
            let value = if field.optional {
                Value::none()
            } else {
                self.default_for_type_at(&field.ty, from, depth + 1)?
            };
            ctor.fields.insert(field.name.clone(), value);
        }
        Ok(Value::Constructor(ctor))
    }

    // --- instrumentation ---

    pub(crate) fn trace(&mut self, step: TraceStep, description: String, value: Option<String>, depth: u32) {
        if self.tracing {
            self.traces.push(TraceRecord {
                step_type: step,
                description,
                value,
                depth,
            });
        }
    }

    /// Emits a structured log event: buffered in JSON mode, forwarded to the
    /// process's human-readable log sink otherwise.
    pub(crate) fn emit_log(&mut self, level: LogLevel, label: &str, payload: &Value, loc: Option<&CodeLoc>) {
        match self.output_mode {
            OutputMode::Json => {
                let data = payload.to_json().ok();
                self.logs.push(LogRecord {
                    level,
                    message: label.to_owned(),
                    data,
                    location: loc.cloned(),
                });
            }
            OutputMode::Text => match level {
                LogLevel::Debug => tracing::debug!(target: "aster", payload = %payload, "{label}"),
                LogLevel::Trace => tracing::trace!(target: "aster", payload = %payload, "{label}"),
            },
        }
    }
}
