//! In-memory representation of Aster modules.
//!
//! This is the contract between the front-end (surface parser or AST-JSON
//! loader) and the execution core: modules, declarations, type expressions,
//! statements, expressions, and patterns. Data only — no behavior beyond
//! small accessors. Every type derives serde so the serialized form of a
//! [`Module`] *is* the AST-JSON interchange format.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::CodeLoc;

/// An ordered sequence of identifier segments naming a module, e.g. `acme.geometry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(pub SmallVec<[String; 3]>);

impl QualifiedName {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses a dotted name such as `acme.geometry`.
    #[must_use]
    pub fn from_dotted(dotted: &str) -> Self {
        Self(dotted.split('.').map(str::to_owned).collect())
    }

    /// The final segment, used for short-name import matching.
    #[must_use]
    pub fn last(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// The dotted form of this name.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// Qualifies a declaration name declared in this module, e.g. `acme.geometry.area`.
    #[must_use]
    pub fn member(&self, name: &str) -> String {
        let mut out = self.dotted();
        out.push('.');
        out.push_str(name);
        out
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// One loaded compilation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: QualifiedName,
    #[serde(default)]
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

/// An import of another module, optionally under a local alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub module: QualifiedName,
    #[serde(default)]
    pub alias: Option<String>,
}

/// A top-level declaration.
///
/// Declaration names are unique within a module per namespace; the type
/// checker has already rejected collisions before the core sees the AST.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decl {
    Effect(EffectDecl),
    TypeAlias(TypeAliasDecl),
    Record(RecordDecl),
    Sum(SumDecl),
    Schema(SchemaDecl),
    Function(FunctionDecl),
    Contract(ContractDecl),
    Test(TestDecl),
    Property(PropertyDecl),
    Actor(ActorDecl),
}

impl Decl {
    /// The declared name, whichever variant this is.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Effect(d) => &d.name,
            Self::TypeAlias(d) => &d.name,
            Self::Record(d) => &d.name,
            Self::Sum(d) => &d.name,
            Self::Schema(d) => &d.name,
            Self::Function(d) => &d.name,
            Self::Contract(d) => &d.name,
            Self::Test(d) => &d.name,
            Self::Property(d) => &d.name,
            Self::Actor(d) => &d.name,
        }
    }
}

/// A type expression: a named reference with optional type arguments, or an
/// option wrapper (`Name?`).
///
/// The option wrapper is distinct from field optionality — a schema field may
/// be optional without its type being `Optional`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeExpr>,
    },
    Optional { inner: Box<TypeExpr> },
}

impl TypeExpr {
    /// Shorthand for a named type without arguments.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// A declared side-effect name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDecl {
    pub name: String,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAliasDecl {
    pub name: String,
    pub target: TypeExpr,
    pub loc: CodeLoc,
}

/// A named field of a record, schema, or sum variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    /// Schema-field optionality bit; independent of `TypeExpr::Optional`.
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumDecl {
    pub name: String,
    pub variants: Vec<VariantDecl>,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub loc: CodeLoc,
}

/// A function parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
    /// Effect names this function declares. Empty means pure, which is what
    /// the parallel iteration built-ins require of their callees.
    #[serde(default)]
    pub effects: Vec<String>,
    pub body: Block,
    pub loc: CodeLoc,
}

/// Contract clauses for the function of the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDecl {
    pub name: String,
    #[serde(default)]
    pub requires: Vec<ExprLoc>,
    #[serde(default)]
    pub ensures: Vec<ExprLoc>,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDecl {
    pub name: String,
    pub body: Block,
    pub loc: CodeLoc,
}

/// A universally quantified parameter of a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyParam {
    pub name: String,
    pub ty: TypeExpr,
    /// Optional constraint the generated value must satisfy.
    #[serde(default)]
    pub predicate: Option<ExprLoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<PropertyParam>,
    /// Iteration count override; the engine defaults to 50.
    #[serde(default)]
    pub iterations: Option<u32>,
    pub body: Block,
    pub loc: CodeLoc,
}

/// A mutable state field of an actor, initialized from its type's default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateField {
    pub name: String,
    pub ty: TypeExpr,
}

/// A message handler, keyed by message-tag name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerDecl {
    pub message: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Block,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDecl {
    pub name: String,
    /// Constructor parameters; bound once at spawn and immutable afterwards.
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub state: Vec<StateField>,
    pub handlers: Vec<HandlerDecl>,
    pub loc: CodeLoc,
}

impl ActorDecl {
    /// Looks up the handler declared for a message tag.
    #[must_use]
    pub fn handler(&self, tag: &str) -> Option<&HandlerDecl> {
        self.handlers.iter().find(|h| h.message == tag)
    }
}

/// A statement block.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// Introduces a new binding.
    Let { name: String, value: ExprLoc },
    /// Rebinds an existing binding; the form state updates in actor handlers take.
    Assign { name: String, value: ExprLoc },
    Return { value: ExprLoc },
    Expr { value: ExprLoc },
    /// Structured concurrency group; `Async` children are scheduled as
    /// cooperative tasks and interleaved round-robin.
    AsyncGroup { body: Block, loc: CodeLoc },
    /// A task block; only valid directly inside an `AsyncGroup`.
    Async { body: Block, loc: CodeLoc },
}

/// An expression with its source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExprLoc {
    pub loc: CodeLoc,
    pub expr: Expr,
}

impl ExprLoc {
    pub fn new(expr: Expr, loc: CodeLoc) -> Self {
        Self { loc, expr }
    }
}

/// The callee of a call expression: one or more dot-separated segments.
///
/// Dispatch inspects the segments in order: built-in name, `binding.send`
/// sugar, `Actor.spawn`, `Actor.Handler` synchronous delivery, and finally a
/// plain (possibly qualified) function reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalleePath(pub SmallVec<[String; 2]>);

impl CalleePath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// The dotted form of all segments but the last, or `None` for a bare name.
    #[must_use]
    pub fn prefix(&self) -> Option<String> {
        match self.0.len() {
            0 | 1 => None,
            n => Some(self.0[..n - 1].join(".")),
        }
    }

    #[must_use]
    pub fn last(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }
}

impl Display for CalleePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// One actual argument of a call: positional when `name` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallArg {
    #[serde(default)]
    pub name: Option<String>,
    pub value: ExprLoc,
}

/// One field initializer of a constructor expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: String,
    pub value: ExprLoc,
}

/// One arm of a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Int { value: i64 },
    Bool { value: bool },
    Str { value: String },
    List { items: Vec<ExprLoc> },
    Var { name: String },
    Binary {
        op: BinaryOp,
        left: Box<ExprLoc>,
        right: Box<ExprLoc>,
    },
    /// `if cond { … } else { … }`; branches are blocks evaluated in a copy of
    /// the current environment. Missing else makes the false arm `unit`.
    If {
        cond: Box<ExprLoc>,
        then_block: Block,
        #[serde(default)]
        else_block: Option<Block>,
    },
    /// Cases are tried in source order; no match is a runtime failure even
    /// though the type checker diagnoses coverage statically.
    Match {
        scrutinee: Box<ExprLoc>,
        cases: Vec<MatchCase>,
    },
    /// Record or variant construction: `Name { field: expr, … }`.
    Construct {
        name: String,
        #[serde(default)]
        fields: Vec<FieldInit>,
    },
    FieldAccess {
        object: Box<ExprLoc>,
        field: String,
    },
    Index {
        object: Box<ExprLoc>,
        index: Box<ExprLoc>,
    },
    Call {
        callee: CalleePath,
        #[serde(default)]
        args: Vec<CallArg>,
    },
    /// A typed hole; always fails at evaluation time.
    Hole,
}

/// Binary operators.
///
/// Boolean `&&`/`||` evaluate strictly — both sides always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    And,
    Or,
}

impl BinaryOp {
    /// The surface-syntax symbol, for diagnostics.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtE => "<=",
            Self::Gt => ">",
            Self::GtE => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPattern {
    pub name: String,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    Wildcard,
    /// Binds the scrutinee (or sub-value) to a name.
    Var { name: String },
    Int { value: i64 },
    Bool { value: bool },
    Str { value: String },
    /// Matches a constructor value by tag, then each listed field recursively.
    /// Fields not listed are ignored.
    Constructor {
        name: String,
        #[serde(default)]
        fields: Vec<FieldPattern>,
    },
}
