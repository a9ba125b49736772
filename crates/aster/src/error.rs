//! Runtime error model.
//!
//! Every failure the execution core can produce is a [`RunError`] carrying an
//! [`ErrorKind`], a human-readable message, an optional source location, and
//! an optional hint. Text output renders a single line per error; JSON output
//! serializes the same data as a structured record (see `report`).

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// A source position, optionally qualified with the file and module it came from.
///
/// Declarations carry their location through the AST; errors raised while
/// evaluating them inherit it so diagnostics can point back at the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "moduleName")]
    pub module_name: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl CodeLoc {
    /// Creates a bare line/column location.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            file: None,
            module_name: None,
            line,
            column,
        }
    }

    /// A placeholder location for synthesized nodes (line and column zero).
    #[must_use]
    pub fn synthetic() -> Self {
        Self::new(0, 0)
    }
}

impl Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}:")?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The failure categories of the execution core.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>`
/// implementations; the string form is the variant name and is what lands in the
/// `errorType` field of structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input surfaced by the AST loader.
    ParseError,
    /// A shape the type checker should have rejected reached the evaluator.
    TypeError,
    ContractRequiresFailure,
    ContractEnsuresFailure,
    NonExhaustiveMatch,
    UnknownVariable,
    UnknownFunction,
    WrongArity,
    WrongOperandType,
    IndexOutOfBounds,
    DivisionByZero,
    UnfilledHole,
    JsonDecodeError,
    NonBooleanCondition,
    /// The target actor declares no handler for the delivered message tag.
    NoHandlerForMessage,
    ActorNotRunning,
    AssertionFailed,
    /// Property input generation exhausted its retry cap (distinct from a
    /// property counterexample).
    GenerationFailure,
    /// Call depth exceeded the interpreter's recursion cap.
    RecursionLimit,
}

/// A runtime error: kind, message, and optional location/hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CodeLoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl RunError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            hint: None,
        }
    }

    /// Attaches a source location, keeping an already-present one.
    ///
    /// Errors are raised at the innermost point that knows what went wrong;
    /// outer frames may know *where* better than *what*, so the first location
    /// attached wins.
    #[must_use]
    pub fn with_loc(mut self, loc: &CodeLoc) -> Self {
        if self.location.is_none() {
            self.location = Some(loc.clone());
        }
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // --- constructors for the common evaluator failures ---

    pub fn unknown_variable(name: &str) -> Self {
        Self::new(ErrorKind::UnknownVariable, format!("Unknown variable '{name}'"))
    }

    pub fn unknown_function(name: &str) -> Self {
        Self::new(ErrorKind::UnknownFunction, format!("Unknown function '{name}'"))
    }

    pub fn wrong_operand(expected: &str, got: &str, context: &str) -> Self {
        Self::new(
            ErrorKind::WrongOperandType,
            format!("{context} expects {expected}, got {got}"),
        )
    }

    pub fn non_exhaustive_match() -> Self {
        Self::new(ErrorKind::NonExhaustiveMatch, "Non-exhaustive match expression")
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "Division by zero")
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            format!("Index {index} out of bounds for list of length {len}"),
        )
    }

    pub fn unfilled_hole() -> Self {
        Self::new(ErrorKind::UnfilledHole, "Unfilled hole")
    }

    pub fn non_boolean_condition(got: &str) -> Self {
        Self::new(
            ErrorKind::NonBooleanCondition,
            format!("Condition must be a Bool, got {got}"),
        )
    }

    pub fn assertion_failed() -> Self {
        Self::new(ErrorKind::AssertionFailed, "Assertion failed")
    }

    pub fn actor_not_running(actor: &str) -> Self {
        Self::new(ErrorKind::ActorNotRunning, format!("Actor '{actor}' is not running"))
    }

    pub fn no_handler(actor: &str, tag: &str) -> Self {
        Self::new(
            ErrorKind::NoHandlerForMessage,
            format!("Actor '{actor}' has no handler for message '{tag}'"),
        )
    }
}

impl Display for RunError {
    /// Single-line text rendering: `file:line:column: message`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{loc}: ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}
