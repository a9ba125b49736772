//! Runtime values.
//!
//! The seven value kinds of the language: integer, boolean, string, list,
//! constructor (covering both record instances and sum variants), actor
//! reference, and unit. Values are deep-copied on clone; nothing in the
//! runtime aliases a value into another actor's state.

use std::fmt::{self, Display, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, RunError, RunResult};

/// Identifier of a spawned actor instance; monotonically assigned.
pub type ActorId = u64;

/// Key used by the JSON codec to mark an object as a constructor value.
pub const CONSTRUCTOR_KEY: &str = "_constructor";

/// Tag given to plain JSON objects decoded without a `_constructor` marker.
pub const PLAIN_OBJECT_TAG: &str = "Object";

/// A tagged record: constructor name plus named fields in declaration order.
///
/// Field order is tracked so pretty-printing and JSON encoding are
/// deterministic; equality is order-independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorValue {
    pub name: String,
    pub fields: IndexMap<String, Value>,
}

impl ConstructorValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    Constructor(ConstructorValue),
    ActorRef(ActorId),
    Unit,
}

impl Value {
    /// The kind name used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "Int",
            Self::Bool(_) => "Bool",
            Self::Str(_) => "String",
            Self::List(_) => "List",
            Self::Constructor(_) => "constructor",
            Self::ActorRef(_) => "ActorRef",
            Self::Unit => "Unit",
        }
    }

    /// The `Some{value}` option constructor.
    #[must_use]
    pub fn some(value: Self) -> Self {
        Self::Constructor(ConstructorValue::new("Some").with_field("value", value))
    }

    /// The `None` option constructor.
    #[must_use]
    pub fn none() -> Self {
        Self::Constructor(ConstructorValue::new("None"))
    }

    pub fn expect_int(&self, context: &str) -> RunResult<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(RunError::wrong_operand("an Int", other.kind_name(), context)),
        }
    }

    pub fn expect_bool(&self, context: &str) -> RunResult<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(RunError::wrong_operand("a Bool", other.kind_name(), context)),
        }
    }

    pub fn expect_str(&self, context: &str) -> RunResult<&str> {
        match self {
            Self::Str(v) => Ok(v),
            other => Err(RunError::wrong_operand("a String", other.kind_name(), context)),
        }
    }

    pub fn expect_list(&self, context: &str) -> RunResult<&[Self]> {
        match self {
            Self::List(v) => Ok(v),
            other => Err(RunError::wrong_operand("a List", other.kind_name(), context)),
        }
    }

    pub fn expect_constructor(&self, context: &str) -> RunResult<&ConstructorValue> {
        match self {
            Self::Constructor(v) => Ok(v),
            other => Err(RunError::wrong_operand(
                "a constructor value",
                other.kind_name(),
                context,
            )),
        }
    }

    pub fn expect_actor_ref(&self, context: &str) -> RunResult<ActorId> {
        match self {
            Self::ActorRef(id) => Ok(*id),
            other => Err(RunError::wrong_operand("an ActorRef", other.kind_name(), context)),
        }
    }

    /// Encodes this value as a JSON document.
    ///
    /// Constructor values become objects carrying a `_constructor` field ahead
    /// of their own fields; unit becomes `null`. Actor references have no
    /// JSON form and fail.
    pub fn to_json(&self) -> RunResult<serde_json::Value> {
        match self {
            Self::Int(v) => Ok(serde_json::Value::from(*v)),
            Self::Bool(v) => Ok(serde_json::Value::from(*v)),
            Self::Str(v) => Ok(serde_json::Value::from(v.clone())),
            Self::List(items) => {
                let encoded: RunResult<Vec<_>> = items.iter().map(Self::to_json).collect();
                Ok(serde_json::Value::Array(encoded?))
            }
            Self::Constructor(ctor) => {
                let mut object = serde_json::Map::new();
                object.insert(CONSTRUCTOR_KEY.to_owned(), serde_json::Value::from(ctor.name.clone()));
                for (field, value) in &ctor.fields {
                    object.insert(field.clone(), value.to_json()?);
                }
                Ok(serde_json::Value::Object(object))
            }
            Self::ActorRef(_) => Err(RunError::new(
                ErrorKind::WrongOperandType,
                "Cannot encode an actor reference as JSON",
            )),
            Self::Unit => Ok(serde_json::Value::Null),
        }
    }

    /// Decodes a JSON document into a value.
    ///
    /// Numbers truncate to integers. Objects carrying a `_constructor` field
    /// decode to that constructor; plain objects decode to a constructor
    /// named `Object` (matches will need an explicit `Object` variant).
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Unit,
            serde_json::Value::Bool(v) => Self::Bool(*v),
            serde_json::Value::Number(n) => {
                let v = n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64);
                Self::Int(v)
            }
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(object) => {
                let name = match object.get(CONSTRUCTOR_KEY) {
                    Some(serde_json::Value::String(tag)) => tag.clone(),
                    _ => PLAIN_OBJECT_TAG.to_owned(),
                };
                let mut ctor = ConstructorValue::new(name);
                for (field, value) in object {
                    if field != CONSTRUCTOR_KEY {
                        ctor.fields.insert(field.clone(), Self::from_json(value));
                    }
                }
                Self::Constructor(ctor)
            }
        }
    }
}

fn write_escaped_str(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}

impl Display for Value {
    /// Pretty form: `55`, `true`, `"text"`, `[1, 2]`, `Value{v: 3}`, `None`,
    /// `<actor 3>`, `unit`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write_escaped_str(f, v),
            Self::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
            Self::Constructor(ctor) => {
                f.write_str(&ctor.name)?;
                if ctor.fields.is_empty() {
                    return Ok(());
                }
                f.write_char('{')?;
                for (i, (field, value)) in ctor.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}: {value}")?;
                }
                f.write_char('}')
            }
            Self::ActorRef(id) => write!(f, "<actor {id}>"),
            Self::Unit => f.write_str("unit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: i64, y: i64) -> Value {
        Value::Constructor(
            ConstructorValue::new("Point")
                .with_field("x", Value::Int(x))
                .with_field("y", Value::Int(y)),
        )
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(point(1, 2), point(1, 2));
        assert_ne!(point(1, 2), point(2, 1));
        assert_ne!(Value::Int(0), Value::Bool(false));
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Unit]),
            Value::List(vec![Value::Int(1), Value::Unit]),
        );
    }

    #[test]
    fn equality_ignores_field_order() {
        let a = Value::Constructor(
            ConstructorValue::new("P")
                .with_field("x", Value::Int(1))
                .with_field("y", Value::Int(2)),
        );
        let b = Value::Constructor(
            ConstructorValue::new("P")
                .with_field("y", Value::Int(2))
                .with_field("x", Value::Int(1)),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn pretty_prints_constructors() {
        assert_eq!(point(1, 2).to_string(), "Point{x: 1, y: 2}");
        assert_eq!(Value::none().to_string(), "None");
        assert_eq!(Value::some(Value::Int(3)).to_string(), "Some{value: 3}");
        assert_eq!(Value::Str("a\"b".into()).to_string(), "\"a\\\"b\"");
    }

    #[test]
    fn json_round_trip() {
        let value = Value::List(vec![
            point(1, 2),
            Value::Str("hi".into()),
            Value::Bool(true),
            Value::Unit,
            Value::some(Value::Int(-4)),
        ]);
        let encoded = value.to_json().unwrap();
        assert_eq!(Value::from_json(&encoded), value);
    }

    #[test]
    fn plain_objects_decode_to_object_tag() {
        let json: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": [true]}"#).unwrap();
        let Value::Constructor(ctor) = Value::from_json(&json) else {
            panic!("expected constructor");
        };
        assert_eq!(ctor.name, PLAIN_OBJECT_TAG);
        assert_eq!(ctor.fields["a"], Value::Int(1));
    }

    #[test]
    fn actor_refs_do_not_encode() {
        let err = Value::ActorRef(1).to_json().unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongOperandType);
    }

    #[test]
    fn numbers_truncate_on_decode() {
        let json: serde_json::Value = serde_json::from_str("[3.9, -3.9]").unwrap();
        assert_eq!(
            Value::from_json(&json),
            Value::List(vec![Value::Int(3), Value::Int(-3)]),
        );
    }
}
