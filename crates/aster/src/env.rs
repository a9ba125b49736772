//! Evaluation environments.
//!
//! Lexically scoped name → value bindings. Function calls and actor handlers
//! start from a fresh environment; `if` branches and match arms evaluate in a
//! copy so their bindings do not leak; `let` extends the current scope and
//! `Assign` replaces an existing binding in place.

use ahash::AHashMap;

use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub(crate) struct Env {
    vars: AHashMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bindings<I, S>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self {
            vars: bindings.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Introduces or shadows a binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Replaces an existing binding; returns false if the name is unbound.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
