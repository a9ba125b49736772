//! Symbol table and identifier resolution.
//!
//! For the set of loaded modules, tracks each module's locally declared names
//! and its imports, and resolves a short or aliased name referenced from
//! inside a module to its fully qualified target. Types, functions, and
//! actors share one namespace here; the type checker has already rejected
//! collisions.

use ahash::{AHashMap, AHashSet};

use crate::ast::{Import, Module, QualifiedName};

/// Per-module resolution inputs: local declaration names and imports.
#[derive(Debug, Clone, Default)]
pub struct ModuleSymbols {
    locals: AHashSet<String>,
    imports: Vec<Import>,
}

/// Resolution index over all loaded modules.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    modules: AHashMap<QualifiedName, ModuleSymbols>,
}

impl SymbolTable {
    /// Indexes the given modules.
    #[must_use]
    pub fn build(modules: &[Module]) -> Self {
        let mut table = Self::default();
        for module in modules {
            let entry = ModuleSymbols {
                locals: module.decls.iter().map(|d| d.name().to_owned()).collect(),
                imports: module.imports.clone(),
            };
            table.modules.insert(module.name.clone(), entry);
        }
        table
    }

    /// Resolves a name referenced from inside `from` to a fully qualified name.
    ///
    /// In order: a bare local name qualifies to `from.name`; a first segment
    /// matching an import alias is replaced by the aliased module; a first
    /// segment matching the last segment of an imported module substitutes the
    /// full module name. Anything else is returned unchanged and will fail
    /// lookup with a clear error at the call site.
    #[must_use]
    pub fn resolve(&self, from: &QualifiedName, name: &str) -> String {
        let Some(symbols) = self.modules.get(from) else {
            return name.to_owned();
        };

        match name.split_once('.') {
            None => {
                if symbols.locals.contains(name) {
                    from.member(name)
                } else {
                    name.to_owned()
                }
            }
            Some((first, rest)) => {
                for import in &symbols.imports {
                    if import.alias.as_deref() == Some(first) {
                        return format!("{}.{rest}", import.module.dotted());
                    }
                }
                for import in &symbols.imports {
                    if import.module.last() == first {
                        return format!("{}.{rest}", import.module.dotted());
                    }
                }
                name.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, FunctionDecl};
    use crate::error::CodeLoc;

    fn module(name: &str, imports: Vec<Import>, fns: &[&str]) -> Module {
        Module {
            name: QualifiedName::from_dotted(name),
            imports,
            decls: fns
                .iter()
                .map(|f| {
                    Decl::Function(FunctionDecl {
                        name: (*f).to_owned(),
                        params: vec![],
                        return_type: None,
                        effects: vec![],
                        body: vec![],
                        loc: CodeLoc::synthetic(),
                    })
                })
                .collect(),
        }
    }

    fn import(module: &str, alias: Option<&str>) -> Import {
        Import {
            module: QualifiedName::from_dotted(module),
            alias: alias.map(str::to_owned),
        }
    }

    #[test]
    fn local_names_qualify_to_this_module() {
        let m = module("acme.main", vec![], &["area"]);
        let table = SymbolTable::build(std::slice::from_ref(&m));
        assert_eq!(table.resolve(&m.name, "area"), "acme.main.area");
    }

    #[test]
    fn aliases_substitute_before_short_names() {
        let m = module(
            "acme.main",
            vec![import("acme.geometry", Some("geo")), import("acme.geo", None)],
            &[],
        );
        let table = SymbolTable::build(std::slice::from_ref(&m));
        assert_eq!(table.resolve(&m.name, "geo.area"), "acme.geometry.area");
    }

    #[test]
    fn short_name_imports_expand() {
        let m = module("acme.main", vec![import("acme.geometry", None)], &[]);
        let table = SymbolTable::build(std::slice::from_ref(&m));
        assert_eq!(table.resolve(&m.name, "geometry.area"), "acme.geometry.area");
    }

    #[test]
    fn unknown_names_pass_through() {
        let m = module("acme.main", vec![], &[]);
        let table = SymbolTable::build(std::slice::from_ref(&m));
        assert_eq!(table.resolve(&m.name, "other.thing"), "other.thing");
        assert_eq!(table.resolve(&m.name, "missing"), "missing");
    }
}
