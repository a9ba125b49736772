//! AST construction helpers shared by the integration tests.
//!
//! These build the same in-memory modules the front-end would hand the core,
//! without going through surface syntax.

#![allow(dead_code)]

use aster::CodeLoc;
use aster::ast::{
    ActorDecl, BinaryOp, Block, CallArg, CalleePath, ContractDecl, Decl, Expr, ExprLoc, FieldDecl, FieldInit,
    FieldPattern, FunctionDecl, HandlerDecl, Import, MatchCase, Module, Param, Pattern, PropertyDecl, PropertyParam,
    QualifiedName, RecordDecl, StateField, Stmt, SumDecl, TestDecl, TypeExpr, VariantDecl,
};

pub fn loc() -> CodeLoc {
    CodeLoc::new(1, 1)
}

pub fn e(expr: Expr) -> ExprLoc {
    ExprLoc::new(expr, loc())
}

// --- expressions ---

pub fn int(value: i64) -> ExprLoc {
    e(Expr::Int { value })
}

pub fn boolean(value: bool) -> ExprLoc {
    e(Expr::Bool { value })
}

pub fn string(value: &str) -> ExprLoc {
    e(Expr::Str {
        value: value.to_owned(),
    })
}

pub fn var(name: &str) -> ExprLoc {
    e(Expr::Var { name: name.to_owned() })
}

pub fn list(items: Vec<ExprLoc>) -> ExprLoc {
    e(Expr::List { items })
}

pub fn bin(op: BinaryOp, left: ExprLoc, right: ExprLoc) -> ExprLoc {
    e(Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn if_else(cond: ExprLoc, then_block: Block, else_block: Block) -> ExprLoc {
    e(Expr::If {
        cond: Box::new(cond),
        then_block,
        else_block: Some(else_block),
    })
}

pub fn if_then(cond: ExprLoc, then_block: Block) -> ExprLoc {
    e(Expr::If {
        cond: Box::new(cond),
        then_block,
        else_block: None,
    })
}

pub fn construct(name: &str, fields: &[(&str, ExprLoc)]) -> ExprLoc {
    e(Expr::Construct {
        name: name.to_owned(),
        fields: fields
            .iter()
            .map(|(field, value)| FieldInit {
                name: (*field).to_owned(),
                value: value.clone(),
            })
            .collect(),
    })
}

pub fn field(object: ExprLoc, name: &str) -> ExprLoc {
    e(Expr::FieldAccess {
        object: Box::new(object),
        field: name.to_owned(),
    })
}

pub fn index(object: ExprLoc, at: ExprLoc) -> ExprLoc {
    e(Expr::Index {
        object: Box::new(object),
        index: Box::new(at),
    })
}

pub fn call(path: &[&str], args: Vec<ExprLoc>) -> ExprLoc {
    e(Expr::Call {
        callee: CalleePath::new(path.iter().copied()),
        args: args.into_iter().map(|value| CallArg { name: None, value }).collect(),
    })
}

pub fn call_named(path: &[&str], args: Vec<(Option<&str>, ExprLoc)>) -> ExprLoc {
    e(Expr::Call {
        callee: CalleePath::new(path.iter().copied()),
        args: args
            .into_iter()
            .map(|(name, value)| CallArg {
                name: name.map(str::to_owned),
                value,
            })
            .collect(),
    })
}

pub fn match_expr(scrutinee: ExprLoc, cases: Vec<MatchCase>) -> ExprLoc {
    e(Expr::Match {
        scrutinee: Box::new(scrutinee),
        cases,
    })
}

pub fn case(pattern: Pattern, body: Block) -> MatchCase {
    MatchCase { pattern, body }
}

pub fn ctor_pattern(name: &str, fields: &[(&str, Pattern)]) -> Pattern {
    Pattern::Constructor {
        name: name.to_owned(),
        fields: fields
            .iter()
            .map(|(field, pattern)| FieldPattern {
                name: (*field).to_owned(),
                pattern: pattern.clone(),
            })
            .collect(),
    }
}

pub fn bind_pattern(name: &str) -> Pattern {
    Pattern::Var { name: name.to_owned() }
}

// --- statements ---

pub fn let_stmt(name: &str, value: ExprLoc) -> Stmt {
    Stmt::Let {
        name: name.to_owned(),
        value,
    }
}

pub fn assign(name: &str, value: ExprLoc) -> Stmt {
    Stmt::Assign {
        name: name.to_owned(),
        value,
    }
}

pub fn ret(value: ExprLoc) -> Stmt {
    Stmt::Return { value }
}

pub fn expr_stmt(value: ExprLoc) -> Stmt {
    Stmt::Expr { value }
}

pub fn async_group(body: Block) -> Stmt {
    Stmt::AsyncGroup { body, loc: loc() }
}

pub fn async_task(body: Block) -> Stmt {
    Stmt::Async { body, loc: loc() }
}

// --- types and declarations ---

pub fn ty(name: &str) -> TypeExpr {
    TypeExpr::named(name)
}

pub fn ty_list(element: TypeExpr) -> TypeExpr {
    TypeExpr::Named {
        name: "List".to_owned(),
        args: vec![element],
    }
}

pub fn ty_optional(inner: TypeExpr) -> TypeExpr {
    TypeExpr::Optional { inner: Box::new(inner) }
}

pub fn param(name: &str, t: TypeExpr) -> Param {
    Param {
        name: name.to_owned(),
        ty: t,
    }
}

pub fn function(name: &str, params: Vec<Param>, body: Block) -> Decl {
    Decl::Function(FunctionDecl {
        name: name.to_owned(),
        params,
        return_type: None,
        effects: vec![],
        body,
        loc: loc(),
    })
}

pub fn effectful_function(name: &str, params: Vec<Param>, effects: &[&str], body: Block) -> Decl {
    Decl::Function(FunctionDecl {
        name: name.to_owned(),
        params,
        return_type: None,
        effects: effects.iter().map(|s| (*s).to_owned()).collect(),
        body,
        loc: loc(),
    })
}

pub fn contract(name: &str, requires: Vec<ExprLoc>, ensures: Vec<ExprLoc>) -> Decl {
    Decl::Contract(ContractDecl {
        name: name.to_owned(),
        requires,
        ensures,
        loc: loc(),
    })
}

pub fn record(name: &str, fields: &[(&str, TypeExpr)]) -> Decl {
    Decl::Record(RecordDecl {
        name: name.to_owned(),
        fields: fields
            .iter()
            .map(|(field, t)| FieldDecl {
                name: (*field).to_owned(),
                ty: t.clone(),
                optional: false,
            })
            .collect(),
        loc: loc(),
    })
}

pub fn sum(name: &str, variants: &[(&str, &[(&str, TypeExpr)])]) -> Decl {
    Decl::Sum(SumDecl {
        name: name.to_owned(),
        variants: variants
            .iter()
            .map(|(variant, fields)| VariantDecl {
                name: (*variant).to_owned(),
                fields: fields
                    .iter()
                    .map(|(field, t)| FieldDecl {
                        name: (*field).to_owned(),
                        ty: t.clone(),
                        optional: false,
                    })
                    .collect(),
            })
            .collect(),
        loc: loc(),
    })
}

pub fn test(name: &str, body: Block) -> Decl {
    Decl::Test(TestDecl {
        name: name.to_owned(),
        body,
        loc: loc(),
    })
}

pub fn property(name: &str, params: Vec<PropertyParam>, body: Block) -> Decl {
    Decl::Property(PropertyDecl {
        name: name.to_owned(),
        params,
        iterations: None,
        body,
        loc: loc(),
    })
}

pub fn prop_param(name: &str, t: TypeExpr, predicate: Option<ExprLoc>) -> PropertyParam {
    PropertyParam {
        name: name.to_owned(),
        ty: t,
        predicate,
    }
}

pub fn actor(name: &str, params: Vec<Param>, state: &[(&str, TypeExpr)], handlers: Vec<HandlerDecl>) -> Decl {
    Decl::Actor(ActorDecl {
        name: name.to_owned(),
        params,
        state: state
            .iter()
            .map(|(field, t)| StateField {
                name: (*field).to_owned(),
                ty: t.clone(),
            })
            .collect(),
        handlers,
        loc: loc(),
    })
}

pub fn handler(message: &str, params: Vec<Param>, body: Block) -> HandlerDecl {
    HandlerDecl {
        message: message.to_owned(),
        params,
        body,
        loc: loc(),
    }
}

pub fn module(name: &str, decls: Vec<Decl>) -> Module {
    Module {
        name: QualifiedName::from_dotted(name),
        imports: vec![],
        decls,
    }
}

pub fn module_with_imports(name: &str, imports: Vec<(&str, Option<&str>)>, decls: Vec<Decl>) -> Module {
    Module {
        name: QualifiedName::from_dotted(name),
        imports: imports
            .into_iter()
            .map(|(target, alias)| Import {
                module: QualifiedName::from_dotted(target),
                alias: alias.map(str::to_owned),
            })
            .collect(),
        decls,
    }
}
