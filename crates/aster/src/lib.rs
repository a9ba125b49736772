#![doc = include_str!("../../../README.md")]

mod actors;
mod args;
pub mod ast;
mod builtins;
mod contracts;
mod env;
mod error;
mod eval;
pub mod loader;
mod property;
mod report;
mod rng;
mod run;
mod runtime;
mod symbols;
mod value;

pub use crate::{
    error::{CodeLoc, ErrorKind, RunError, RunResult},
    report::{ErrorRecord, LogLevel, LogRecord, RunReport, RunStatus, TraceRecord, TraceStep},
    run::{RunOptions, Runner, TestOutcome, TestSummary},
    runtime::{OutputMode, Runtime, SchedulerMode},
    symbols::SymbolTable,
    value::{ActorId, ConstructorValue, Value},
};
