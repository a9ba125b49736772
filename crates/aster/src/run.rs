//! Public driver interface.
//!
//! A [`Runner`] holds loaded modules and drives one invocation at a time:
//! calling a named function of the primary module with literal arguments, or
//! executing every test and property the primary module declares. Each
//! invocation assembles a fresh [`Runtime`], so tests are isolated and
//! property runs are reproducible from their seed.

use std::fmt::Write as _;

use crate::{
    args::ActualArg,
    ast::{Module, QualifiedName},
    env::Env,
    error::{ErrorKind, RunError, RunResult},
    eval::{Evaluator, Interrupt},
    loader,
    property::{self, PropertyOutcome},
    report::{ErrorRecord, LogRecord, RunReport},
    runtime::{OutputMode, Runtime, SchedulerMode},
    symbols::SymbolTable,
    value::Value,
};

/// Per-invocation configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_mode: OutputMode,
    pub scheduler_mode: SchedulerMode,
    /// RNG seed for property runs; a fixed seed makes generation byte-identical.
    pub seed: u32,
    /// Record per-step trace records (the `explain` command).
    pub tracing: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Text,
            scheduler_mode: SchedulerMode::Immediate,
            seed: property::DEFAULT_SEED,
            tracing: false,
        }
    }
}

/// Primary interface for running loaded Aster modules.
///
/// # Example
/// ```no_run
/// use aster::{Runner, RunOptions, Value};
///
/// let runner = Runner::from_json(&std::fs::read_to_string("program.ast.json").unwrap()).unwrap();
/// let report = runner.call_function("main", vec![Value::Int(1)], &RunOptions::default());
/// assert!(report.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    modules: Vec<Module>,
}

impl Runner {
    /// Creates a runner over modules in dependency order, primary last.
    pub fn new(modules: Vec<Module>) -> RunResult<Self> {
        if modules.is_empty() {
            return Err(RunError::new(ErrorKind::ParseError, "A program needs at least one module"));
        }
        Ok(Self { modules })
    }

    /// Creates a runner from an AST-JSON document.
    pub fn from_json(text: &str) -> RunResult<Self> {
        Self::new(loader::parse_program(text)?)
    }

    /// The entry module's qualified name.
    #[must_use]
    pub fn primary_module(&self) -> &QualifiedName {
        &self.modules.last().expect("validated non-empty").name
    }

    fn runtime(&self, options: &RunOptions) -> Runtime {
        let symbols = SymbolTable::build(&self.modules);
        let mut rt = Runtime::assemble(&self.modules, symbols);
        rt.set_output_mode(options.output_mode);
        rt.set_scheduler_mode(options.scheduler_mode);
        rt.set_seed(options.seed);
        rt.set_tracing(options.tracing);
        rt
    }

    /// Calls a function of the primary module with positional arguments and
    /// returns the full structured report (result or errors, logs, traces).
    #[must_use]
    pub fn call_function(&self, name: &str, args: Vec<Value>, options: &RunOptions) -> RunReport {
        let mut rt = self.runtime(options);
        let outcome = {
            let mut ev = Evaluator::new(&mut rt);
            let actuals = args.into_iter().map(ActualArg::positional).collect();
            ev.call_named(name, actuals)
        };
        let mut report = match outcome {
            Ok(value) => {
                let result = value
                    .to_json()
                    .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
                RunReport::success(Some(result))
            }
            Err(err) => RunReport::failure(vec![ErrorRecord::from(&err)]),
        };
        report.logs = std::mem::take(&mut rt.logs);
        report.traces = std::mem::take(&mut rt.traces);
        report
    }

    /// Like [`call_function`](Self::call_function) but returns the raw value,
    /// for embedding and tests.
    pub fn call_function_value(&self, name: &str, args: Vec<Value>, options: &RunOptions) -> RunResult<Value> {
        let mut rt = self.runtime(options);
        let mut ev = Evaluator::new(&mut rt);
        let actuals = args.into_iter().map(ActualArg::positional).collect();
        ev.call_named(name, actuals)
    }

    /// Runs every test and property declared by the primary module, each in a
    /// fresh runtime.
    #[must_use]
    pub fn run_tests(&self, options: &RunOptions) -> TestSummary {
        let probe = self.runtime(options);
        let module = probe.primary_module.clone();
        let mut outcomes = Vec::new();
        let mut logs = Vec::new();

        for test in &probe.tests {
            let mut rt = self.runtime(options);
            let failure = {
                let mut ev = Evaluator::new(&mut rt);
                let mut env = Env::new();
                match ev.run_block(&test.body, &mut env, &module) {
                    Ok(_) | Err(Interrupt::Return(_)) => None,
                    Err(Interrupt::Error(err)) => Some(err),
                }
            };
            logs.append(&mut rt.logs);
            outcomes.push(TestOutcome {
                name: test.name.clone(),
                failure,
                counterexample: None,
            });
        }

        for prop in &probe.properties {
            let mut rt = self.runtime(options);
            let (failure, counterexample) = {
                let mut ev = Evaluator::new(&mut rt);
                match property::run_property(&mut ev, prop, &module) {
                    Ok(PropertyOutcome::Passed { .. }) => (None, None),
                    Ok(PropertyOutcome::Failed(found)) => {
                        let rendered: Vec<(String, String)> = found
                            .inputs
                            .iter()
                            .map(|(name, value)| (name.clone(), value.to_string()))
                            .collect();
                        let inputs: Vec<String> = rendered.iter().map(|(n, v)| format!("{n} = {v}")).collect();
                        let failure = RunError::new(
                            ErrorKind::AssertionFailed,
                            format!(
                                "Property '{}' failed for {}: {}",
                                prop.name,
                                inputs.join(", "),
                                found.message
                            ),
                        );
                        (Some(failure), Some(rendered))
                    }
                    Err(err) => (Some(err), None),
                }
            };
            logs.append(&mut rt.logs);
            outcomes.push(TestOutcome {
                name: prop.name.clone(),
                failure,
                counterexample,
            });
        }

        TestSummary { outcomes, logs }
    }
}

/// The result of one test or property.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    /// `None` means the test passed.
    pub failure: Option<RunError>,
    /// Shrunken property inputs, rendered, when the failure is a counterexample.
    pub counterexample: Option<Vec<(String, String)>>,
}

/// All outcomes of a `test` invocation plus the buffered logs.
#[derive(Debug, Clone)]
pub struct TestSummary {
    pub outcomes: Vec<TestOutcome>,
    pub logs: Vec<LogRecord>,
}

impl TestSummary {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.failure.is_none())
    }

    /// Collapses the outcomes into the structured report form.
    #[must_use]
    pub fn to_report(&self) -> RunReport {
        let errors: Vec<ErrorRecord> = self
            .outcomes
            .iter()
            .filter_map(|outcome| {
                outcome.failure.as_ref().map(|err| {
                    let mut record = ErrorRecord::from(err);
                    record.message = format!("{}: {}", outcome.name, record.message);
                    record
                })
            })
            .collect();
        let passed = self.outcomes.len() - errors.len();
        let mut report = if errors.is_empty() {
            RunReport::success(Some(serde_json::Value::String(format!(
                "{passed} passed, 0 failed"
            ))))
        } else {
            let mut report = RunReport::failure(errors);
            report.result = Some(serde_json::Value::String(format!(
                "{passed} passed, {} failed",
                self.outcomes.len() - passed
            )));
            report
        };
        report.logs = self.logs.clone();
        report
    }

    /// Human-readable per-test lines plus a summary line.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let mut failed = 0usize;
        for outcome in &self.outcomes {
            match &outcome.failure {
                None => {
                    let _ = writeln!(out, "test {} ... ok", outcome.name);
                }
                Some(err) => {
                    failed += 1;
                    let _ = writeln!(out, "test {} ... FAILED: {err}", outcome.name);
                }
            }
        }
        let _ = writeln!(out, "{} passed, {failed} failed", self.outcomes.len() - failed);
        out
    }
}
