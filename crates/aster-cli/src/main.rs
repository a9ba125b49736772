//! Thin CLI over the Aster execution core.
//!
//! Consumes AST-JSON produced by the front-end (`--input=ast`, the default)
//! and drives the library: `run` calls a function with JSON literal
//! arguments, `test` executes the primary module's tests and properties, and
//! `explain` is `run` with per-step tracing. `--format=json` emits exactly
//! one structured record on stdout.

use std::{fs, process::ExitCode};

use aster::{ErrorRecord, OutputMode, RunError, RunOptions, RunReport, Runner, SchedulerMode, loader};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "aster", version, about = "Execution core for the Aster language")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format: human text or one structured JSON record.
    #[arg(long, value_enum, global = true, default_value = "text")]
    format: Format,

    /// Input kind; surface syntax requires the separate front-end.
    #[arg(long, value_enum, global = true, default_value = "ast")]
    input: InputKind,

    /// Scheduler mode for actor deliveries.
    #[arg(long, value_enum, global = true, default_value = "immediate")]
    scheduler: Scheduler,

    /// Seed for property-based generation.
    #[arg(long, global = true, default_value_t = 1)]
    seed: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Call a function of the primary module with JSON literal arguments.
    Run {
        file: String,
        function: String,
        args: Vec<String>,
    },
    /// Run every test and property declared by the primary module.
    Test { file: String },
    /// Like `run`, with per-step trace records enabled.
    Explain {
        file: String,
        function: String,
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    Ast,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scheduler {
    Immediate,
    Deterministic,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(code) => code,
        Err(err) => {
            let report = RunReport::failure(vec![ErrorRecord::from(&err)]);
            print_report(&report, cli.format);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<ExitCode, RunError> {
    let options = RunOptions {
        output_mode: match cli.format {
            Format::Text => OutputMode::Text,
            Format::Json => OutputMode::Json,
        },
        scheduler_mode: match cli.scheduler {
            Scheduler::Immediate => SchedulerMode::Immediate,
            Scheduler::Deterministic => SchedulerMode::Deterministic,
        },
        seed: cli.seed,
        tracing: matches!(cli.command, Command::Explain { .. }),
    };

    match &cli.command {
        Command::Run { file, function, args } | Command::Explain { file, function, args } => {
            let runner = load_runner(file, cli.input)?;
            let values = args.iter().map(|arg| loader::literal_value(arg)).collect::<Result<_, _>>()?;
            let report = runner.call_function(function, values, &options);
            let code = if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
            print_report(&report, cli.format);
            Ok(code)
        }
        Command::Test { file } => {
            let runner = load_runner(file, cli.input)?;
            let summary = runner.run_tests(&options);
            match cli.format {
                Format::Text => print!("{}", summary.render_text()),
                Format::Json => print_json(&summary.to_report()),
            }
            Ok(if summary.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn load_runner(file: &str, input: InputKind) -> Result<Runner, RunError> {
    if input == InputKind::Source {
        return Err(RunError::new(
            aster::ErrorKind::ParseError,
            "Surface-syntax input is handled by the aster front-end",
        )
        .with_hint("compile the file to AST-JSON and pass --input=ast"));
    }
    let text = fs::read_to_string(file)
        .map_err(|e| RunError::new(aster::ErrorKind::ParseError, format!("Cannot read '{file}': {e}")))?;
    Runner::from_json(&text)
}

fn print_report(report: &RunReport, format: Format) {
    match format {
        Format::Json => print_json(report),
        Format::Text => {
            for error in &report.errors {
                match &error.location {
                    Some(loc) => eprintln!("{loc}: {}", error.message),
                    None => eprintln!("error: {}", error.message),
                }
                if let Some(hint) = &error.hint {
                    eprintln!("  hint: {hint}");
                }
            }
            for trace in &report.traces {
                let value = trace.value.as_deref().unwrap_or("");
                println!("{:indent$}{} {value}", "", trace.description, indent = (trace.depth as usize) * 2);
            }
            if let Some(result) = &report.result {
                println!("{result}");
            }
        }
    }
}

fn print_json(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("error: cannot serialize report: {err}"),
    }
}
