//! pl CLI entry point.
//!
//! Usage:
//!   pl                              # Interactive REPL
//!   pl -c <expr>                    # Evaluate an expression and exit
//!   pl --context ctx.json -c <expr> # Evaluate against a JSON context

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use pl_kernel::{Kernel, KernelConfig};
use pl_repl::format::{detect_context, format_outputs};
use pl_types::Value;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    context: Option<PathBuf>,
    command: Option<String>,
    max_depth: Option<usize>,
}

enum Action {
    Run(Args),
    Help,
    Version,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Action> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Action::Help),
            "-V" | "--version" => return Ok(Action::Version),
            "-c" => {
                parsed.command = Some(args.next().context("-c requires an expression argument")?);
            }
            "--context" => {
                let path = args.next().context("--context requires a file path (or -)")?;
                parsed.context = Some(PathBuf::from(path));
            }
            "--max-depth" => {
                let depth = args.next().context("--max-depth requires a number")?;
                parsed.max_depth =
                    Some(depth.parse().with_context(|| format!("invalid depth: {depth}"))?);
            }
            other => {
                if let Some(path) = other.strip_prefix("--context=") {
                    parsed.context = Some(PathBuf::from(path));
                } else {
                    bail!("Unknown option: {other}\nRun 'pl --help' for usage.");
                }
            }
        }
    }
    Ok(Action::Run(parsed))
}

fn run() -> Result<ExitCode> {
    let args = match parse_args(env::args().skip(1))? {
        Action::Help => {
            print_help();
            return Ok(ExitCode::SUCCESS);
        }
        Action::Version => {
            println!("pl {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        Action::Run(args) => args,
    };

    let context = match &args.context {
        Some(path) => pl_repl::load_context(path)?,
        None => Value::Null,
    };

    match args.command {
        Some(expr) => run_command(&expr, &context, args.max_depth),
        None => {
            pl_repl::run(context)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_help() {
    println!(
        r#"pl v{}

Usage:
  pl [OPTIONS]                 Interactive REPL
  pl [OPTIONS] -c <expr>       Evaluate an expression and exit

Options:
  -c <expr>                    Evaluate an expression and exit
  --context <file>             JSON file used as the evaluation context (- for stdin)
  --max-depth <n>              Reject pipelines nested deeper than n
  -h, --help                   Show this help
  -V, --version                Show version

Environment:
  RUST_LOG                     Log filter, e.g. RUST_LOG=pl_kernel=trace

Examples:
  pl -c '(pass 1 2 | pass 0)'
  echo '{{"name":"world"}}' | pl --context - -c '(printf "hello, %s" $.name)'
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Evaluate one expression, print its outputs one per line, and exit.
fn run_command(expr: &str, context: &Value, max_depth: Option<usize>) -> Result<ExitCode> {
    let mut config = KernelConfig::named("cli");
    config.max_depth = max_depth;
    let kernel = Kernel::new(config);

    match kernel.execute_expr(expr, context) {
        Ok(values) => {
            let output = format_outputs(&values, detect_context());
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
