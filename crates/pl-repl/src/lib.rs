//! pl REPL — Interactive evaluator for pl pipeline expressions.
//!
//! This REPL evaluates pipelines against a context value held for the session.
//! It handles:
//! - Meta-commands: `/help`, `/quit`, `/ast`, `/functions`, `/context`, `/set`, `/load`
//! - Pipeline evaluation via the Kernel
//! - Command history via rustyline

pub mod format;

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use pl_kernel::ast::Reference;
use pl_kernel::ast::sexpr::format_pipeline;
use pl_kernel::parser::{parse, parse_reference};
use pl_kernel::resolve::set;
use pl_kernel::{Kernel, KernelConfig};
use pl_types::Value;

use crate::format::{OutputContext, format_context, format_outputs};

/// Returned from [`Repl::process_line`] when the user asked to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit;

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit requested")
    }
}

impl std::error::Error for Exit {}

/// Whether `err` is the REPL's exit request.
pub fn is_exit(err: &anyhow::Error) -> bool {
    err.is::<Exit>()
}

/// Result from meta-command handling.
#[derive(Debug)]
enum MetaResult {
    /// Continue with optional output
    Continue(Option<String>),
    /// Exit the REPL (caller should save history and exit)
    Exit,
}

/// REPL configuration and state.
pub struct Repl {
    kernel: Kernel,
    context: Value,
    show_ast: bool,
}

impl Repl {
    /// Create a new REPL with builtins and an empty (`null`) context.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::named("repl"))
    }

    /// Create a new REPL with a custom kernel configuration.
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            kernel: Kernel::new(config),
            context: Value::Null,
            show_ast: false,
        }
    }

    /// Replace the evaluation context.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel {
        &mut self.kernel
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Process a single line of input.
    ///
    /// Returns Ok(None) for empty input, Ok(Some(output)) for output to display,
    /// or an [`Exit`] error when the REPL should exit.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();

        // Handle meta-commands (both /cmd and cmd forms for common ones)
        let meta = if trimmed.starts_with('/') {
            Some(self.handle_meta_command(trimmed))
        } else {
            self.try_shell_style_command(trimmed)
        };
        if let Some(meta) = meta {
            return match meta {
                MetaResult::Continue(output) => Ok(output),
                MetaResult::Exit => Err(Exit.into()),
            };
        }

        if trimmed.is_empty() {
            return Ok(None);
        }

        let pipeline = match parse(trimmed) {
            Ok(pipeline) => pipeline,
            Err(errors) => {
                let mut msg = String::from("Parse error:");
                for err in errors {
                    msg.push_str(&format!("\n  {err}"));
                }
                return Ok(Some(msg));
            }
        };

        if self.show_ast {
            return Ok(Some(format_pipeline(&pipeline)));
        }

        match self.kernel.execute(&pipeline, &self.context) {
            Ok(values) => Ok(Some(format_outputs(&values, OutputContext::Interactive))),
            Err(e) => Ok(Some(format!("Error: {e}"))),
        }
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> MetaResult {
        let (command, rest) = match cmd.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (cmd, ""),
        };

        match command {
            "/quit" | "/q" | "/exit" => MetaResult::Exit,
            "/help" | "/h" | "/?" => MetaResult::Continue(Some(HELP_TEXT.to_string())),
            "/ast" => {
                self.show_ast = !self.show_ast;
                MetaResult::Continue(Some(format!(
                    "AST mode: {}",
                    if self.show_ast { "ON" } else { "OFF" }
                )))
            }
            "/functions" | "/fns" => {
                let functions = self.kernel.functions();
                let mut output = String::from("Functions:");
                for name in functions.names() {
                    if let Some(function) = functions.get(name) {
                        output.push_str(&format!("\n  {name} {}", function.signature()));
                    }
                }
                MetaResult::Continue(Some(output))
            }
            "/conversions" => {
                let pairs = self.kernel.conversions().pairs();
                if pairs.is_empty() {
                    return MetaResult::Continue(Some("(no conversions)".to_string()));
                }
                let mut output = String::from("Conversions:");
                for (from, to) in pairs {
                    output.push_str(&format!("\n  {from} -> {to}"));
                }
                MetaResult::Continue(Some(output))
            }
            "/context" | "/ctx" => MetaResult::Continue(Some(format_context(&self.context))),
            "/set" => MetaResult::Continue(Some(match self.set_context_value(rest) {
                Ok(()) => format!("set {}", rest.split_whitespace().next().unwrap_or("$")),
                Err(e) => format!("Error: {e:#}"),
            })),
            "/load" => MetaResult::Continue(Some(match load_context(Path::new(rest)) {
                Ok(context) => {
                    self.context = context;
                    format!("Context loaded from {rest}")
                }
                Err(e) => format!("Error: {e:#}"),
            })),
            "/reset" => {
                self.context = Value::Null;
                MetaResult::Continue(Some("Context reset".to_string()))
            }
            _ => MetaResult::Continue(Some(format!(
                "Unknown command: {}\nType /help or help for available commands.",
                command
            ))),
        }
    }

    /// `/set $.path <json>`: store a JSON value in the context.
    fn set_context_value(&mut self, args: &str) -> Result<()> {
        let (target, json) = args
            .split_once(char::is_whitespace)
            .context("usage: /set <reference> <json>")?;
        // A bare `$` addresses the whole context.
        let reference = if target == "$" {
            Reference::default()
        } else {
            parse_reference(target).map_err(|errors| {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                anyhow::anyhow!("invalid reference {target}: {}", messages.join("; "))
            })?
        };
        let value: Value = serde_json::from_str(json.trim()).context("value is not valid JSON")?;
        set(&mut self.context, &reference, value)?;
        Ok(())
    }

    /// Try to handle a shell-style command (without leading /).
    /// Returns Some(result) if it was a recognized command, None otherwise.
    fn try_shell_style_command(&mut self, cmd: &str) -> Option<MetaResult> {
        match cmd {
            "quit" | "exit" => Some(self.handle_meta_command("/quit")),
            "help" => Some(self.handle_meta_command("/help")),
            _ => None,
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

/// Load an evaluation context from a JSON file, or from stdin when `path` is `-`.
pub fn load_context(path: &Path) -> Result<Value> {
    let source = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read context from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context: {}", path.display()))?
    };
    serde_json::from_str(&source)
        .with_context(|| format!("Context is not valid JSON: {}", path.display()))
}

const HELP_TEXT: &str = r#"pl — pipeline expression REPL

Meta Commands (use with or without /):
  help, /help, /?   Show this help
  quit, /quit, /q   Exit the REPL

Slash-only commands:
  /ast              Toggle AST display mode
  /functions, /fns  List functions with their signatures
  /conversions      List registered conversions
  /context, /ctx    Show the evaluation context
  /set <ref> <json> Store a value in the context, e.g. /set $.user {"name":"jo"}
  /load <file>      Replace the context with a JSON file
  /reset            Reset the context to null

Built-in Functions:
  pass [args...]               Return the arguments unchanged
  printf <format> [args...]    Format values (%s %d %f %v %q %x %t)
  regex <pattern> [inputs...]  One match per matching input

Language:
  (f 1 2.5 "text")  Call f with literals
  (f $.a[0].b)      Reference into the context
  (f 1 | g 2)       Pipe: g receives 2 followed by f's outputs
  (f (g 1) 2)       Nested: g's outputs are spliced into f's arguments

Examples:
  (pass 1 2 | pass 0)                  # 0 1 2
  (printf "hello, %s" $.name)          # Format a context value
  (regex `(\w+)@(\w+)` "a@b" | printf "%s")
"#;

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the REPL.
pub fn run(context: Value) -> Result<()> {
    println!("pl v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.");

    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create editor")?;

    // Load history if it exists
    let history_path = directories::BaseDirs::new()
        .map(|b| b.data_dir().join("pl").join("history.txt"));
    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Only log if it's not a "file not found" error (expected on first run)
            let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let mut repl = Repl::new().with_context(context);
    println!();

    loop {
        match rl.readline("pl> ") {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }

                match repl.process_line(&line) {
                    Ok(Some(output)) => println!("{}", output),
                    Ok(None) => {}
                    Err(e) if is_exit(&e) => break,
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);

    Ok(())
}
