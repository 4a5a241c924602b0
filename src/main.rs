// File: src/main.rs
//
// Main entry point for the mini interpreter.
// Handles command-line argument parsing, installs the tracing subscriber,
// and dispatches to the appropriate subcommand (run or repl).

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use mini::errors::MiniError;
use mini::interpreter::Interpreter;
use mini::repl::Repl;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(
    name = "mini",
    about = "mini: a small expression-oriented scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Log tokens, syntax trees and results, and print call stacks on error
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a mini script file
    Run {
        /// Path to the source file
        file: PathBuf,
    },

    /// Launch the interactive REPL
    Repl,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "mini=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &MiniError, debug: bool) {
    eprint!("{}", err);
    if debug && !err.call_stack.is_empty() {
        eprintln!("{}", "Call stack (innermost first):".dimmed());
        for frame in &err.call_stack {
            eprintln!("  {} {}", "at".dimmed(), frame);
        }
    }
}

fn run_file(file: &PathBuf, debug: bool) -> ExitCode {
    let code = match fs::read_to_string(file) {
        Ok(code) => code,
        Err(err) => {
            eprintln!(
                "{} Failed to read '{}': {}",
                "Error:".bright_red().bold(),
                file.display(),
                err
            );
            return ExitCode::FAILURE;
        }
    };

    let interpreter = Interpreter::new().with_debug(debug);
    match interpreter.run(&code) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, debug);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Run { file } => run_file(&file, cli.debug),

        Commands::Repl => {
            let result = Repl::new(cli.debug).and_then(|mut repl| repl.run());
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red().bold(), err);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
