//! # cvt CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cvt_cli::compile::{run_compile, CompileArgs};
use cvt_cli::flatten::{run_flatten, FlattenArgs};
use cvt_cli::inspect::{run_inspect, InspectArgs};

/// Circuit-value shape toolchain.
///
/// Inspects, flattens and compiles structural circuit types described in
/// YAML or JSON shape files.
#[derive(Parser, Debug)]
#[command(name = "cvt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the flattened layout of a shape.
    Inspect(InspectArgs),

    /// Flatten a value against a shape.
    Flatten(FlattenArgs),

    /// Compile a shape's witness-and-check circuit.
    Compile(CompileArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Flatten(args) => run_flatten(&args),
        Commands::Compile(args) => run_compile(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
