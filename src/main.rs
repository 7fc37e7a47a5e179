//! # Packmule: The Main Entry Point
//!
//! This module handles Command Line Interface (CLI) parsing, logging
//! initialization, and dispatching the build/launch/doctor workflows. It is
//! the orchestrator of the Packmule utility.
//!
//! Both workflows are interactive by design: every terminal outcome (success
//! or failure) is followed by a blocking pause so the operator's console does
//! not vanish with the diagnostics still on it. `--yes` skips the pauses for
//! scripted use.

use clap::{Parser, Subcommand};
use log::{LevelFilter, error};
use simplelog::{Config, SimpleLogger};

mod builder;
mod config;
mod invariant;
mod launcher;
mod probe;
mod system;

use crate::config::WorkflowConfig;
use crate::system::{RealSystem, SystemOps};

/// The primary Command Line Interface (CLI) configuration.
///
/// Uses `clap` for sub-command parsing and help generation.
#[derive(Parser)]
#[command(name = "packmule")]
#[command(about = "Build-and-launch workflow for a bundled single-file application", long_about = None)]
struct Cli {
    /// The sub-command to execute (build, launch, doctor).
    #[command(subcommand)]
    command: Option<Commands>,

    /// Turn on verbose logging.
    ///
    /// - `-v`: Debug
    /// - `-vv`: Trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Skip the blocking "Press Enter" pauses (for scripted invocations).
    #[arg(long)]
    yes: bool,
}

/// Available sub-commands for the Packmule utility.
#[derive(Subcommand)]
enum Commands {
    /// Package the application into a single self-contained executable.
    ///
    /// This command will:
    /// 1. Verify the virtual environment, entry script, and data asset.
    /// 2. Upgrade pip and install the dependency manifest and packaging tool.
    /// 3. Clear stale build output and packaging metadata.
    /// 4. Produce `dist/<app>` with the data asset embedded.
    Build,
    /// Find the built executable and run it.
    ///
    /// Prefers the canonical `dist/` location, falls back to a copy next to
    /// this tool, and keeps the console open after the application exits.
    Launch,
    /// Inspect the working directory and report workflow health.
    ///
    /// Checks for:
    /// - A usable virtual environment.
    /// - The packaging inputs (entry script, data asset, requirements).
    /// - Build artifacts and leftover packaging metadata.
    Doctor,
}

fn main() {
    let cli = Cli::parse();

    // Determine log level based on verbosity flag
    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // Initialize logger
    // We ignore the result here as logging failure shouldn't crash the startup
    let _ = SimpleLogger::init(log_level, Config::default());

    let system = RealSystem;

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Cannot determine the working directory: {}", e);
            pause(&system, cli.yes);
            std::process::exit(1);
        }
    };

    let workflow = match WorkflowConfig::load(&cwd) {
        Ok(workflow) => workflow,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            pause(&system, cli.yes);
            std::process::exit(1);
        }
    };

    match &cli.command {
        Some(Commands::Build) => match builder::run_build(&system, &workflow, &cwd) {
            Ok(artifact) => {
                println!();
                println!("Build complete: {}", artifact.display());
                pause(&system, cli.yes);
            }
            Err(e) => {
                error!("Build failed: {:#}", e);
                pause(&system, cli.yes);
                std::process::exit(1);
            }
        },
        Some(Commands::Launch) => match launcher::run_launch(&system, &workflow, &cwd) {
            Ok(code) => {
                // Keep the console open even on a clean exit, so transient
                // crashes of the application stay visible to the operator.
                pause(&system, cli.yes);
                if code != 0 {
                    std::process::exit(code);
                }
            }
            Err(e) => {
                error!("Launch failed: {:#}", e);
                pause(&system, cli.yes);
                std::process::exit(1);
            }
        },
        Some(Commands::Doctor) => {
            probe::report(&system, &workflow, &cwd);
        }
        None => {
            // Default behavior if no command: print the help message
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
        }
    }
}

fn pause(system: &impl SystemOps, skip: bool) {
    if !skip {
        system.await_operator_ack();
    }
}
