//! The Leverr language CLI.
//!
//! Provides the `leverr` command with two subcommands:
//!
//! - `leverr run <file>` - parse, type-check, and evaluate a source file
//! - `leverr repl` - start an interactive shell

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "leverr", version, about = "The Leverr language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, type-check, and evaluate a Leverr source file
    Run {
        /// Path to the source file
        file: PathBuf,
    },
    /// Start an interactive REPL
    Repl,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => {
            if let Err(e) = run_file(&file) {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        Commands::Repl => {
            if let Err(e) = leverr_repl::run_repl(&leverr_repl::ReplConfig::default()) {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }
}

fn run_file(path: &Path) -> Result<(), String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read '{}': {}", path.display(), e))?;
    log::debug!("running {}", path.display());
    let rendered = leverr::run_source(&source)?;
    println!("{rendered}");
    Ok(())
}
