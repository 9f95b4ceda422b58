//! ecoretree CLI
//!
//! Offline tools over Ecore JSON documents: render the editor tree, replay a
//! recorded push channel against a snapshot, and compute the Set command a
//! form edit would send.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ecoretree")]
#[command(about = "ecoretree - Ecore tree mirror tools", long_about = None)]
struct Cli {
    /// Log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the tree built from a snapshot
    Render(commands::render::RenderArgs),
    /// Apply recorded push messages to a snapshot
    Replay(commands::replay::ReplayArgs),
    /// Show the change set and Set command between two payloads
    Diff(commands::diff::DiffArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        ecoretree_core::logging_facility::init(ecoretree_core::logging_facility::Profile::Development);
    }

    let result = match cli.command {
        Commands::Render(args) => commands::render::execute(args),
        Commands::Replay(args) => commands::replay::execute(args),
        Commands::Diff(args) => commands::diff::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
