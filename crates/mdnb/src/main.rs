//! mdnb CLI - Markdown notebook compiler.
//!
//! Provides commands for:
//! - `compile`: Compile a document (abbreviated paths accepted) to HTML
//! - `resolve`: Resolve an abbreviated path to its canonical form
//! - `tree`: Print the navigation tree of the notebook

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CompileArgs, ResolveArgs, TreeArgs};
use output::Output;

/// mdnb - Markdown notebook compiler.
#[derive(Parser)]
#[command(name = "mdnb", version, about)]
struct Cli {
    /// Enable verbose logging (INFO level).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document to HTML.
    Compile(CompileArgs),
    /// Resolve an abbreviated path.
    Resolve(ResolveArgs),
    /// Print the notebook navigation tree.
    Tree(TreeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Compile(args) => args.execute(&output),
        Commands::Resolve(args) => args.execute(&output),
        Commands::Tree(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
