//! Stanza unified CLI tool
//!
//! Single command-line interface for working with Stanza manifests:
//! syntax checking, type resolution against a module tree, and type
//! inventory listing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "stanza")]
#[command(about = "Stanza configuration language toolchain", long_about = None)]
#[command(version)]
struct Cli {
    /// Colorize output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse manifests and report syntax errors
    Check {
        /// Manifest files or glob patterns
        files: Vec<String>,
    },

    /// Resolve a class or defined type against a module tree
    Resolve {
        /// Qualified type name (e.g. apache::vhost)
        name: String,
        /// Module search path (repeatable)
        #[arg(short, long = "modulepath")]
        modulepath: Vec<PathBuf>,
        /// Environment name
        #[arg(long, default_value = "production")]
        environment: String,
        /// Resolve as a defined type instead of a class
        #[arg(long)]
        definition: bool,
        /// Print the resolved type as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every type defined under a module path
    List {
        /// Module search path (repeatable)
        #[arg(short, long = "modulepath")]
        modulepath: Vec<PathBuf>,
        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = output::resolve_color_choice(cli.color.as_deref());

    match cli.command {
        Commands::Check { files } => commands::check::execute(files, color),
        Commands::Resolve {
            name,
            modulepath,
            environment,
            definition,
            json,
        } => commands::resolve::execute(name, modulepath, environment, definition, json, color),
        Commands::List { modulepath, json } => commands::list::execute(modulepath, json, color),
    }
}
