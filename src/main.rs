// ABOUTME: CLI entry point for sqlite-xml
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Parser, Subcommand};
use sqlite_xml::commands;

#[derive(Parser)]
#[command(name = "sqlite-xml")]
#[command(about = "Export SQLite databases to XML and import them back", long_about = None)]
#[command(version)]
struct Cli {
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the selected tables of a database as one XML document
    Export {
        #[command(flatten)]
        args: commands::export::ExportArgs,
    },
    /// Load rows from an XML document written by `export`
    ///
    /// Rows are committed one at a time unless --atomic is given. Conflicting
    /// rows are handled according to --strategy:
    /// - replace-all: empty each imported table first
    /// - replace-existing: delete the existing row with the same id, then insert (default)
    /// - replace-none: keep the existing row
    Import {
        #[command(flatten)]
        args: commands::import::ImportArgs,
    },
    /// List the tables an export would contain, with row counts
    Tables {
        #[command(flatten)]
        args: commands::tables::TablesArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // 1. RUST_LOG environment variable has highest precedence
    // 2. --log flag is used if RUST_LOG is not set
    // Logs go to stderr so an export to stdout stays a clean document.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Export { args } => commands::export::command(args),
        Commands::Import { args } => commands::import::command(args),
        Commands::Tables { args } => commands::tables::command(args),
    }
}
