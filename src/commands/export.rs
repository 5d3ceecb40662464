use anyhow::{Context, Result};
use clap::Args;
use crate::config::ConverterConfig;
use crate::sqlite::{open_sqlite, SqliteDatabase};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use super::SelectionArgs;

#[derive(Args)]
pub struct ExportArgs {
    /// SQLite database to export
    #[arg(long, value_name = "PATH")]
    db: PathBuf,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Write the document without indentation
    #[arg(long)]
    compact: bool,
    #[command(flatten)]
    selection: SelectionArgs,
}

pub fn command(args: ExportArgs) -> Result<()> {
    let conn = open_sqlite(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;
    let db = SqliteDatabase::new(&conn);

    let config = args.selection.resolve(ConverterConfig::default())?;
    let mut converter = config.build(&db)?;
    let pretty = !args.compact;

    let stats = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            converter.export_to(&db, BufWriter::new(file), pretty)
        }
        None => converter.export_to(&db, BufWriter::new(io::stdout().lock()), pretty),
    }
    .context("Export failed")?;

    tracing::info!(
        "Exported {} rows from {} tables",
        stats.rows,
        stats.tables
    );
    Ok(())
}
