use anyhow::{Context, Result};
use clap::Args;
use crate::config::ConverterConfig;
use crate::sqlite::{open_sqlite, SqliteDatabase};
use crate::ReplaceStrategy;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use super::SelectionArgs;

#[derive(Args)]
pub struct ImportArgs {
    /// SQLite database to import into
    #[arg(long, value_name = "PATH")]
    db: PathBuf,
    /// Input document (defaults to stdin)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// What to do with existing rows that conflict with imported ones
    #[arg(long, value_enum)]
    strategy: Option<ReplaceStrategy>,
    /// Column identifying the existing row to replace
    #[arg(long, value_name = "COLUMN")]
    id_column: Option<String>,
    /// Run the whole import in one transaction, rolled back on failure
    #[arg(long)]
    atomic: bool,
    #[command(flatten)]
    selection: SelectionArgs,
}

pub fn command(args: ImportArgs) -> Result<()> {
    let conn = open_sqlite(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;

    // Dropped without commit on any error path, which rolls the import back.
    let tx = if args.atomic {
        Some(
            conn.unchecked_transaction()
                .context("Failed to begin import transaction")?,
        )
    } else {
        None
    };

    let db = SqliteDatabase::new(&conn);
    let config = args.selection.resolve(ConverterConfig {
        replace_strategy: args.strategy,
        id_column: args.id_column,
        ..Default::default()
    })?;
    let mut converter = config.build(&db)?;

    let stats = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            converter.import(&db, BufReader::new(file))
        }
        None => converter.import(&db, io::stdin().lock()),
    }
    .context("Import failed")?;

    if let Some(tx) = tx {
        tx.commit().context("Failed to commit import transaction")?;
    }

    println!(
        "Imported {} tables: {} inserted, {} replaced, {} kept, {} discarded ({} tables ignored)",
        stats.tables_imported,
        stats.rows_inserted,
        stats.rows_replaced,
        stats.rows_kept,
        stats.rows_discarded,
        stats.tables_ignored
    );
    Ok(())
}
