use anyhow::{Context, Result};
use clap::Args;
use crate::config::ConverterConfig;
use crate::sqlite::{open_sqlite, reader::get_table_row_count, SqliteDatabase};
use std::path::PathBuf;

use super::SelectionArgs;

#[derive(Args)]
pub struct TablesArgs {
    /// SQLite database to inspect
    #[arg(long, value_name = "PATH")]
    db: PathBuf,
    #[command(flatten)]
    selection: SelectionArgs,
}

/// Print the tables an export would contain, with their row counts.
pub fn command(args: TablesArgs) -> Result<()> {
    let conn = open_sqlite(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;
    let db = SqliteDatabase::new(&conn);

    let config = args.selection.resolve(ConverterConfig::default())?;
    let mut converter = config.build(&db)?;

    for table in converter.table_names(&db)? {
        let count = get_table_row_count(&conn, table)
            .with_context(|| format!("Failed to count rows in table '{}'", table))?;
        println!("{}\t{}", table, count);
    }
    Ok(())
}
