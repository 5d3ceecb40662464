// ABOUTME: Library root for sqlite-xml
// ABOUTME: Streaming SQLite-to-XML export and XML-to-SQLite import

pub mod catalog;
pub mod codec;
pub mod commands;
pub mod config;
pub mod converter;
pub mod database;
pub mod error;
pub mod export;
pub mod format;
pub mod import;
pub mod sqlite;
pub mod strategy;
pub mod utils;

pub use catalog::TableCatalog;
pub use converter::Converter;
pub use database::{Database, InsertOutcome, Row, RowFilter};
pub use error::{ConvertError, ErrorKind, Result};
pub use export::ExportStats;
pub use import::{ImportState, ImportStats};
pub use strategy::ReplaceStrategy;

use rusqlite::Connection;
use sqlite::SqliteDatabase;
use std::io::{BufRead, Write};

/// Write every table of a database as XML to `output`
///
/// Uses the `database` root element and discovers all tables except the
/// reserved metadata and sequence tables.
///
/// # Examples
///
/// ```no_run
/// # use sqlite_xml::{export_database, sqlite::open_sqlite};
/// # fn example() -> sqlite_xml::Result<()> {
/// let conn = open_sqlite("app.db")?;
/// let file = std::fs::File::create("app.xml")?;
/// export_database(&conn, std::io::BufWriter::new(file))?;
/// # Ok(())
/// # }
/// ```
pub fn export_database<W: Write>(conn: &Connection, output: W) -> Result<ExportStats> {
    let db = SqliteDatabase::new(conn);
    Converter::default().export_to(&db, output, false)
}

/// Read a document written by [`export_database`] into a database
///
/// `strategy` decides what happens to existing rows with the same identifier.
pub fn import_database<R: BufRead>(
    conn: &Connection,
    input: R,
    strategy: ReplaceStrategy,
) -> Result<ImportStats> {
    let db = SqliteDatabase::new(conn);
    Converter::default()
        .with_replace_strategy(strategy)
        .import(&db, input)
}
