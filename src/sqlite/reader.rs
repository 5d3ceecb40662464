// ABOUTME: SQLite database introspection and streaming row reads
// ABOUTME: Functions to list tables, count rows, describe columns and walk table rows

use crate::database::Row;
use crate::error::Result;
use crate::utils::quote_ident;
use rusqlite::Connection;

/// List all tables in a SQLite database
///
/// Queries the sqlite_master system table in creation order. Internal tables
/// such as `sqlite_sequence` are included; callers decide what to skip.
///
/// # Examples
///
/// ```no_run
/// # use sqlite_xml::sqlite::{open_sqlite, reader::list_tables};
/// # fn example() -> sqlite_xml::Result<()> {
/// let conn = open_sqlite("database.db")?;
/// for table in list_tables(&conn)? {
///     println!("Table: {}", table);
/// }
/// # Ok(())
/// # }
/// ```
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    tracing::debug!("Listing tables from SQLite database");

    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY rowid")?;

    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;

    tracing::debug!("Found {} tables in SQLite database", tables.len());

    Ok(tables)
}

/// Get row count for a specific table
pub fn get_table_row_count(conn: &Connection, table: &str) -> Result<usize> {
    let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count: i64 = conn.query_row(&query, [], |row| row.get(0))?;
    Ok(count as usize)
}

/// A column of a table as declared in its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, empty for untyped columns.
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn is_untyped(&self) -> bool {
        self.declared_type.trim().is_empty()
    }

    /// Whether SQLite gives this column BLOB affinity.
    ///
    /// Follows the affinity rules in order: INT, then CHAR/CLOB/TEXT, then
    /// BLOB or no type at all.
    pub fn has_blob_affinity(&self) -> bool {
        let declared = self.declared_type.to_ascii_uppercase();
        if declared.contains("INT")
            || ["CHAR", "CLOB", "TEXT"].iter().any(|t| declared.contains(t))
        {
            return false;
        }
        declared.contains("BLOB") || self.is_untyped()
    }
}

/// Columns of `table` in schema order.
///
/// Uses `PRAGMA table_info`, so an unknown table yields an empty list.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let query = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&query)?;

    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(columns)
}

/// Stream every row of a table to `visit`
///
/// Rows are read one at a time from a single cursor in the order SQLite
/// returns them for `SELECT *` (normally rowid order); only the row being
/// visited is held in memory. The prepared statement and its cursor are
/// dropped on every return path, including when `visit` fails.
///
/// # Returns
///
/// Number of rows visited
pub fn stream_table_rows(
    conn: &Connection,
    table: &str,
    visit: &mut dyn FnMut(&Row) -> Result<()>,
) -> Result<u64> {
    let query = format!("SELECT * FROM {}", quote_ident(table));
    let mut stmt = conn.prepare(&query)?;

    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    tracing::debug!(
        "Table '{}' has {} columns: {:?}",
        table,
        column_names.len(),
        column_names
    );

    let mut rows = stmt.query([])?;
    let mut visited = 0u64;

    while let Some(sql_row) = rows.next()? {
        let mut row = Row::with_capacity(column_names.len());
        for (idx, col_name) in column_names.iter().enumerate() {
            let value: rusqlite::types::Value = sql_row.get(idx)?;
            row.insert(col_name.clone(), value);
        }
        visit(&row)?;
        visited += 1;
    }

    Ok(visited)
}
