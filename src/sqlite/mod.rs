// ABOUTME: SQLite implementation of the Database capability
// ABOUTME: Opens database files and adapts a borrowed rusqlite Connection

pub mod reader;
pub mod writer;

use crate::database::{Database, InsertOutcome, Row, RowFilter};
use crate::error::Result;
use rusqlite::Connection;
use reader::ColumnInfo;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Open a SQLite database file for reading and writing.
///
/// The file is created if it does not exist yet.
pub fn open_sqlite(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    tracing::debug!("Opening SQLite database {}", path.display());
    Ok(Connection::open(path)?)
}

/// [`Database`] over a borrowed SQLite connection.
///
/// The connection stays owned by the caller, including any transaction
/// wrapping the export or import.
pub struct SqliteDatabase<'a> {
    conn: &'a Connection,
    columns: RefCell<HashMap<String, Rc<[ColumnInfo]>>>,
}

impl<'a> SqliteDatabase<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            columns: RefCell::new(HashMap::new()),
        }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }

    /// Schema of `table`, read once per table.
    fn columns_of(&self, table: &str) -> Result<Rc<[ColumnInfo]>> {
        if let Some(columns) = self.columns.borrow().get(table) {
            return Ok(Rc::clone(columns));
        }

        let columns: Rc<[ColumnInfo]> = reader::table_columns(self.conn, table)?.into();
        self.columns
            .borrow_mut()
            .insert(table.to_string(), Rc::clone(&columns));
        Ok(columns)
    }
}

impl Database for SqliteDatabase<'_> {
    fn list_tables(&self) -> Result<Vec<String>> {
        reader::list_tables(self.conn)
    }

    fn for_each_row(
        &self,
        table: &str,
        visit: &mut dyn FnMut(&Row) -> Result<()>,
    ) -> Result<u64> {
        reader::stream_table_rows(self.conn, table, visit)
    }

    fn insert_row(&self, table: &str, row: &Row) -> Result<InsertOutcome> {
        let columns = self.columns_of(table)?;
        writer::insert_row(self.conn, table, row, &columns)
    }

    fn delete_rows(&self, table: &str, filter: &RowFilter) -> Result<usize> {
        writer::delete_rows(self.conn, table, filter)
    }
}
