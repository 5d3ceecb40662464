// ABOUTME: Database capability consumed by the exporter and importer
// ABOUTME: Defines row mappings, insert outcomes and the Database trait

use crate::error::Result;
use rusqlite::types::Value;

/// One database row: column name to scalar value, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Set `column` to `value`, replacing an earlier value for the same column.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Result of a single insert attempt.
///
/// Fatal engine failures are reported through `Err`; a constraint violation
/// is an ordinary outcome the replace strategy decides about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The row violates a uniqueness or identity constraint.
    Conflict(String),
}

/// Which rows [`Database::delete_rows`] removes.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    All,
    ColumnEquals { column: String, value: Value },
}

/// Row-level access to a database, borrowed for the duration of one export
/// or import.
pub trait Database {
    /// Names of all tables, in catalog order.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Stream every row of `table` to `visit`, one at a time, in cursor order.
    ///
    /// Returns the number of rows visited. The cursor is released before
    /// returning, including when `visit` fails.
    fn for_each_row(
        &self,
        table: &str,
        visit: &mut dyn FnMut(&Row) -> Result<()>,
    ) -> Result<u64>;

    /// Attempt to insert `row` into `table`.
    fn insert_row(&self, table: &str, row: &Row) -> Result<InsertOutcome>;

    /// Delete the rows of `table` selected by `filter`, returning how many went.
    fn delete_rows(&self, table: &str, filter: &RowFilter) -> Result<usize>;
}
