// ABOUTME: Ordered set of table names a converter exports and imports
// ABOUTME: Falls back to discovering every user table when none were configured

use crate::database::Database;
use crate::error::Result;
use crate::format::is_reserved_table;

/// Table names in export order, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCatalog {
    names: Vec<String>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already present.
    pub fn add_table(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    /// Remove `name` if present, returning whether it was.
    ///
    /// Does not trigger discovery: on a catalog that was never resolved this
    /// is a no-op. Call [`TableCatalog::discover`] first to select every
    /// table except a few.
    pub fn remove_table(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|existing| existing != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    /// Configured names, without triggering discovery.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve the catalog against `db`.
    ///
    /// When no table was configured, every table listed by the database is
    /// added except the reserved metadata and sequence tables. The discovered
    /// names are kept, so later calls return the same list.
    pub fn resolve<D: Database + ?Sized>(&mut self, db: &D) -> Result<&[String]> {
        if self.names.is_empty() {
            self.discover(db)?;
        }
        Ok(&self.names)
    }

    /// Add every non-reserved table of `db` to the catalog.
    ///
    /// Useful before [`TableCatalog::remove_table`] to select all tables but a few.
    pub fn discover<D: Database + ?Sized>(&mut self, db: &D) -> Result<()> {
        let mut discovered = 0usize;
        for table in db.list_tables()? {
            if is_reserved_table(&table) {
                tracing::debug!("Skipping reserved table '{}'", table);
                continue;
            }
            if !self.contains(&table) {
                discovered += 1;
            }
            self.add_table(table);
        }

        tracing::info!("Discovered {} tables", discovered);
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for TableCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut catalog = TableCatalog::new();
        for name in iter {
            catalog.add_table(name);
        }
        catalog
    }
}
