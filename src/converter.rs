// ABOUTME: Configured converter tying the table catalog, replace strategy and root tag together
// ABOUTME: Entry point for exporting a database to XML and importing it back

use crate::catalog::TableCatalog;
use crate::database::Database;
use crate::error::Result;
use crate::export::{ExportStats, Exporter};
use crate::format::{DEFAULT_ID_COLUMN, DEFAULT_ROOT_TAG};
use crate::import::{ImportHandler, ImportStats};
use crate::strategy::ReplaceStrategy;
use quick_xml::Writer;
use std::io::{BufRead, Write};

/// Saves or restores the contents of a database (or selected tables) as one
/// XML element.
///
/// Table names and column values must be representable as XML attribute
/// text. The database itself is passed to each call and never kept.
///
/// # Examples
///
/// ```no_run
/// # use sqlite_xml::{Converter, ReplaceStrategy, sqlite::{open_sqlite, SqliteDatabase}};
/// # fn example() -> sqlite_xml::Result<()> {
/// let conn = open_sqlite("contacts.db")?;
/// let db = SqliteDatabase::new(&conn);
///
/// let mut converter = Converter::new("contacts").with_replace_strategy(ReplaceStrategy::ReplaceNone);
/// converter.add_table("people");
///
/// let mut xml = Vec::new();
/// converter.export_to(&db, &mut xml, true)?;
/// converter.import(&db, xml.as_slice())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    root_tag: String,
    catalog: TableCatalog,
    strategy: ReplaceStrategy,
    id_column: String,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_TAG)
    }
}

impl Converter {
    /// Converter using `root_tag` as the document element, with an empty
    /// catalog and [`ReplaceStrategy::ReplaceExisting`].
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            root_tag: root_tag.into(),
            catalog: TableCatalog::new(),
            strategy: ReplaceStrategy::default(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
        }
    }

    pub fn with_replace_strategy(mut self, strategy: ReplaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    pub fn replace_strategy(&self) -> ReplaceStrategy {
        self.strategy
    }

    pub fn set_replace_strategy(&mut self, strategy: ReplaceStrategy) {
        self.strategy = strategy;
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn add_table(&mut self, table: impl Into<String>) {
        self.catalog.add_table(table);
    }

    /// Drop `table` from the selection, returning whether it was selected.
    ///
    /// Tables are only discovered on first use, so on a fresh converter this
    /// removes nothing and the table is still exported. To select all tables
    /// but a few, call [`Converter::discover_tables`] first.
    pub fn remove_table(&mut self, table: &str) -> bool {
        if self.catalog.is_empty() {
            tracing::warn!(
                "Removing table '{}' before any table was selected or discovered has no effect",
                table
            );
        }
        self.catalog.remove_table(table)
    }

    /// Add every non-reserved table of `db`; see [`TableCatalog::discover`].
    pub fn discover_tables<D: Database + ?Sized>(&mut self, db: &D) -> Result<()> {
        self.catalog.discover(db)
    }

    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    /// Tables this converter exports and imports, discovering them on first
    /// use when none were added.
    pub fn table_names<D: Database + ?Sized>(&mut self, db: &D) -> Result<&[String]> {
        self.catalog.resolve(db)
    }

    /// Stream the selected tables of `db` into `writer` and flush it.
    pub fn export<D: Database + ?Sized, W: Write>(
        &mut self,
        db: &D,
        writer: &mut Writer<W>,
    ) -> Result<ExportStats> {
        let tables = self.catalog.resolve(db)?;
        Exporter::new(db, &self.root_tag).export(tables, writer)
    }

    /// Export into a plain byte sink, indented with two spaces when `pretty`.
    pub fn export_to<D: Database + ?Sized, W: Write>(
        &mut self,
        db: &D,
        output: W,
        pretty: bool,
    ) -> Result<ExportStats> {
        let mut writer = if pretty {
            Writer::new_with_indent(output, b' ', 2)
        } else {
            Writer::new(output)
        };
        self.export(db, &mut writer)
    }

    /// Read a document from `input` and write its rows into `db`.
    ///
    /// Rows are committed one at a time as they are read. On error, rows
    /// committed before the failing one stay in the database.
    pub fn import<D: Database + ?Sized, R: BufRead>(&mut self, db: &D, input: R) -> Result<ImportStats> {
        let tables = self.catalog.resolve(db)?;
        tracing::info!(
            "Importing into {} tables ({})",
            tables.len(),
            self.strategy
        );

        ImportHandler::new(db, tables, self.strategy)
            .with_id_column(&self.id_column)
            .with_root_tag(&self.root_tag)
            .run(input)
    }
}
