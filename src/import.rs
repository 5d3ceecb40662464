// ABOUTME: Single-pass XML import: a tag-event state machine that commits rows as they close
// ABOUTME: Applies the replace strategy when an incoming row conflicts with an existing one

use crate::codec;
use crate::database::{Database, InsertOutcome, Row, RowFilter};
use crate::error::{ConvertError, Result};
use crate::format::{
    DEFAULT_ID_COLUMN, DEFAULT_ROOT_TAG, ROW_ELEMENT, TABLE_ELEMENT, TABLE_NAME_ATTRIBUTE,
};
use crate::strategy::ReplaceStrategy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// Counters for one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Table elements whose name is in the catalog.
    pub tables_imported: usize,
    /// Table elements skipped because their name is not in the catalog.
    pub tables_ignored: usize,
    pub rows_inserted: u64,
    /// Rows inserted after deleting a conflicting row with the same identifier.
    pub rows_replaced: u64,
    /// Conflicting rows dropped in favour of the existing row.
    pub rows_kept: u64,
    /// Rows read from ignored tables or from outside any table.
    pub rows_discarded: u64,
}

/// Observable position of the import state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    /// No table element is open.
    Idle,
    /// Inside a table element, between rows.
    InTable,
    /// A row has been read and not committed yet.
    InRow,
}

/// Where the rows of the open table element go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TableScope {
    Tracked(String),
    /// The table is not in the catalog; its rows are read and dropped.
    Untracked,
}

/// Consumer of events for one open element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Root,
    Table,
    Row,
    /// Element inside a row; ignored together with its children.
    Nested,
    /// Unrecognised element outside a row; its children are still dispatched.
    Other,
}

enum Commit {
    Inserted,
    Replaced,
    Kept,
    Discarded,
}

/// Event-driven handler that writes the rows of a database document.
///
/// Feed it start and end tags in document order through
/// [`ImportHandler::start_element`] and [`ImportHandler::end_element`], then
/// call [`ImportHandler::finish`]; or let [`ImportHandler::run`] pull them
/// from a `quick_xml` reader. At most one row is buffered at a time.
pub struct ImportHandler<'a, D: Database + ?Sized> {
    db: &'a D,
    catalog: &'a [String],
    strategy: ReplaceStrategy,
    id_column: &'a str,
    root_tag: &'a str,
    modes: Vec<Mode>,
    seen_root: bool,
    table: Option<TableScope>,
    pending: Option<Row>,
    table_rows_before: u64,
    stats: ImportStats,
}

impl<'a, D: Database + ?Sized> ImportHandler<'a, D> {
    /// Handler writing rows of the tables in `catalog` into `db`.
    pub fn new(db: &'a D, catalog: &'a [String], strategy: ReplaceStrategy) -> Self {
        Self {
            db,
            catalog,
            strategy,
            id_column: DEFAULT_ID_COLUMN,
            root_tag: DEFAULT_ROOT_TAG,
            modes: Vec::new(),
            seen_root: false,
            table: None,
            pending: None,
            table_rows_before: 0,
            stats: ImportStats::default(),
        }
    }

    /// Column matched when deleting the existing row under
    /// [`ReplaceStrategy::ReplaceExisting`].
    pub fn with_id_column(mut self, id_column: &'a str) -> Self {
        self.id_column = id_column;
        self
    }

    /// Expected name of the document element. A different name is accepted
    /// with a warning.
    pub fn with_root_tag(mut self, root_tag: &'a str) -> Self {
        self.root_tag = root_tag;
        self
    }

    pub fn state(&self) -> ImportState {
        if self.pending.is_some() {
            ImportState::InRow
        } else if self.table.is_some() {
            ImportState::InTable
        } else {
            ImportState::Idle
        }
    }

    pub fn stats(&self) -> &ImportStats {
        &self.stats
    }

    /// Drive the handler from a `quick_xml` reader until end of document.
    pub fn run<R: BufRead>(mut self, input: R) -> Result<ImportStats> {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::new();

        loop {
            let step = match reader.read_event_into(&mut buf) {
                Ok(Event::Start(start)) => self.start_element(&start),
                Ok(Event::Empty(start)) => self
                    .start_element(&start)
                    .and_then(|()| self.end_element()),
                Ok(Event::End(_)) => self.end_element(),
                Ok(Event::Eof) => break,
                Ok(_) => Ok(()),
                Err(err) => Err(err.into()),
            };

            if let Err(err) = step {
                tracing::warn!(
                    "Import aborted near byte {}: {}",
                    reader.buffer_position(),
                    err
                );
                return Err(err);
            }
            buf.clear();
        }

        self.finish()
    }

    /// Handle an element start tag.
    pub fn start_element(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if matches!(self.modes.last(), Some(Mode::Row | Mode::Nested)) {
            self.modes.push(Mode::Nested);
            return Ok(());
        }

        if self.modes.is_empty() {
            return self.start_root(start);
        }

        self.flush_pending()?;

        let name = start.name();
        if name.as_ref() == TABLE_ELEMENT.as_bytes() {
            self.start_table(start)?;
            self.modes.push(Mode::Table);
        } else if name.as_ref() == ROW_ELEMENT.as_bytes() {
            self.pending = Some(codec::read_row(start)?);
            self.modes.push(Mode::Row);
        } else {
            tracing::debug!(
                "Ignoring <{}> element",
                String::from_utf8_lossy(name.as_ref())
            );
            self.modes.push(Mode::Other);
        }
        Ok(())
    }

    /// Handle an element end tag. The tag name is not checked; the XML
    /// source is expected to reject mismatched end tags.
    pub fn end_element(&mut self) -> Result<()> {
        let mode = self
            .modes
            .pop()
            .ok_or_else(|| ConvertError::Malformed("end tag without open element".to_string()))?;

        match mode {
            Mode::Nested => {}
            Mode::Row | Mode::Other | Mode::Root => self.flush_pending()?,
            Mode::Table => {
                self.flush_pending()?;
                self.end_table();
            }
        }
        Ok(())
    }

    /// Treat end of document as a final boundary: commit any pending row,
    /// then require that every element was closed.
    pub fn finish(mut self) -> Result<ImportStats> {
        self.flush_pending()?;

        if !self.seen_root {
            return Err(ConvertError::Malformed("document has no root element".to_string()));
        }
        if !self.modes.is_empty() {
            return Err(ConvertError::Malformed(format!(
                "document ended with {} unclosed elements",
                self.modes.len()
            )));
        }

        tracing::info!(
            "Import finished: {} inserted, {} replaced, {} kept, {} discarded",
            self.stats.rows_inserted,
            self.stats.rows_replaced,
            self.stats.rows_kept,
            self.stats.rows_discarded
        );
        Ok(self.stats)
    }

    fn start_root(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if self.seen_root {
            return Err(ConvertError::Malformed(
                "more than one root element".to_string(),
            ));
        }
        if start.name().as_ref() != self.root_tag.as_bytes() {
            tracing::warn!(
                "Expected <{}> root element, found <{}>",
                self.root_tag,
                String::from_utf8_lossy(start.name().as_ref())
            );
        }
        self.seen_root = true;
        self.modes.push(Mode::Root);
        Ok(())
    }

    fn start_table(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if self.modes.contains(&Mode::Table) {
            return Err(ConvertError::Malformed(format!(
                "<{}> element nested inside another <{}>",
                TABLE_ELEMENT, TABLE_ELEMENT
            )));
        }

        let table = start
            .try_get_attribute(TABLE_NAME_ATTRIBUTE)?
            .ok_or(ConvertError::MissingAttribute {
                element: TABLE_ELEMENT,
                attribute: TABLE_NAME_ATTRIBUTE,
            })?
            .unescape_value()?
            .into_owned();

        if !self.catalog.contains(&table) {
            tracing::info!("Ignoring rows of table '{}' (not selected)", table);
            self.stats.tables_ignored += 1;
            self.table = Some(TableScope::Untracked);
            return Ok(());
        }

        if self.strategy == ReplaceStrategy::ReplaceAll {
            let deleted = self.db.delete_rows(&table, &RowFilter::All)?;
            tracing::info!("Cleared {} rows from table '{}'", deleted, table);
        }

        tracing::debug!("Importing table '{}' ({})", table, self.strategy);
        self.stats.tables_imported += 1;
        self.table_rows_before = self.committed_rows();
        self.table = Some(TableScope::Tracked(table));
        Ok(())
    }

    fn end_table(&mut self) {
        if let Some(TableScope::Tracked(table)) = self.table.take() {
            tracing::info!(
                "Imported {} rows into table '{}'",
                self.committed_rows() - self.table_rows_before,
                table
            );
        }
    }

    fn committed_rows(&self) -> u64 {
        self.stats.rows_inserted + self.stats.rows_replaced
    }

    /// Commit the pending row, if any. The row is gone afterwards whatever
    /// the outcome.
    fn flush_pending(&mut self) -> Result<()> {
        let Some(row) = self.pending.take() else {
            return Ok(());
        };

        match self.commit(&row)? {
            Commit::Inserted => self.stats.rows_inserted += 1,
            Commit::Replaced => self.stats.rows_replaced += 1,
            Commit::Kept => self.stats.rows_kept += 1,
            Commit::Discarded => self.stats.rows_discarded += 1,
        }
        Ok(())
    }

    fn commit(&self, row: &Row) -> Result<Commit> {
        let table = match &self.table {
            Some(TableScope::Tracked(table)) => table.as_str(),
            Some(TableScope::Untracked) | None => return Ok(Commit::Discarded),
        };

        let reason = match self.db.insert_row(table, row)? {
            InsertOutcome::Inserted => return Ok(Commit::Inserted),
            InsertOutcome::Conflict(reason) => reason,
        };

        match self.strategy {
            ReplaceStrategy::ReplaceAll => Err(ConvertError::integrity(
                table,
                format!("{} (after emptying table)", reason),
            )),
            ReplaceStrategy::ReplaceExisting => {
                self.replace_existing(table, row, &reason)?;
                Ok(Commit::Replaced)
            }
            ReplaceStrategy::ReplaceNone => {
                tracing::debug!("Keeping existing row in '{}': {}", table, reason);
                Ok(Commit::Kept)
            }
        }
    }

    fn replace_existing(&self, table: &str, row: &Row, reason: &str) -> Result<()> {
        let id = row.get(self.id_column).ok_or_else(|| {
            ConvertError::integrity(
                table,
                format!("{}; row has no '{}' column to replace by", reason, self.id_column),
            )
        })?;

        let filter = RowFilter::ColumnEquals {
            column: self.id_column.to_string(),
            value: id.clone(),
        };
        let deleted = self.db.delete_rows(table, &filter)?;
        tracing::debug!(
            "Deleted {} conflicting rows from '{}' before retrying insert",
            deleted,
            table
        );

        match self.db.insert_row(table, row)? {
            InsertOutcome::Inserted => Ok(()),
            InsertOutcome::Conflict(retry_reason) => Err(ConvertError::integrity(table, retry_reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDatabase;
    use crate::ErrorKind;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE notes (_id INTEGER PRIMARY KEY, body TEXT NOT NULL);
             INSERT INTO notes VALUES (1, 'old');",
        )
        .unwrap();
        conn
    }

    fn bodies(conn: &Connection) -> Vec<(i64, String)> {
        let mut stmt = conn.prepare("SELECT _id, body FROM notes ORDER BY _id").unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    fn catalog() -> Vec<String> {
        vec!["notes".to_string()]
    }

    fn table(name: &str) -> BytesStart<'static> {
        BytesStart::new("table").with_attributes([("table_name", name)])
    }

    fn row(id: &str, body: &str) -> BytesStart<'static> {
        BytesStart::new("row").with_attributes([("_id", id), ("body", body)])
    }

    #[test]
    fn test_state_transitions() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let mut handler = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting);

        assert_eq!(handler.state(), ImportState::Idle);
        handler.start_element(&BytesStart::new("database")).unwrap();
        assert_eq!(handler.state(), ImportState::Idle);
        handler.start_element(&table("notes")).unwrap();
        assert_eq!(handler.state(), ImportState::InTable);
        handler.start_element(&row("2", "new")).unwrap();
        assert_eq!(handler.state(), ImportState::InRow);
        assert!(bodies(&conn).len() == 1, "row is committed only at its boundary");
        handler.end_element().unwrap();
        assert_eq!(handler.state(), ImportState::InTable);
        assert_eq!(bodies(&conn).len(), 2);
        handler.end_element().unwrap();
        assert_eq!(handler.state(), ImportState::Idle);
        handler.end_element().unwrap();

        let stats = handler.finish().unwrap();
        assert_eq!(stats.rows_inserted, 1);
        assert_eq!(stats.tables_imported, 1);
    }

    #[test]
    fn test_nested_elements_inside_row_are_ignored() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let mut handler = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting);

        handler.start_element(&BytesStart::new("database")).unwrap();
        handler.start_element(&table("notes")).unwrap();
        handler.start_element(&row("2", "outer")).unwrap();
        // A nested row must neither flush nor replace the pending row.
        handler.start_element(&row("3", "inner")).unwrap();
        assert_eq!(handler.state(), ImportState::InRow);
        handler.end_element().unwrap();
        assert_eq!(handler.state(), ImportState::InRow);
        handler.end_element().unwrap();
        handler.end_element().unwrap();
        handler.end_element().unwrap();
        handler.finish().unwrap();

        assert_eq!(
            bodies(&conn),
            vec![(1, "old".to_string()), (2, "outer".to_string())]
        );
    }

    #[test]
    fn test_pending_row_flushed_at_end_of_document() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let mut handler = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting);

        handler.start_element(&BytesStart::new("database")).unwrap();
        handler.start_element(&table("notes")).unwrap();
        handler.start_element(&row("5", "last")).unwrap();

        let err = handler.finish().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Structure);
        assert!(bodies(&conn).contains(&(5, "last".to_string())));
    }

    #[test]
    fn test_run_replace_existing() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><table table_name="notes"><row _id="1" body="new"/><row _id="2" body="two"/></table></database>"#;

        let stats = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap();

        assert_eq!(stats.rows_replaced, 1);
        assert_eq!(stats.rows_inserted, 1);
        assert_eq!(
            bodies(&conn),
            vec![(1, "new".to_string()), (2, "two".to_string())]
        );
    }

    #[test]
    fn test_run_replace_none_keeps_existing() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><table table_name="notes"><row _id="1" body="new"/></table></database>"#;

        let stats = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceNone)
            .run(xml.as_bytes())
            .unwrap();

        assert_eq!(stats.rows_kept, 1);
        assert_eq!(bodies(&conn), vec![(1, "old".to_string())]);
    }

    #[test]
    fn test_run_replace_all_conflict_is_integrity_error() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><table table_name="notes"><row _id="7" body="a"/><row _id="7" body="b"/></table></database>"#;

        let err = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceAll)
            .run(xml.as_bytes())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(bodies(&conn), vec![(7, "a".to_string())]);
    }

    #[test]
    fn test_replace_existing_without_id_column_fails() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE tags (name TEXT PRIMARY KEY, color TEXT);
             INSERT INTO tags VALUES ('red', 'ff0000');",
        )
        .unwrap();
        let db = SqliteDatabase::new(&conn);
        let tables = vec!["tags".to_string()];
        let xml = r#"<database><table table_name="tags"><row name="red" color="f00"/></table></database>"#;

        let err = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);

        // With the natural key configured as identifier the row is replaced.
        let stats = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .with_id_column("name")
            .run(xml.as_bytes())
            .unwrap();
        assert_eq!(stats.rows_replaced, 1);
        let color: String = conn
            .query_row("SELECT color FROM tags WHERE name = 'red'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(color, "f00");
    }

    #[test]
    fn test_run_rows_outside_table_are_discarded() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><row _id="9" body="stray"/></database>"#;

        let stats = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap();

        assert_eq!(stats.rows_discarded, 1);
        assert_eq!(bodies(&conn).len(), 1);
    }

    #[test]
    fn test_run_unknown_wrapper_elements_are_transparent() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><meta version="2"/><group><table table_name="notes"><row _id="3" body="three"/></table></group></database>"#;

        ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap();

        assert!(bodies(&conn).contains(&(3, "three".to_string())));
    }

    #[test]
    fn test_run_nested_table_is_malformed() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><table table_name="notes"><table table_name="notes"></table></table></database>"#;

        let err = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Malformed(_)));
    }

    #[test]
    fn test_run_empty_document() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();

        let err = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run("".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Malformed(_)));
    }

    #[test]
    fn test_run_mismatched_end_tag() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<database><table table_name="notes"></row></database>"#;

        let err = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
    }

    #[test]
    fn test_run_other_root_name_is_accepted() {
        let conn = setup();
        let db = SqliteDatabase::new(&conn);
        let tables = catalog();
        let xml = r#"<backup><table table_name="notes"><row _id="4" body="four"/></table></backup>"#;

        let stats = ImportHandler::new(&db, &tables, ReplaceStrategy::ReplaceExisting)
            .run(xml.as_bytes())
            .unwrap();
        assert_eq!(stats.rows_inserted, 1);
    }
}
