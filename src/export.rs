// ABOUTME: Streams database tables into an XML document, one row at a time
// ABOUTME: Writes <root><table table_name=".."><row .../></table></root>

use crate::codec;
use crate::database::Database;
use crate::error::Result;
use crate::format::{TABLE_ELEMENT, TABLE_NAME_ATTRIBUTE};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Write;

/// Totals for one export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub tables: usize,
    pub rows: u64,
}

/// Writes the rows of a list of tables to an XML sink.
///
/// Rows go straight from the database cursor to the writer; at most one row
/// is held in memory. The database is only read.
pub struct Exporter<'a, D: Database + ?Sized> {
    db: &'a D,
    root_tag: &'a str,
}

impl<'a, D: Database + ?Sized> Exporter<'a, D> {
    pub fn new(db: &'a D, root_tag: &'a str) -> Self {
        Self { db, root_tag }
    }

    /// Export `tables` in order and flush the sink.
    ///
    /// Any read or write failure aborts the export; whatever was already
    /// written stays in the sink.
    pub fn export<W: Write>(&self, tables: &[String], writer: &mut Writer<W>) -> Result<ExportStats> {
        tracing::debug!(
            "Exporting {} tables under <{}>",
            tables.len(),
            self.root_tag
        );

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(self.root_tag)))?;

        let mut stats = ExportStats::default();
        for table in tables {
            let rows = self.export_table(table, writer)?;
            tracing::info!("Exported {} rows from table '{}'", rows, table);
            stats.tables += 1;
            stats.rows += rows;
        }

        writer.write_event(Event::End(BytesEnd::new(self.root_tag)))?;
        writer.get_mut().flush()?;

        tracing::debug!(
            "Export finished: {} rows in {} tables",
            stats.rows,
            stats.tables
        );
        Ok(stats)
    }

    fn export_table<W: Write>(&self, table: &str, writer: &mut Writer<W>) -> Result<u64> {
        let mut start = BytesStart::new(TABLE_ELEMENT);
        start.push_attribute(codec::escaped_attribute(TABLE_NAME_ATTRIBUTE, table));
        writer.write_event(Event::Start(start))?;

        let rows = self
            .db
            .for_each_row(table, &mut |row| codec::write_row(writer, row))?;

        writer.write_event(Event::End(BytesEnd::new(TABLE_ELEMENT)))?;
        Ok(rows)
    }
}
