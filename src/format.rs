// ABOUTME: Element and attribute names shared by the exporter and importer
// ABOUTME: Changing any of these breaks compatibility with previously exported documents

/// Root element used by [`crate::export_database`] and [`crate::import_database`].
pub const DEFAULT_ROOT_TAG: &str = "database";

/// Element wrapping the rows of one table.
pub const TABLE_ELEMENT: &str = "table";

/// Required attribute of [`TABLE_ELEMENT`] naming the table.
pub const TABLE_NAME_ATTRIBUTE: &str = "table_name";

/// Element holding one row, one attribute per column.
pub const ROW_ELEMENT: &str = "row";

/// Column used to find the existing row when an insert conflicts under
/// [`crate::ReplaceStrategy::ReplaceExisting`].
pub const DEFAULT_ID_COLUMN: &str = "_id";

/// Tables never picked up by discovery (compared lowercased).
pub const RESERVED_TABLES: [&str; 2] = ["android_metadata", "sqlite_sequence"];

/// Returns true if `table` is one of [`RESERVED_TABLES`].
pub fn is_reserved_table(table: &str) -> bool {
    let lowered = table.to_lowercase();
    RESERVED_TABLES.iter().any(|reserved| *reserved == lowered)
}
