// ABOUTME: Row inserts and deletes against SQLite tables
// ABOUTME: Reports key and uniqueness violations as conflicts; other failures are errors

use crate::database::{InsertOutcome, Row, RowFilter};
use crate::error::{ConvertError, Result};
use crate::sqlite::reader::ColumnInfo;
use crate::utils::quote_ident;
use base64::Engine;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};

// Extended result codes from sqlite3.h for identity violations.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
const SQLITE_CONSTRAINT_ROWID: i32 = 2579;

/// Insert one row into `table`, whose schema is `columns`.
///
/// Text values are restored per column affinity (see [`restore_value`]) and
/// schema columns missing from `row` are bound to NULL, since exported
/// documents leave out exactly the NULL columns.
///
/// A PRIMARY KEY, UNIQUE or rowid violation is returned as
/// [`InsertOutcome::Conflict`]. Any other constraint failure (NOT NULL,
/// CHECK, FOREIGN KEY) is an integrity error, and every other failure is a
/// database error.
pub fn insert_row(
    conn: &Connection,
    table: &str,
    row: &Row,
    columns: &[ColumnInfo],
) -> Result<InsertOutcome> {
    let row = bound_row(row, columns);
    let query = build_insert_query(table, &row);

    let mut stmt = conn.prepare_cached(&query)?;
    match stmt.execute(params_from_iter(row.iter().map(|(_, value)| value))) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, message))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            let reason = message.unwrap_or_else(|| err.to_string());
            if is_identity_violation(err.extended_code) {
                tracing::debug!("Insert into '{}' conflicted: {}", table, reason);
                Ok(InsertOutcome::Conflict(reason))
            } else {
                Err(ConvertError::integrity(table, reason))
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete the rows of `table` selected by `filter`.
pub fn delete_rows(conn: &Connection, table: &str, filter: &RowFilter) -> Result<usize> {
    let deleted = match filter {
        RowFilter::All => conn.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?,
        RowFilter::ColumnEquals { column, value } => conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                quote_ident(table),
                quote_ident(column)
            ),
            [value],
        )?,
    };

    Ok(deleted)
}

fn is_identity_violation(extended_code: i32) -> bool {
    matches!(
        extended_code,
        SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_ROWID
    )
}

/// The row as it is bound: restored values in document order, then NULL for
/// every schema column the document left out. Column names compare
/// case-insensitively, as in SQLite.
fn bound_row(row: &Row, columns: &[ColumnInfo]) -> Row {
    let find = |name: &str| {
        columns
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(name))
    };

    let mut bound = Row::with_capacity(columns.len().max(row.len()));
    for (column, value) in row.iter() {
        let value = match find(column) {
            Some(info) => restore_value(info, value),
            None => value.clone(),
        };
        bound.insert(column, value);
    }

    for info in columns {
        let present = bound
            .column_names()
            .any(|name| name.eq_ignore_ascii_case(&info.name));
        if !present {
            bound.insert(info.name.clone(), Value::Null);
        }
    }
    bound
}

fn build_insert_query(table: &str, row: &Row) -> String {
    if row.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
    }

    let columns: Vec<String> = row.column_names().map(quote_ident).collect();
    let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Turn attribute text back into the value it was exported from.
///
/// Only BLOB-affinity columns need help; SQLite converts decimal text itself
/// in INTEGER, REAL and NUMERIC columns. In untyped columns text written the
/// way the exporter writes a number becomes that number. Otherwise base64
/// text becomes a blob, and anything else stays text.
fn restore_value(info: &ColumnInfo, value: &Value) -> Value {
    let Value::Text(text) = value else {
        return value.clone();
    };
    if !info.has_blob_affinity() {
        return value.clone();
    }

    if info.is_untyped() {
        if let Some(number) = exported_number(text) {
            return number;
        }
    }

    match base64::engine::general_purpose::STANDARD.decode(text) {
        Ok(bytes) => Value::Blob(bytes),
        Err(_) => value.clone(),
    }
}

/// Parse `text` as a number only if the exporter renders that number as
/// exactly `text`, so "007" or "1.50" stay text.
fn exported_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        if int.to_string() == text {
            return Some(Value::Integer(int));
        }
    }
    if let Ok(real) = text.parse::<f64>() {
        let value = Value::Real(real);
        if crate::codec::value_to_text(&value).as_deref() == Some(text) {
            return Some(value);
        }
    }
    None
}
