// ABOUTME: Row element codec: one flat row mapping as one XML element
// ABOUTME: Each column becomes an attribute holding the text rendering of its value

use crate::database::Row;
use crate::error::Result;
use crate::format::ROW_ELEMENT;
use base64::Engine;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use rusqlite::types::Value;
use std::borrow::Cow;
use std::io::Write;

/// Render a scalar as attribute text.
///
/// - INTEGER → decimal text
/// - REAL → shortest text that reads back as the same number, always with a
///   fraction or exponent (`3.0`, `0.1`, `1e100`)
/// - TEXT → unchanged (the writer escapes it)
/// - BLOB → standard base64
/// - NULL → `None`; the attribute is left out
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(format!("{:?}", f)),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

/// Escape attribute text, including the whitespace characters a parser
/// would otherwise normalize to spaces.
pub fn escape_attribute(text: &str) -> String {
    let escaped = quick_xml::escape::escape(text);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped.into_owned();
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for ch in escaped.chars() {
        match ch {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
    out
}

/// Attribute `key="text"` with `text` escaped by [`escape_attribute`].
pub fn escaped_attribute<'k>(key: &'k str, text: &str) -> Attribute<'k> {
    Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escape_attribute(text).into_bytes()),
    }
}

/// Write `row` as one empty `row` element.
pub fn write_row<W: Write>(writer: &mut Writer<W>, row: &Row) -> Result<()> {
    let mut element = BytesStart::new(ROW_ELEMENT);
    for (column, value) in row.iter() {
        if let Some(text) = value_to_text(value) {
            element.push_attribute(escaped_attribute(column, &text));
        }
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

/// Read the attributes of a row start tag into a [`Row`] of text values.
///
/// Attribute values are unescaped. Type conversion is left to the database.
pub fn read_row(start: &BytesStart<'_>) -> Result<Row> {
    let mut row = Row::new();
    for attr in start.attributes() {
        let attr = attr?;
        let column = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        row.insert(column, Value::Text(value));
    }
    Ok(row)
}
