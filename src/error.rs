// ABOUTME: Error types for SQLite/XML export and import
// ABOUTME: Separates document structure problems from database integrity failures

use thiserror::Error;

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The XML document is malformed or missing a required element/attribute.
    Structure,
    /// A row could not be committed after the replace strategy ran out of options.
    Integrity,
    /// The database engine reported a failure that is not a constraint conflict.
    Database,
    /// Reading the document or writing the output failed.
    Io,
}

/// Errors produced while exporting a database to XML or importing it back.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A required attribute is absent from an element.
    #[error("{attribute} not found in {element} element")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// The element structure does not describe a database.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The XML source could not be tokenized.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A row could not be inserted and the replace strategy cannot recover.
    #[error("failed to insert row in '{table}': {reason}")]
    Integrity { table: String, reason: String },

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::MissingAttribute { .. }
            | ConvertError::Malformed(_)
            | ConvertError::Xml(_) => ErrorKind::Structure,
            ConvertError::Integrity { .. } => ErrorKind::Integrity,
            ConvertError::Database(_) => ErrorKind::Database,
            ConvertError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn integrity(table: &str, reason: impl Into<String>) -> Self {
        ConvertError::Integrity {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for ConvertError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ConvertError::Xml(quick_xml::Error::InvalidAttr(err))
    }
}

/// Result type for export and import operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
