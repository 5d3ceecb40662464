// ABOUTME: Small SQL helpers shared by the SQLite reader and writer

/// Quote a SQLite identifier (table, column)
///
/// Escapes embedded quotes and wraps the identifier in double quotes, so names
/// taken from an XML document can never break out of the identifier position.
pub fn quote_ident(identifier: &str) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push('"');
    for ch in identifier.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
