//! Identifier validation and quoting shared by all dialects.
//!
//! SQL identifiers (table, column and index names) cannot be bound as
//! parameters, so DDL has to embed them. Every dialect quotes through
//! [`quote_with`], which escapes the closing quote character and leaves
//! already-quoted names alone so that quoting twice never produces `""x""`.

use crate::error::{MigrateError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier supplied through configuration.
///
/// Rejects empty names, names containing null bytes, and names longer than
/// the cross-database limit.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Whether `name` is already wrapped in the `open`/`close` pair.
pub fn is_quoted(name: &str, open: char, close: char) -> bool {
    name.len() >= 2 && name.starts_with(open) && name.ends_with(close)
}

/// Wrap `name` in `open`/`close`, doubling embedded `close` characters.
///
/// Case is preserved. A name that is already quoted is returned unchanged.
pub fn quote_with(name: &str, open: char, close: char) -> String {
    if is_quoted(name, open, close) {
        return name.to_string();
    }
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push(open);
    for ch in name.chars() {
        if ch == close {
            escaped.push(close);
        }
        escaped.push(ch);
    }
    escaped.push(close);
    escaped
}

/// Single-quoted string literal with embedded quotes doubled.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("migration_log").is_ok());
        assert!(validate_identifier("MixedCase").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let err = validate_identifier("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let err = validate_identifier("log\0; DROP TABLE x").unwrap_err();
        assert!(err.to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long).is_err());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
    }

    #[test]
    fn test_quote_with_escapes_close_char() {
        assert_eq!(quote_with("users", '"', '"'), "\"users\"");
        assert_eq!(quote_with("table\"name", '"', '"'), "\"table\"\"name\"");
        assert_eq!(quote_with("table`name", '`', '`'), "`table``name`");
        assert_eq!(quote_with("table]name", '[', ']'), "[table]]name]");
    }

    #[test]
    fn test_quote_with_is_idempotent() {
        let once = quote_with("User", '"', '"');
        assert_eq!(quote_with(&once, '"', '"'), once);
        let once = quote_with("dbo", '[', ']');
        assert_eq!(quote_with(&once, '[', ']'), "[dbo]");
    }

    #[test]
    fn test_quote_with_injection_is_contained() {
        let quoted = quote_with("x\"; DROP TABLE users; --", '"', '"');
        assert_eq!(quoted, "\"x\"\"; DROP TABLE users; --\"");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("it's"), "'it''s'");
    }
}
