//! SQL dialect strategies.
//!
//! A compiler holds one `&'static dyn Dialect` chosen at construction; the
//! emitter asks it for every engine-specific spelling.

use std::fmt;

use crate::error::ConfigurationError;

pub mod postgres;
pub mod sqlite;

pub use postgres::Postgres;
pub use sqlite::Sqlite;

pub trait Dialect: fmt::Debug + Send + Sync {
    /// Canonical configuration name
    fn name(&self) -> &'static str;

    fn like_operator(&self, negated: bool) -> &'static str {
        if negated { "NOT LIKE" } else { "LIKE" }
    }

    /// Left side of a regex match for `column`
    fn regex_target(&self, column: &str) -> String;

    fn regex_operator(&self, negated: bool) -> &'static str;

    /// JSON document expression for `column`
    fn json_target(&self, column: &str) -> String;

    /// Operator extracting a text value at a bound path
    fn json_extract_operator(&self) -> &'static str;

    /// Bound path parameter addressing `keys` inside a JSON document
    fn json_path(&self, keys: &[String]) -> String;

    /// Placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;
}

pub static POSTGRES: Postgres = Postgres;
pub static SQLITE: Sqlite = Sqlite;

/// Look up a dialect by configuration name, case-insensitively.
pub fn from_name(name: &str) -> Result<&'static dyn Dialect, ConfigurationError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(&POSTGRES),
        "sqlite" | "sqlite3" => Ok(&SQLITE),
        _ => Err(ConfigurationError::UnsupportedDialect(name.to_string())),
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(from_name("postgres").unwrap().name(), "postgres");
        assert_eq!(from_name("SQLite3").unwrap().name(), "sqlite");
        assert!(matches!(
            from_name("mysql"),
            Err(ConfigurationError::UnsupportedDialect(name)) if name == "mysql"
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("runs"), "\"runs\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
