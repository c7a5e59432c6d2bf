use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Category of a user-facing query error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// Unterminated string literal or illegal character
    Tokenize,
    /// Grammar violation: unbalanced parens, unexpected token, unsupported operand shape
    Parse,
    /// Entity prefix, field or member not recognized
    UnknownAttribute,
    /// Subscript without a leading metric name, or with its elements reversed
    MalformedSubscript,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntaxErrorKind::Tokenize => "tokenize",
            SyntaxErrorKind::Parse => "parse",
            SyntaxErrorKind::UnknownAttribute => "unknown attribute",
            SyntaxErrorKind::MalformedSubscript => "malformed subscript",
        };
        f.write_str(name)
    }
}

/// Error returned for a query the user typed wrong.
///
/// The same input always produces the same error, independent of dialect.
/// Callers map it to a 4xx response with [`SyntaxError::status_code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error at offset {offset} in {statement:?}: {message}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// The raw query the error was found in
    pub statement: String,
    /// Byte offset of the offending fragment within `statement`
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, offset: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            kind,
            statement: String::new(),
            offset,
            message: message.into(),
        }
    }

    pub fn tokenize(offset: usize, message: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::Tokenize, offset, message)
    }

    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::Parse, offset, message)
    }

    pub fn unknown_attribute(offset: usize, message: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::UnknownAttribute, offset, message)
    }

    pub fn malformed_subscript(offset: usize, message: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::MalformedSubscript, offset, message)
    }

    /// Attach the raw query text the error refers to.
    pub fn in_statement(mut self, statement: &str) -> Self {
        self.statement = statement.to_string();
        self
    }

    /// The part of the statement starting at the error offset.
    pub fn fragment(&self) -> &str {
        self.statement.get(self.offset..).unwrap_or_default()
    }

    /// HTTP status a request handler should answer with.
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Errors raised while building a compiler from configuration.
///
/// These are programming or deployment mistakes, never request-scoped.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unsupported dialect {0:?} (expected \"postgres\" or \"sqlite\")")]
    UnsupportedDialect(String),

    #[error("table map has no entry for required entity {0:?}")]
    MissingTable(&'static str),

    #[error("invalid table name {name:?} for entity {entity:?}")]
    InvalidTableName { entity: String, name: String },

    #[error("default expression does not compile: {0}")]
    InvalidDefaultExpression(#[source] SyntaxError),

    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}
