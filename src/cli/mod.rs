//! CLI support for runql
//!
//! Provides programmatic access to the `runql` commands so other tools can
//! embed them.

mod check;
mod docs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};

use std::io;

use thiserror::Error;

use crate::error::{ConfigurationError, SyntaxError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No query provided. Pass it as an argument or pipe it to stdin.")]
    NoQuery,

    #[error("Unknown category: '{0}'\nRun 'runql docs' to see available categories.")]
    UnknownCategory(String),
}

impl CliError {
    /// Two-line excerpt pointing at the offending part of the query, for
    /// syntax errors.
    pub fn pointer(&self) -> Option<String> {
        let CliError::Syntax(error) = self else {
            return None;
        };
        let prefix = error.statement.get(..error.offset)?;
        Some(format!(
            "  {}\n  {}^",
            error.statement,
            " ".repeat(prefix.chars().count())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_marks_offset() {
        let error = CliError::from(crate::parse("run.name = 'x'").unwrap_err());
        assert_eq!(error.pointer().unwrap(), "  run.name = 'x'\n           ^");
    }

    #[test]
    fn test_no_pointer_for_other_errors() {
        assert!(CliError::NoQuery.pointer().is_none());
    }
}
