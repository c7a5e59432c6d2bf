//! Compiler configuration, constructed in code or loaded from TOML.
//!
//! ```toml
//! dialect = "sqlite"
//! timezone_offset_minutes = 0
//!
//! [default]
//! contains = "run.archived"
//! expression = "not run.archived"
//!
//! [tables]
//! runs = "runs"
//! experiments = "experiments"
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::error::ConfigurationError;

/// Filter ANDed into every query whose text lacks `contains`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultExpression {
    #[serde(default = "default_contains")]
    pub contains: String,
    /// Empty disables the default filter
    #[serde(default = "default_expression")]
    pub expression: String,
}

impl Default for DefaultExpression {
    fn default() -> Self {
        DefaultExpression {
            contains: default_contains(),
            expression: default_expression(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    #[serde(default)]
    pub default: DefaultExpression,

    /// Entity key (`runs`, `experiments`, `metrics`, `contexts`) to
    /// physical table name
    #[serde(default = "default_tables")]
    pub tables: BTreeMap<String, String>,

    /// Reserved for date helpers; carried through unchanged
    #[serde(default)]
    pub timezone_offset_minutes: i32,

    #[serde(default = "default_dialect")]
    pub dialect: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            default: DefaultExpression::default(),
            tables: default_tables(),
            timezone_offset_minutes: 0,
            dialect: default_dialect(),
        }
    }
}

impl QueryConfig {
    pub fn new(dialect: impl Into<String>) -> Self {
        QueryConfig {
            dialect: dialect.into(),
            ..Self::default()
        }
    }

    /// Replace the table map.
    pub fn with_tables<K, V>(mut self, tables: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tables = tables
            .into_iter()
            .map(|(key, name)| (key.into(), name.into()))
            .collect();
        self
    }

    pub fn with_default(mut self, contains: impl Into<String>, expression: impl Into<String>) -> Self {
        self.default = DefaultExpression {
            contains: contains.into(),
            expression: expression.into(),
        };
        self
    }

    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.timezone_offset_minutes = minutes;
        self
    }

    /// Table names are spliced into SQL, so only plain identifiers pass.
    pub fn validate_tables(&self) -> Result<(), ConfigurationError> {
        if !self.tables.contains_key("runs") {
            return Err(ConfigurationError::MissingTable("runs"));
        }
        for (entity, name) in &self.tables {
            if !is_identifier(name) {
                return Err(ConfigurationError::InvalidTableName {
                    entity: entity.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Parse a TOML configuration document.
pub fn parse_config(text: &str) -> Result<QueryConfig, ConfigurationError> {
    Ok(toml::from_str(text)?)
}

/// Read and parse a TOML configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<QueryConfig, ConfigurationError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_contains() -> String {
    "run.archived".to_string()
}

fn default_expression() -> String {
    "not run.archived".to_string()
}

fn default_dialect() -> String {
    "postgres".to_string()
}

fn default_tables() -> BTreeMap<String, String> {
    [
        ("runs", "runs"),
        ("experiments", "experiments"),
        ("metrics", "latest_metrics"),
        ("contexts", "contexts"),
    ]
    .into_iter()
    .map(|(key, name)| (key.to_string(), name.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, QueryConfig::default());
        assert_eq!(config.default.expression, "not run.archived");
        assert_eq!(config.tables["runs"], "runs");
    }

    #[test]
    fn test_partial_document() {
        let config = parse_config(
            r#"
            dialect = "sqlite"
            timezone_offset_minutes = -120

            [default]
            expression = ""

            [tables]
            runs = "runs"
            experiments = "Experiment"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, "sqlite");
        assert_eq!(config.timezone_offset_minutes, -120);
        assert_eq!(config.default.contains, "run.archived");
        assert!(config.default.expression.is_empty());
        assert_eq!(config.tables.len(), 2);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            parse_config("dialects = \"postgres\""),
            Err(ConfigurationError::Toml(_))
        ));
    }

    #[test]
    fn test_table_names_are_identifiers() {
        let config = QueryConfig::default().with_tables([("runs", "runs; DROP TABLE runs")]);
        assert!(matches!(
            config.validate_tables(),
            Err(ConfigurationError::InvalidTableName { .. })
        ));
        let config = QueryConfig::default().with_tables([("experiments", "experiments")]);
        assert!(matches!(
            config.validate_tables(),
            Err(ConfigurationError::MissingTable("runs"))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/runql.toml").unwrap_err();
        assert!(matches!(err, ConfigurationError::Read { .. }));
    }
}
