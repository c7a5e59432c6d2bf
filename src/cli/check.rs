//! Compile runql filters from the command line

use std::path::PathBuf;

use serde_json::Value;

use super::CliError;
use crate::{QueryCompiler, QueryConfig, SelectBuilder, load_config, parse};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The filter to compile
    pub query: String,
    /// TOML configuration file
    pub config: Option<PathBuf>,
    /// Dialect overriding the configuration
    pub dialect: Option<String>,
    /// Also render a complete `SELECT` over the runs table
    pub select: bool,
    /// Only validate syntax, don't resolve attributes
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Compiled query as JSON
    Success(Value),
}

/// Execute a runql check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        parse(&options.query)?;
        return Ok(CheckResult::SyntaxValid);
    }

    let mut config = match &options.config {
        Some(path) => load_config(path)?,
        None => QueryConfig::default(),
    };
    if let Some(dialect) = &options.dialect {
        config.dialect = dialect.clone();
    }

    let compiler = QueryCompiler::new(config)?;
    let compiled = compiler.compile(&options.query)?;
    let mut output = serde_json::to_value(&compiled)?;

    if options.select {
        let runs = compiler
            .config()
            .tables
            .get("runs")
            .map_or("runs", String::as_str);
        let mut select = SelectBuilder::new(compiler.dialect(), runs).column("run_uuid");
        compiled.filter(&mut select);
        let (sql, params) = select.build();

        if let Value::Object(fields) = &mut output {
            fields.insert("sql".to_string(), Value::String(sql));
            fields.insert("params".to_string(), serde_json::to_value(params)?);
        }
    }

    Ok(CheckResult::Success(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(query: &str, dialect: &str) -> Result<CheckResult, CliError> {
        execute_check(&CheckOptions {
            query: query.to_string(),
            dialect: Some(dialect.to_string()),
            select: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_select_statement_uses_dialect_placeholders() {
        let CheckResult::Success(output) = check("run.name == 'a'", "postgres").unwrap() else {
            panic!("expected compiled output");
        };
        assert_eq!(
            output["sql"],
            r#"SELECT "run_uuid" FROM "runs" WHERE "runs"."name" = $1 AND "runs"."lifecycle_stage" <> $2"#
        );
        assert_eq!(output["params"], serde_json::json!(["a", "deleted"]));
        assert_eq!(output["metric_selected"], false);
    }

    #[test]
    fn test_syntax_only_skips_resolution() {
        let options = CheckOptions {
            query: "run.unknown == 1".to_string(),
            syntax_only: true,
            ..Default::default()
        };
        assert!(matches!(execute_check(&options), Ok(CheckResult::SyntaxValid)));
        assert!(matches!(
            check("run.unknown == 1", "sqlite"),
            Err(CliError::Syntax(_))
        ));
    }

    #[test]
    fn test_unknown_dialect() {
        assert!(matches!(check("", "oracle"), Err(CliError::Config(_))));
    }
}
