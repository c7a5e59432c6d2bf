use serde::Serialize;
use tracing::debug;

use crate::{
    ast::Expr,
    builder::QueryBuilder,
    config::QueryConfig,
    dialect::{self, Dialect},
    emitter::Emitter,
    error::{ConfigurationError, SyntaxError},
    parser,
    resolver::{JoinSpec, Resolver},
    value::SqlValue,
};

/// Compiles filter strings into SQL fragments for one dialect and table map.
///
/// Immutable once built; share it across threads and call
/// [`compile`](QueryCompiler::compile) concurrently.
///
/// # Examples
///
/// ```
/// use runql::{QueryCompiler, QueryConfig};
///
/// let compiler = QueryCompiler::new(QueryConfig::new("postgres")).unwrap();
/// let query = compiler.compile("run.name == 'bert'").unwrap();
/// assert_eq!(
///     query.where_sql(),
///     Some(r#""runs"."name" = ? AND "runs"."lifecycle_stage" <> ?"#)
/// );
/// ```
#[derive(Debug)]
pub struct QueryCompiler {
    config: QueryConfig,
    dialect: &'static dyn Dialect,
    default_expression: Option<Expr>,
}

impl QueryCompiler {
    pub fn new(config: QueryConfig) -> Result<Self, ConfigurationError> {
        let dialect = dialect::from_name(&config.dialect)?;
        config.validate_tables()?;

        let default_expression = parser::parse(&config.default.expression)
            .map_err(ConfigurationError::InvalidDefaultExpression)?;
        Resolver::new(&config.tables)
            .resolve(default_expression.as_ref())
            .map_err(|e| {
                ConfigurationError::InvalidDefaultExpression(e.in_statement(&config.default.expression))
            })?;

        debug!(
            dialect = dialect.name(),
            tables = ?config.tables,
            default = %config.default.expression,
            "query compiler configured"
        );

        Ok(QueryCompiler {
            config,
            dialect,
            default_expression,
        })
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Configured timezone offset, carried for callers that format dates.
    pub fn timezone_offset_minutes(&self) -> i32 {
        self.config.timezone_offset_minutes
    }

    pub fn compile(&self, query: &str) -> Result<CompiledQuery, SyntaxError> {
        let root = parser::parse(query)?;
        let root = self.with_default(query, root);

        let resolution = Resolver::new(&self.config.tables)
            .resolve(root.as_ref())
            .map_err(|e| e.in_statement(query))?;

        let (where_sql, where_params) = match Emitter::new(self.dialect)
            .where_clause(&resolution.context_filters, resolution.predicate.as_ref())
        {
            Some(fragment) => (Some(fragment.sql), fragment.params),
            None => (None, vec![]),
        };

        Ok(CompiledQuery {
            joins: resolution.joins,
            where_sql,
            where_params,
            metric_selected: resolution.references_metric,
        })
    }

    /// AND the default filter onto `root` unless the raw text mentions it.
    fn with_default(&self, query: &str, root: Option<Expr>) -> Option<Expr> {
        let Some(default) = &self.default_expression else {
            return root;
        };
        if query.contains(self.config.default.contains.as_str()) {
            return root;
        }
        match root {
            Some(root) => Some(Expr::and(vec![root, default.clone()])),
            None => Some(default.clone()),
        }
    }
}

/// Joins, WHERE text and parameters for one compiled filter.
///
/// SQL uses `?` placeholders; [`SelectBuilder`](crate::SelectBuilder)
/// renumbers them for the dialect. Parameters are ordered join parameters
/// first, then WHERE parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    joins: Vec<JoinSpec>,
    #[serde(rename = "where")]
    where_sql: Option<String>,
    where_params: Vec<SqlValue>,
    metric_selected: bool,
}

impl CompiledQuery {
    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    /// `None` when the filter matches every row.
    pub fn where_sql(&self) -> Option<&str> {
        self.where_sql.as_deref()
    }

    pub fn where_params(&self) -> &[SqlValue] {
        &self.where_params
    }

    /// Every bound value in placeholder order.
    pub fn params(&self) -> Vec<SqlValue> {
        self.joins
            .iter()
            .flat_map(|join| join.params.iter())
            .chain(&self.where_params)
            .cloned()
            .collect()
    }

    pub fn is_metric_selected(&self) -> bool {
        self.metric_selected
    }

    /// Apply the joins, then the WHERE clause, to `builder`.
    pub fn filter<'b, B: QueryBuilder + ?Sized>(&self, builder: &'b mut B) -> &'b mut B {
        for join in &self.joins {
            builder.join(&join.sql(), &join.params);
        }
        if let Some(sql) = &self.where_sql {
            builder.and_where(sql, &self.where_params);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryCompiler>();
        assert_send_sync::<CompiledQuery>();
    }

    #[test]
    fn test_empty_default_disables_injection() {
        let compiler = QueryCompiler::new(QueryConfig::default().with_default("", "")).unwrap();
        let query = compiler.compile("").unwrap();
        assert_eq!(query.where_sql(), None);
        assert!(query.params().is_empty());
    }

    #[test]
    fn test_invalid_default_expression() {
        let config = QueryConfig::default().with_default("run.archived", "run.bogus == 1");
        let err = QueryCompiler::new(config).unwrap_err();
        match err {
            ConfigurationError::InvalidDefaultExpression(source) => {
                assert_eq!(source.statement, "run.bogus == 1");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
