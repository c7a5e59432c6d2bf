use crate::{
    dialect::{Dialect, quote_identifier},
    value::SqlValue,
};

/// The parts of a SQL query builder a compiled filter needs.
///
/// Both methods receive SQL with `?` placeholders and the values bound to
/// them, in order.
pub trait QueryBuilder {
    fn join(&mut self, clause: &str, params: &[SqlValue]);

    fn and_where(&mut self, condition: &str, params: &[SqlValue]);
}

#[derive(Debug, Clone)]
struct Clause {
    sql: String,
    params: Vec<SqlValue>,
}

/// Minimal `SELECT` builder rendering a complete statement.
///
/// # Examples
///
/// ```
/// use runql::{QueryCompiler, QueryConfig, SelectBuilder};
///
/// let compiler = QueryCompiler::new(QueryConfig::new("postgres")).unwrap();
/// let query = compiler.compile("run.active").unwrap();
///
/// let mut select = SelectBuilder::new(compiler.dialect(), "runs").column("run_uuid");
/// query.filter(&mut select);
/// let (sql, params) = select.build();
/// assert_eq!(
///     sql,
///     r#"SELECT "run_uuid" FROM "runs" WHERE "runs"."status" = $1 AND "runs"."lifecycle_stage" <> $2"#
/// );
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    dialect: &'static dyn Dialect,
    table: String,
    columns: Vec<String>,
    joins: Vec<Clause>,
    conditions: Vec<Clause>,
}

impl SelectBuilder {
    pub fn new(dialect: &'static dyn Dialect, table: impl Into<String>) -> Self {
        SelectBuilder {
            dialect,
            table: table.into(),
            columns: vec![],
            joins: vec![],
            conditions: vec![],
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Render the statement with dialect placeholders and its parameters.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|column| quote_identifier(column))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", quote_identifier(&self.table));
        let mut params = Vec::new();

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.sql);
            params.extend(join.params.iter().cloned());
        }

        if !self.conditions.is_empty() {
            let wrap = self.conditions.len() > 1;
            let conditions: Vec<String> = self
                .conditions
                .iter()
                .map(|condition| {
                    params.extend(condition.params.iter().cloned());
                    if wrap {
                        format!("({})", condition.sql)
                    } else {
                        condition.sql.clone()
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        (number_placeholders(&sql, self.dialect), params)
    }
}

impl QueryBuilder for SelectBuilder {
    fn join(&mut self, clause: &str, params: &[SqlValue]) {
        self.joins.push(Clause {
            sql: clause.to_string(),
            params: params.to_vec(),
        });
    }

    fn and_where(&mut self, condition: &str, params: &[SqlValue]) {
        self.conditions.push(Clause {
            sql: condition.to_string(),
            params: params.to_vec(),
        });
    }
}

/// Replace each `?` outside string literals with the dialect placeholder.
pub fn number_placeholders(sql: &str, dialect: &dyn Dialect) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut index = 0;
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                index += 1;
                out.push_str(&dialect.placeholder(index));
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{POSTGRES, SQLITE};

    #[test]
    fn test_placeholders_skip_literals() {
        let sql = "IFNULL(a, '?') REGEXP ? AND b = ?";
        assert_eq!(
            number_placeholders(sql, &POSTGRES),
            "IFNULL(a, '?') REGEXP $1 AND b = $2"
        );
        assert_eq!(number_placeholders(sql, &SQLITE), sql);
    }

    #[test]
    fn test_multiple_conditions_are_wrapped() {
        let mut select = SelectBuilder::new(&POSTGRES, "runs");
        select.and_where("a = ? OR b = ?", &[1i64.into(), 2i64.into()]);
        select.and_where("c = ?", &[3i64.into()]);
        let (sql, params) = select.build();
        assert_eq!(
            sql,
            r#"SELECT * FROM "runs" WHERE (a = $1 OR b = $2) AND (c = $3)"#
        );
        assert_eq!(params, vec![SqlValue::Integer(1), SqlValue::Integer(2), SqlValue::Integer(3)]);
    }
}
