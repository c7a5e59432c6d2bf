//! Renders resolved predicates as parameterized SQL.
//!
//! Output uses `?` placeholders throughout; values are never inlined. The
//! only text taken from the query is in the parameter list.

use crate::{
    ast::CmpOp,
    dialect::{Dialect, quote_identifier},
    resolver::{ColumnRef, Predicate},
    value::SqlValue,
};

/// SQL text with its bound parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
    /// Top-level `AND`/`OR` that needs parentheses when nested
    compound: bool,
}

impl Fragment {
    fn leaf(sql: String, params: Vec<SqlValue>) -> Self {
        Fragment {
            sql,
            params,
            compound: false,
        }
    }

    fn nested(self) -> Self {
        if self.compound {
            Fragment::leaf(format!("({})", self.sql), self.params)
        } else {
            self
        }
    }

    fn join(parts: Vec<Fragment>, separator: &str) -> Self {
        let compound = parts.len() > 1;
        let mut sql = Vec::with_capacity(parts.len());
        let mut params = Vec::new();
        for part in parts {
            let part = if compound { part.nested() } else { part };
            sql.push(part.sql);
            params.extend(part.params);
        }
        Fragment {
            sql: sql.join(separator),
            params,
            compound,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    dialect: &'static dyn Dialect,
}

impl Emitter {
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        Emitter { dialect }
    }

    pub fn emit(&self, predicate: &Predicate) -> Fragment {
        self.predicate(predicate, false)
    }

    /// WHERE body for a compiled query: top-level context filters come
    /// first, then the main predicate. `None` when nothing filters.
    pub fn where_clause(&self, context_filters: &[Predicate], predicate: Option<&Predicate>) -> Option<Fragment> {
        let mut conjuncts: Vec<Fragment> = context_filters
            .iter()
            .map(|filter| self.predicate(filter, false))
            .collect();
        if let Some(predicate) = predicate {
            conjuncts.push(self.predicate(predicate, false));
        }

        match conjuncts.len() {
            0 => None,
            1 => conjuncts.pop(),
            _ => Some(Fragment::join(conjuncts, " AND ")),
        }
    }

    fn predicate(&self, predicate: &Predicate, negated: bool) -> Fragment {
        match predicate {
            Predicate::Compare { column, op, value } => {
                let op = if negated { op.negated() } else { *op };
                let column = self.column(column);
                match (value, op) {
                    (SqlValue::Null, CmpOp::Equal) => {
                        Fragment::leaf(format!("{} IS NULL", column.sql), column.params)
                    }
                    (SqlValue::Null, CmpOp::NotEqual) => {
                        Fragment::leaf(format!("{} IS NOT NULL", column.sql), column.params)
                    }
                    _ => {
                        let mut params = column.params;
                        params.push(value.clone());
                        Fragment::leaf(format!("{} {} ?", column.sql, op.sql()), params)
                    }
                }
            }
            Predicate::Like {
                column,
                pattern,
                negated: inverted,
            } => {
                let column = self.column(column);
                let mut params = column.params;
                params.push(SqlValue::from(pattern.as_str()));
                Fragment::leaf(
                    format!(
                        "{} {} ?",
                        column.sql,
                        self.dialect.like_operator(negated != *inverted)
                    ),
                    params,
                )
            }
            Predicate::In {
                column,
                values,
                negated: inverted,
            } => {
                let negated = negated != *inverted;
                if values.is_empty() {
                    // x IN () matches nothing, x NOT IN () everything
                    let sql = if negated { "1 = 1" } else { "1 = 0" };
                    return Fragment::leaf(sql.to_string(), vec![]);
                }
                let column = self.column(column);
                let mut params = column.params;
                params.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                let op = if negated { CmpOp::NotIn } else { CmpOp::In };
                Fragment::leaf(
                    format!("{} {} ({placeholders})", column.sql, op.sql()),
                    params,
                )
            }
            Predicate::Regex {
                column,
                pattern,
                negated: inverted,
            } => {
                let column = self.column(column);
                let mut params = column.params;
                params.push(SqlValue::from(pattern.as_str()));
                Fragment::leaf(
                    format!(
                        "{} {} ?",
                        self.dialect.regex_target(&column.sql),
                        self.dialect.regex_operator(negated != *inverted)
                    ),
                    params,
                )
            }
            Predicate::Constant(holds) => {
                let sql = if *holds != negated { "1 = 1" } else { "1 = 0" };
                Fragment::leaf(sql.to_string(), vec![])
            }
            Predicate::And(children) | Predicate::Or(children) => {
                let separator = if matches!(predicate, Predicate::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                let parts = children
                    .iter()
                    .map(|child| self.predicate(child, false))
                    .collect();
                let fragment = Fragment::join(parts, separator);
                if negated {
                    Fragment::leaf(format!("NOT ({})", fragment.sql), fragment.params)
                } else {
                    fragment
                }
            }
            Predicate::Not(child) => self.predicate(child, !negated),
        }
    }

    fn column(&self, column: &ColumnRef) -> Fragment {
        match column {
            ColumnRef::Field { table, column } => Fragment::leaf(
                format!("{}.{}", quote_identifier(table), quote_identifier(column)),
                vec![],
            ),
            ColumnRef::Raw(sql) => Fragment::leaf(sql.clone(), vec![]),
            ColumnRef::Json { table, column, path } => {
                let document = format!("{}.{}", quote_identifier(table), quote_identifier(column));
                Fragment::leaf(
                    format!(
                        "{}{}?",
                        self.dialect.json_target(&document),
                        self.dialect.json_extract_operator()
                    ),
                    vec![SqlValue::from(self.dialect.json_path(path))],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{POSTGRES, SQLITE};

    fn name() -> ColumnRef {
        ColumnRef::Field {
            table: "runs".to_string(),
            column: "name".to_string(),
        }
    }

    fn eq(value: &str) -> Predicate {
        Predicate::Compare {
            column: name(),
            op: CmpOp::Equal,
            value: SqlValue::from(value),
        }
    }

    #[test]
    fn test_not_flips_leaf_operator() {
        let fragment = Emitter::new(&POSTGRES).emit(&Predicate::Not(Box::new(eq("a"))));
        assert_eq!(fragment.sql, r#""runs"."name" <> ?"#);
    }

    #[test]
    fn test_not_over_and_keeps_parentheses() {
        let predicate = Predicate::Not(Box::new(Predicate::And(vec![eq("a"), eq("b")])));
        let fragment = Emitter::new(&POSTGRES).emit(&predicate);
        assert_eq!(fragment.sql, r#"NOT ("runs"."name" = ? AND "runs"."name" = ?)"#);
        assert_eq!(fragment.params.len(), 2);
    }

    #[test]
    fn test_nested_or_is_parenthesized() {
        let predicate = Predicate::And(vec![Predicate::Or(vec![eq("a"), eq("b")]), eq("c")]);
        let fragment = Emitter::new(&POSTGRES).emit(&predicate);
        assert_eq!(
            fragment.sql,
            r#"("runs"."name" = ? OR "runs"."name" = ?) AND "runs"."name" = ?"#
        );
    }

    #[test]
    fn test_none_renders_is_null() {
        let predicate = Predicate::Not(Box::new(Predicate::Compare {
            column: name(),
            op: CmpOp::Equal,
            value: SqlValue::Null,
        }));
        let fragment = Emitter::new(&SQLITE).emit(&predicate);
        assert_eq!(fragment.sql, r#""runs"."name" IS NOT NULL"#);
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn test_negated_regex() {
        let predicate = Predicate::Not(Box::new(Predicate::Regex {
            column: name(),
            pattern: "^x".to_string(),
            negated: false,
        }));
        assert_eq!(
            Emitter::new(&SQLITE).emit(&predicate).sql,
            r#"IFNULL("runs"."name", '') NOT REGEXP ?"#
        );
        assert_eq!(
            Emitter::new(&POSTGRES).emit(&predicate).sql,
            r#""runs"."name" !~ ?"#
        );
    }

    #[test]
    fn test_where_clause_puts_context_first() {
        let context = Predicate::Compare {
            column: ColumnRef::Json {
                table: "contexts_1".to_string(),
                column: "json".to_string(),
                path: vec!["subset".to_string()],
            },
            op: CmpOp::Equal,
            value: SqlValue::from("train"),
        };
        let predicate = Predicate::Or(vec![eq("a"), eq("b")]);
        let fragment = Emitter::new(&POSTGRES)
            .where_clause(&[context], Some(&predicate))
            .unwrap();
        assert_eq!(
            fragment.sql,
            r##""contexts_1"."json"#>>? = ? AND ("runs"."name" = ? OR "runs"."name" = ?)"##
        );
        assert_eq!(fragment.params[0], SqlValue::from("{subset}"));
        assert!(Emitter::new(&POSTGRES).where_clause(&[], None).is_none());
    }

    #[test]
    fn test_constant() {
        let emitter = Emitter::new(&SQLITE);
        assert_eq!(emitter.emit(&Predicate::Constant(true)).sql, "1 = 1");
        assert_eq!(
            emitter.emit(&Predicate::Not(Box::new(Predicate::Constant(true)))).sql,
            "1 = 0"
        );
    }

    #[test]
    fn test_empty_in_list() {
        let predicate = Predicate::In {
            column: name(),
            values: vec![],
            negated: false,
        };
        let emitter = Emitter::new(&POSTGRES);
        assert_eq!(emitter.emit(&predicate).sql, "1 = 0");
        assert_eq!(emitter.emit(&Predicate::Not(Box::new(predicate))).sql, "1 = 1");
    }
}
