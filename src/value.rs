use serde::Serialize;

use crate::ast::Literal;

/// A bound SQL parameter.
///
/// Integers and floats stay distinct so that `-1` binds as an integer and
/// `-1.0` as a float, matching what the user typed.
///
/// # Examples
///
/// ```
/// use runql::SqlValue;
///
/// let key = SqlValue::from("my_metric");
/// let threshold = SqlValue::Integer(-1);
/// assert_eq!(key.as_str(), Some("my_metric"));
/// assert_ne!(threshold, SqlValue::Float(-1.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL
    Null,

    Boolean(bool),

    Integer(i64),

    Float(f64),

    /// UTF-8 text
    String(String),
}

impl SqlValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Literal> for SqlValue {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::String(s) => SqlValue::String(s.clone()),
            Literal::Integer(n) => SqlValue::Integer(*n),
            Literal::Float(n) => SqlValue::Float(*n),
            Literal::Boolean(b) => SqlValue::Boolean(*b),
            Literal::None => SqlValue::Null,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Integer(n)
    }
}

impl From<f64> for SqlValue {
    fn from(n: f64) -> Self {
        SqlValue::Float(n)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Boolean(b)
    }
}
