use std::collections::BTreeMap;

use crate::ast::{BoolOp, CmpOp, Function};

/// Literal constant appearing in a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// `None`
    None,
}

/// Subscript on an attribute path.
///
/// # Examples
/// ```text
/// run.metrics["loss"]                       // name only
/// run.metrics["loss", {"subset": "train"}]  // name and context
/// run.tags["mlflow.runName"]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Subscript {
    /// Metric key, tag key or param key
    pub name: String,
    /// Context filter, keys as written by the user
    pub context: Option<BTreeMap<String, String>>,
}

/// Dotted attribute reference.
///
/// `run.metrics["loss"].last` has entity `run`, field `metrics`, a subscript
/// and member `last`. `run.tags.foo` has member `foo` and no subscript.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub entity: String,
    pub field: String,
    pub subscript: Option<Subscript>,
    pub member: Option<String>,
    /// Byte offset of the entity name in the query
    pub offset: usize,
}

impl AttributePath {
    /// Dotted form of the path for error messages, without the subscript.
    pub fn dotted(&self) -> String {
        let mut path = format!("{}.{}", self.entity, self.field);
        if self.subscript.is_some() {
            path.push_str("[...]");
        }
        if let Some(member) = &self.member {
            path.push('.');
            path.push_str(member);
        }
        path
    }
}

/// Abstract Syntax Tree node representing a parsed filter.
///
/// Built once by the parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant
    ///
    /// # Example
    /// ```text
    /// 'run'
    /// -1.0
    /// ```
    Literal(Literal),

    /// List of literals, the right side of `attr in [...]`
    List(Vec<Literal>),

    /// Attribute reference
    Attribute(AttributePath),

    /// Binary comparison
    ///
    /// # Examples
    /// ```text
    /// run.name == 'run'
    /// 'run' in run.name
    /// run.metrics['loss'].last < 0.5
    /// ```
    Comparison {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
        offset: usize,
    },

    /// Boolean combinator; `and`/`or` are n-ary, `not` has one child
    Boolean { op: BoolOp, children: Vec<Expr> },

    /// Function or method call
    ///
    /// # Examples
    /// ```text
    /// run.name.startswith('tr')
    /// re.match('^run', run.name)
    /// ```
    Call {
        function: Function,
        args: Vec<Expr>,
        offset: usize,
    },
}

impl Expr {
    pub fn and(children: Vec<Expr>) -> Expr {
        Expr::Boolean {
            op: BoolOp::And,
            children,
        }
    }

    pub fn not(child: Expr) -> Expr {
        Expr::Boolean {
            op: BoolOp::Not,
            children: vec![child],
        }
    }
}
