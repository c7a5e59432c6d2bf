//! Attribute resolution and join allocation.
//!
//! Turns the parsed [`Expr`] into a [`Predicate`] tree whose leaves name
//! physical columns, and collects the joins those columns need. No SQL
//! operators are chosen here; that is the emitter's job.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    mem,
};

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    ast::{AttributePath, BoolOp, CmpOp, Expr, Function, Literal, Subscript},
    error::SyntaxError,
    schema::{self, AttributeKind, KeyValueTable},
    value::SqlValue,
};

/// A column after resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    /// `"table"."column"`
    Field { table: String, column: String },
    /// Computed expression over trusted identifiers
    Raw(String),
    /// Key inside a JSON document column
    Json {
        table: String,
        column: String,
        path: Vec<String>,
    },
}

impl ColumnRef {
    fn field(table: &str, column: &str) -> Self {
        ColumnRef::Field {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Annotated filter tree: every leaf is a typed test on a resolved column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op value`; a `Null` value only pairs with `=`/`<>`
    Compare {
        column: ColumnRef,
        op: CmpOp,
        value: SqlValue,
    },
    /// `column LIKE pattern`
    Like {
        column: ColumnRef,
        pattern: String,
        negated: bool,
    },
    /// `column IN (values)`
    In {
        column: ColumnRef,
        values: Vec<SqlValue>,
        negated: bool,
    },
    /// Regular expression match
    Regex {
        column: ColumnRef,
        pattern: String,
        negated: bool,
    },
    /// Test already decided at compile time
    Constant(bool),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// One join required by a compiled query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinSpec {
    /// Canonical identity; equal signatures share one join
    pub signature: String,
    pub table: String,
    pub alias: String,
    /// ON condition with `?` placeholders
    pub on_condition: String,
    pub params: Vec<SqlValue>,
    /// Context a metric context join selects, keyed by canonical context key
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl JoinSpec {
    /// Full join clause with `?` placeholders.
    pub fn sql(&self) -> String {
        format!(
            "LEFT JOIN {} {} ON {}",
            self.table, self.alias, self.on_condition
        )
    }
}

/// Index-addressed join storage, deduplicated by signature.
///
/// Entries are only ever appended.
#[derive(Debug, Default)]
pub struct JoinArena {
    joins: Vec<JoinSpec>,
    by_signature: HashMap<String, usize>,
}

impl JoinArena {
    /// Return the index of the join with `signature`, building it with the
    /// next free index if it does not exist yet.
    pub fn allocate(&mut self, signature: String, build: impl FnOnce(usize) -> JoinSpec) -> usize {
        if let Some(&index) = self.by_signature.get(&signature) {
            return index;
        }
        let index = self.joins.len();
        let mut join = build(index);
        join.signature = signature.clone();
        self.joins.push(join);
        self.by_signature.insert(signature, index);
        index
    }

    pub fn get(&self, index: usize) -> &JoinSpec {
        &self.joins[index]
    }

    pub fn into_joins(self) -> Vec<JoinSpec> {
        self.joins
    }
}

/// Equality tests on a context join's JSON document, one per context key.
fn context_filters(join: &JoinSpec) -> impl Iterator<Item = Predicate> + '_ {
    join.context.iter().map(|(key, value)| Predicate::Compare {
        column: ColumnRef::Json {
            table: join.alias.clone(),
            column: "json".to_string(),
            path: json_path(key),
        },
        op: CmpOp::Equal,
        value: SqlValue::from(value.as_str()),
    })
}

/// Output of the resolve pass.
#[derive(Debug)]
pub struct Resolution {
    /// `None` when the filter matches everything
    pub predicate: Option<Predicate>,
    /// Context tests that hold for the whole filter, in join order
    pub context_filters: Vec<Predicate>,
    pub joins: Vec<JoinSpec>,
    /// Whether any path resolved to a metric
    pub references_metric: bool,
}

enum Operand {
    Column(ColumnRef),
    /// Boolean attribute: true when `column = value`
    Flag { column: ColumnRef, value: SqlValue },
    /// Attribute with a value known at compile time
    Fixed(i64),
    Literal(Literal),
    List(Vec<Literal>),
}

pub struct Resolver<'a> {
    tables: &'a BTreeMap<String, String>,
    joins: JoinArena,
    references_metric: bool,
    /// Every enclosing boolean node is an `and`
    conjunctive: bool,
    /// Context joins whose tests move to the top level
    hoisted: BTreeSet<usize>,
    /// Context tests for the leaf being resolved
    guards: Vec<Predicate>,
}

impl<'a> Resolver<'a> {
    pub fn new(tables: &'a BTreeMap<String, String>) -> Self {
        Resolver {
            tables,
            joins: JoinArena::default(),
            references_metric: false,
            conjunctive: true,
            hoisted: BTreeSet::new(),
            guards: Vec::new(),
        }
    }

    pub fn resolve(mut self, root: Option<&Expr>) -> Result<Resolution, SyntaxError> {
        let predicate = root.map(|expr| self.predicate(expr)).transpose()?;
        let joins = &self.joins;
        let context_filters = self
            .hoisted
            .iter()
            .flat_map(|&index| context_filters(joins.get(index)))
            .collect();
        Ok(Resolution {
            predicate,
            context_filters,
            joins: self.joins.into_joins(),
            references_metric: self.references_metric,
        })
    }

    fn predicate(&mut self, expr: &Expr) -> Result<Predicate, SyntaxError> {
        match expr {
            Expr::Boolean { op, children } => {
                let outer = self.conjunctive;
                self.conjunctive = outer && *op == BoolOp::And;
                let mut resolved = Vec::with_capacity(children.len());
                for child in children {
                    resolved.push(self.predicate(child)?);
                }
                self.conjunctive = outer;
                Ok(match op {
                    BoolOp::And => Predicate::And(resolved),
                    BoolOp::Or => Predicate::Or(resolved),
                    BoolOp::Not => match resolved.pop() {
                        Some(child) if resolved.is_empty() => Predicate::Not(Box::new(child)),
                        _ => return Err(SyntaxError::parse(0, "'not' takes exactly one operand")),
                    },
                })
            }
            Expr::Comparison {
                left,
                op,
                right,
                offset,
            } => {
                let leaf = self.comparison(left, *op, right, *offset)?;
                Ok(self.guarded(leaf))
            }
            Expr::Call {
                function,
                args,
                offset,
            } => {
                let leaf = self.call(*function, args, *offset)?;
                Ok(self.guarded(leaf))
            }
            Expr::Attribute(path) => match self.attribute(path)? {
                Operand::Flag { column, value } => Ok(Predicate::Compare {
                    column,
                    op: CmpOp::Equal,
                    value,
                }),
                _ => Err(SyntaxError::parse(
                    path.offset,
                    format!("{} is not a condition; compare it with a value", path.dotted()),
                )),
            },
            Expr::Literal(_) | Expr::List(_) => Err(SyntaxError::parse(
                0,
                "a literal on its own is not a condition",
            )),
        }
    }

    /// Tie pending context tests to `leaf` so they share its boolean position.
    fn guarded(&mut self, leaf: Predicate) -> Predicate {
        if self.guards.is_empty() {
            return leaf;
        }
        let mut conjuncts = mem::take(&mut self.guards);
        conjuncts.push(leaf);
        Predicate::And(conjuncts)
    }

    fn operand(&mut self, expr: &Expr, offset: usize) -> Result<Operand, SyntaxError> {
        match expr {
            Expr::Literal(literal) => Ok(Operand::Literal(literal.clone())),
            Expr::List(items) => Ok(Operand::List(items.clone())),
            Expr::Attribute(path) => self.attribute(path),
            _ => Err(SyntaxError::parse(
                offset,
                "expected an attribute or a literal, found a condition",
            )),
        }
    }

    fn comparison(
        &mut self,
        left: &Expr,
        op: CmpOp,
        right: &Expr,
        offset: usize,
    ) -> Result<Predicate, SyntaxError> {
        let left = self.operand(left, offset)?;
        let right = self.operand(right, offset)?;

        match (left, right) {
            (Operand::Flag { column, value }, Operand::Literal(Literal::Boolean(expected)))
            | (Operand::Literal(Literal::Boolean(expected)), Operand::Flag { column, value }) => {
                let holds = match op {
                    CmpOp::Equal => expected,
                    CmpOp::NotEqual => !expected,
                    _ => {
                        return Err(SyntaxError::parse(
                            offset,
                            "boolean attributes only support == and !=",
                        ));
                    }
                };
                Ok(Predicate::Compare {
                    column,
                    op: if holds { CmpOp::Equal } else { CmpOp::NotEqual },
                    value,
                })
            }
            (Operand::Flag { .. }, _) | (_, Operand::Flag { .. }) => Err(SyntaxError::parse(
                offset,
                "boolean attributes can only be compared with True or False",
            )),
            (Operand::Fixed(fixed), Operand::Literal(literal)) => {
                constant_comparison(fixed, op, &literal, offset)
            }
            (Operand::Literal(literal), Operand::Fixed(fixed)) => match op.mirrored() {
                Some(mirrored) => constant_comparison(fixed, mirrored, &literal, offset),
                None => Err(SyntaxError::parse(offset, "unsupported comparison")),
            },
            (Operand::Column(column), Operand::Literal(literal)) => {
                column_comparison(column, op, &literal, offset)
            }
            (Operand::Literal(literal), Operand::Column(column)) => match op {
                CmpOp::In | CmpOp::NotIn => match literal {
                    Literal::String(needle) => Ok(Predicate::Like {
                        column,
                        pattern: format!("%{needle}%"),
                        negated: op == CmpOp::NotIn,
                    }),
                    _ => Err(SyntaxError::parse(
                        offset,
                        "left side of a substring 'in' must be a string",
                    )),
                },
                _ => match op.mirrored() {
                    Some(mirrored) => column_comparison(column, mirrored, &literal, offset),
                    None => Err(SyntaxError::parse(offset, "unsupported comparison")),
                },
            },
            (Operand::Column(column), Operand::List(items)) => match op {
                CmpOp::In | CmpOp::NotIn => Ok(Predicate::In {
                    column,
                    values: items.iter().map(SqlValue::from).collect(),
                    negated: op == CmpOp::NotIn,
                }),
                _ => Err(SyntaxError::parse(
                    offset,
                    "lists can only be used with 'in' and 'not in'",
                )),
            },
            _ => Err(SyntaxError::parse(
                offset,
                "unsupported comparison: compare an attribute with a literal",
            )),
        }
    }

    fn call(&mut self, function: Function, args: &[Expr], offset: usize) -> Result<Predicate, SyntaxError> {
        let [first, second] = args else {
            let message = match function {
                Function::StartsWith | Function::EndsWith => {
                    format!("`{}` takes exactly one argument", function.name())
                }
                Function::ReMatch | Function::ReSearch => {
                    format!("`{}` takes exactly two arguments", function.name())
                }
            };
            return Err(SyntaxError::parse(offset, message));
        };

        match function {
            Function::StartsWith | Function::EndsWith => {
                let column = self.column_operand(first, function, offset)?;
                let Expr::Literal(Literal::String(affix)) = second else {
                    return Err(SyntaxError::parse(
                        offset,
                        format!("`{}` argument must be a string", function.name()),
                    ));
                };
                let pattern = if function == Function::StartsWith {
                    format!("{affix}%")
                } else {
                    format!("%{affix}")
                };
                Ok(Predicate::Like {
                    column,
                    pattern,
                    negated: false,
                })
            }
            Function::ReMatch | Function::ReSearch => {
                let Expr::Literal(Literal::String(pattern)) = first else {
                    return Err(SyntaxError::parse(
                        offset,
                        format!("first argument of `{}` must be a string", function.name()),
                    ));
                };
                let column = self.column_operand(second, function, offset)?;
                let pattern = if function == Function::ReMatch {
                    format!("^{pattern}")
                } else {
                    pattern.clone()
                };
                Ok(Predicate::Regex {
                    column,
                    pattern,
                    negated: false,
                })
            }
        }
    }

    fn column_operand(&mut self, expr: &Expr, function: Function, offset: usize) -> Result<ColumnRef, SyntaxError> {
        match self.operand(expr, offset)? {
            Operand::Column(column) => Ok(column),
            _ => Err(SyntaxError::parse(
                offset,
                format!("`{}` needs a text attribute", function.name()),
            )),
        }
    }

    fn table(&self, key: &str) -> Option<&'a str> {
        let tables: &'a BTreeMap<String, String> = self.tables;
        tables.get(key).map(String::as_str)
    }

    fn attribute(&mut self, path: &AttributePath) -> Result<Operand, SyntaxError> {
        let offset = path.offset;
        let entity = schema::entity(&path.entity).ok_or_else(|| {
            SyntaxError::unknown_attribute(offset, format!("unknown entity {:?}", path.entity))
        })?;
        let table = self.table(entity.table_key).ok_or_else(|| {
            SyntaxError::unknown_attribute(
                offset,
                format!("{} attributes are not available in this search", entity.name),
            )
        })?;
        let attribute = entity.attribute(&path.field).ok_or_else(|| {
            SyntaxError::unknown_attribute(
                offset,
                format!("unknown attribute {}.{}", path.entity, path.field),
            )
        })?;

        if entity.name == "metric" {
            self.references_metric = true;
        }

        match attribute.kind {
            AttributeKind::Column(column) => {
                plain(path)?;
                Ok(Operand::Column(ColumnRef::field(table, column)))
            }
            AttributeKind::Flag { column, value } => {
                plain(path)?;
                Ok(Operand::Flag {
                    column: ColumnRef::field(table, column),
                    value: SqlValue::from(value),
                })
            }
            AttributeKind::Duration => {
                plain(path)?;
                Ok(Operand::Column(ColumnRef::Raw(format!(
                    "({table}.end_time - {table}.start_time) / 1000"
                ))))
            }
            AttributeKind::ExperimentName => {
                plain(path)?;
                let experiments = self.table("experiments").ok_or_else(|| {
                    SyntaxError::unknown_attribute(
                        offset,
                        "run.experiment is not available in this search",
                    )
                })?;
                Ok(Operand::Column(ColumnRef::field(experiments, "name")))
            }
            AttributeKind::MetricSeries => self.metric_series(path, table),
            AttributeKind::KeyValue(kind) => {
                let key = single_key(path)?;
                let signature = format!("{}:{key}", kind.table());
                let index = self.joins.allocate(signature, |index| {
                    key_value_join(kind, table, index, key)
                });
                Ok(Operand::Column(ColumnRef::field(&self.joins.get(index).alias, "value")))
            }
            AttributeKind::FirstStep => {
                plain(path)?;
                Ok(Operand::Fixed(schema::FIRST_STEP))
            }
            AttributeKind::Context => {
                let key = single_key(path)?;
                let contexts = self.table(schema::CONTEXTS_KEY).ok_or_else(|| {
                    SyntaxError::unknown_attribute(
                        offset,
                        "metric.context is not available in this search",
                    )
                })?;
                Ok(Operand::Column(ColumnRef::Json {
                    table: contexts.to_string(),
                    column: "json".to_string(),
                    path: json_path(schema::canonical_context_key(key)),
                }))
            }
        }
    }

    fn metric_series(&mut self, path: &AttributePath, runs: &str) -> Result<Operand, SyntaxError> {
        let offset = path.offset;
        let Some(Subscript { name, context }) = &path.subscript else {
            return Err(SyntaxError::unknown_attribute(
                offset,
                "run.metrics needs a metric name, as in run.metrics[\"loss\"].last",
            ));
        };
        let member = path.member.as_deref().unwrap_or_default();
        let member = schema::metric_member(member).ok_or_else(|| {
            SyntaxError::unknown_attribute(
                offset,
                format!("unsupported metric attribute {member:?}, expected last, last_step or first_step"),
            )
        })?;

        let context: BTreeMap<String, String> = context
            .iter()
            .flatten()
            .map(|(key, value)| (schema::canonical_context_key(key).to_string(), value.clone()))
            .collect();

        let metric_signature = if context.is_empty() {
            format!("metrics:{name}")
        } else {
            let document: serde_json::Map<String, JsonValue> = context
                .iter()
                .map(|(key, value)| (key.clone(), JsonValue::String(value.clone())))
                .collect();
            format!("metrics:{name}:{}", JsonValue::Object(document))
        };

        let metric = self.joins.allocate(metric_signature.clone(), |index| {
            let alias = format!("metrics_{index}");
            JoinSpec {
                signature: String::new(),
                table: schema::LATEST_METRICS_TABLE.to_string(),
                on_condition: format!(
                    "{runs}.run_uuid = {alias}.run_uuid AND {alias}.key = ?"
                ),
                alias,
                params: vec![SqlValue::from(name.as_str())],
                context: BTreeMap::new(),
            }
        });
        let metric_alias = self.joins.get(metric).alias.clone();

        if !context.is_empty() {
            let contexts = self.joins.allocate(format!("contexts:{metric_signature}"), |index| {
                let alias = format!("contexts_{index}");
                JoinSpec {
                    signature: String::new(),
                    table: schema::CONTEXTS_TABLE.to_string(),
                    on_condition: format!("{metric_alias}.context_id = {alias}.id"),
                    alias,
                    params: vec![],
                    context,
                }
            });
            if self.conjunctive {
                self.hoisted.insert(contexts);
            } else {
                self.guards.extend(context_filters(self.joins.get(contexts)));
            }
        }

        self.references_metric = true;
        match member {
            AttributeKind::Column(column) => Ok(Operand::Column(ColumnRef::field(&metric_alias, column))),
            _ => Ok(Operand::Fixed(schema::FIRST_STEP)),
        }
    }
}

fn column_comparison(
    column: ColumnRef,
    op: CmpOp,
    literal: &Literal,
    offset: usize,
) -> Result<Predicate, SyntaxError> {
    match (op, literal) {
        (CmpOp::In | CmpOp::NotIn, _) => Err(SyntaxError::parse(
            offset,
            "'in' with an attribute on the left needs a list on the right",
        )),
        (CmpOp::Equal | CmpOp::NotEqual, _) | (_, Literal::String(_) | Literal::Integer(_) | Literal::Float(_)) => {
            Ok(Predicate::Compare {
                column,
                op,
                value: SqlValue::from(literal),
            })
        }
        _ => Err(SyntaxError::parse(
            offset,
            "ordering comparisons need a string or number",
        )),
    }
}

/// Decide `fixed op literal` now; only numbers and `None` compare.
fn constant_comparison(
    fixed: i64,
    op: CmpOp,
    literal: &Literal,
    offset: usize,
) -> Result<Predicate, SyntaxError> {
    let ordering = match literal {
        Literal::Integer(n) => fixed.cmp(n),
        Literal::Float(x) => (fixed as f64).partial_cmp(x).ok_or_else(|| {
            SyntaxError::parse(offset, "cannot compare with NaN")
        })?,
        Literal::None => {
            return match op {
                CmpOp::Equal => Ok(Predicate::Constant(false)),
                CmpOp::NotEqual => Ok(Predicate::Constant(true)),
                _ => Err(SyntaxError::parse(offset, "None only supports == and !=")),
            };
        }
        _ => {
            return Err(SyntaxError::parse(
                offset,
                "step attributes can only be compared with numbers",
            ));
        }
    };
    let holds = match op {
        CmpOp::Equal => ordering.is_eq(),
        CmpOp::NotEqual => ordering.is_ne(),
        CmpOp::LessThan => ordering.is_lt(),
        CmpOp::LessEqual => ordering.is_le(),
        CmpOp::GreaterThan => ordering.is_gt(),
        CmpOp::GreaterEqual => ordering.is_ge(),
        CmpOp::In | CmpOp::NotIn => {
            return Err(SyntaxError::parse(
                offset,
                "lists can only be used with 'in' and 'not in'",
            ));
        }
    };
    Ok(Predicate::Constant(holds))
}

/// Reject a subscript or member on an attribute that takes neither.
fn plain(path: &AttributePath) -> Result<(), SyntaxError> {
    if path.subscript.is_some() {
        return Err(SyntaxError::malformed_subscript(
            path.offset,
            format!("{}.{} does not take a subscript", path.entity, path.field),
        ));
    }
    if let Some(member) = &path.member {
        return Err(SyntaxError::unknown_attribute(
            path.offset,
            format!("unknown attribute {}.{}.{member}", path.entity, path.field),
        ));
    }
    Ok(())
}

/// The key of `tags["key"]` / `tags.key` style paths.
fn single_key(path: &AttributePath) -> Result<&str, SyntaxError> {
    match (&path.subscript, &path.member) {
        (Some(Subscript { name, context: None }), None) => Ok(name),
        (Some(Subscript { context: Some(_), .. }), _) => Err(SyntaxError::malformed_subscript(
            path.offset,
            format!("{}.{} does not take a context", path.entity, path.field),
        )),
        (None, Some(member)) => Ok(member),
        (Some(_), Some(member)) => Err(SyntaxError::unknown_attribute(
            path.offset,
            format!("unknown attribute {}.{}[...].{member}", path.entity, path.field),
        )),
        (None, None) => Err(SyntaxError::unknown_attribute(
            path.offset,
            format!(
                "{0}.{1} needs a key, as in {0}.{1}[\"name\"]",
                path.entity, path.field
            ),
        )),
    }
}

fn json_path(key: &str) -> Vec<String> {
    key.split('.').map(str::to_string).collect()
}

fn key_value_join(kind: KeyValueTable, runs: &str, index: usize, key: &str) -> JoinSpec {
    let alias = format!("{}_{index}", kind.table());
    JoinSpec {
        signature: String::new(),
        table: kind.table().to_string(),
        on_condition: format!("{runs}.run_uuid = {alias}.run_uuid AND {alias}.key = ?"),
        alias,
        params: vec![SqlValue::from(key)],
        context: BTreeMap::new(),
    }
}
