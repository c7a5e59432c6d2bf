//! # runql filter language - Abstract Syntax Tree
//!
//! The filter language is a restricted, Python-like boolean expression
//! language typed by users into a search box. This module defines its tokens
//! and syntax tree.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, attribute paths, comparisons, calls)
//! - **[operators]** - Comparison operators, boolean combinators and functions
//!
//! ## Quick Start
//!
//! ```text
//! run.name.startswith('bert') and run.metrics['loss'].last < 0.1
//! ```
//!
//! ## Core Concepts
//!
//! ### Attribute Paths
//!
//! Every attribute starts with an entity (`run`, `experiment`, `metric`),
//! followed by a field and optionally a subscript and a member:
//!
//! ```text
//! run.name
//! run.metrics["loss", {"subset": "train"}].last
//! run.tags["mlflow.runName"]
//! metric.context.subset
//! ```
//!
//! ### Precedence
//!
//! From tightest to loosest binding:
//!
//! 1. attribute access, subscripts and calls
//! 2. comparisons `== != < <= > >= in not in is is not`
//! 3. `not`
//! 4. `and`
//! 5. `or`
//!
//! So `not run.name == 'a' or run.active` reads as
//! `(not (run.name == 'a')) or run.active`.
//!
//! ## Examples
//!
//! ### Substring Match
//!
//! ```text
//! 'bert' in run.name
//! ```
//!
//! ### Regular Expressions
//!
//! ```text
//! not re.match('test_.*', run.name)
//! ```
//!
//! ### Metric With Context
//!
//! ```text
//! run.metrics["accuracy", {"subset": "val"}].last >= 0.9
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{AttributePath, Expr, Literal, Subscript};
pub use operators::{BoolOp, CmpOp, Function};
pub use tokens::Token;
