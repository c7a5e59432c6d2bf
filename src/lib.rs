pub mod ast;
pub mod builder;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod value;

pub use ast::{AttributePath, Expr, Literal, Subscript, Token};
pub use builder::{QueryBuilder, SelectBuilder};
pub use compiler::{CompiledQuery, QueryCompiler};
pub use config::{DefaultExpression, QueryConfig, load_config, parse_config};
pub use dialect::Dialect;
pub use error::{ConfigurationError, SyntaxError, SyntaxErrorKind};
pub use lexer::{Lexer, tokenize};
pub use parser::{Parser, parse};
pub use resolver::JoinSpec;
pub use value::SqlValue;
