//! varql: filter languages for a partitioned variant table
//!
//! Two small boolean languages compile from text through a parse tree into a shared
//! AST, and from there into interchangeable backends: an in-memory predicate, a SQL
//! boolean expression, or a SQL bitmask test. The [`builder`] module combines them
//! with partition-pruning heuristics into complete statements.

pub mod ast;
pub mod attributes;
pub mod backend;
pub mod builder;
pub mod catalog;
pub mod convert;
pub mod dialect;
pub mod error;
pub mod inheritance;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod region;
pub mod repl;
pub mod transform;

pub use ast::QueryNode;
pub use builder::{QueryBuilder, QueryFilters, QueryKind, RangeFilter};
pub use catalog::StudyCatalog;
pub use dialect::Dialect;
pub use error::QueryError;
pub use inheritance::{inheritance_sql, parse_inheritance, InheritanceExpr};
pub use parser::parse;
pub use pretty::pretty_print;
pub use region::Region;
pub use transform::compile;
