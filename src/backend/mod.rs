//! AST backends
//!
//! Independent interpreters over [`QueryNode`](crate::ast::QueryNode):
//! - [`predicate`]: in-memory matching over value sets, scalars and bitmasks
//! - [`sql`]: SQL boolean expressions over scalar columns
//! - [`bitwise`]: SQL bit tests over integer bitmask columns

pub mod bitwise;
pub mod predicate;
pub mod sql;

pub use bitwise::BitwiseSqlCompiler;
pub use predicate::{BitmaskMatcher, Matcher, Subject};
pub use sql::{SqlCompiler, SqlLiteral, MAX_CHUNK};
