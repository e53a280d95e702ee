//! SQL bitwise backend
//!
//! Leaves are bit values; every membership test becomes a masked test on an integer
//! column. Numeric comparisons have no bitwise meaning and are rejected.

use crate::ast::QueryNode;
use crate::attributes::Category;
use crate::backend::predicate::comparison_name;
use crate::dialect::Dialect;
use crate::error::QueryError;

pub struct BitwiseSqlCompiler<'d> {
    column: String,
    dialect: &'d Dialect,
}

impl<'d> BitwiseSqlCompiler<'d> {
    pub fn new(column: &str, dialect: &'d Dialect) -> Self {
        BitwiseSqlCompiler {
            column: dialect.quote_identifier(column),
            dialect,
        }
    }

    pub fn compile(&self, node: &QueryNode<u64>) -> Result<String, QueryError> {
        Ok(match node {
            QueryNode::And(children) => self.reduce(children, "AND")?,
            QueryNode::Or(children) => self.reduce(children, "OR")?,
            QueryNode::Not(child) => format!("(NOT ({}))", self.compile(child)?),
            QueryNode::Contains(bits) => self.any_bit(*bits),
            QueryNode::ElementOf(values) if values.is_empty() => {
                format!("{} IS NULL", self.column)
            }
            QueryNode::ElementOf(values) => self.any_bit(mask(values)),
            QueryNode::Equals(values) => format!("({} = {})", self.column, mask(values)),
            cmp => {
                return Err(QueryError::unsupported(
                    "bitwise SQL",
                    format!("comparison {}", comparison_name(cmp)),
                ))
            }
        })
    }

    pub fn compile_categories<C: Category>(&self, node: &QueryNode<C>) -> Result<String, QueryError> {
        self.compile(&node.clone().map_values(&mut |c: C| c.bits()))
    }

    fn any_bit(&self, bits: u64) -> String {
        format!("({} != 0)", self.dialect.bit_and(&self.column, &bits.to_string()))
    }

    /// Left fold: `a`, `b`, `c` → `((a) AND (b)) AND (c)`
    fn reduce(&self, children: &[QueryNode<u64>], keyword: &str) -> Result<String, QueryError> {
        let mut parts = children.iter().map(|c| self.compile(c));
        let first = match parts.next() {
            Some(first) => first?,
            None => return Err(QueryError::InvalidFilter(format!("empty {keyword} expression"))),
        };
        parts.try_fold(first, |acc, next| -> Result<String, QueryError> {
            Ok(format!("({acc}) {keyword} ({})", next?))
        })
    }
}

fn mask(values: &[u64]) -> u64 {
    values.iter().fold(0u64, |acc, v| acc | *v)
}
