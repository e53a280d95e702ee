//! Parse tree → AST
//!
//! Every literal passes through the injected [`TokenConverter`]; the first unknown
//! literal aborts the whole transform, so no partial tree escapes.

use crate::ast::QueryNode;
use crate::convert::TokenConverter;
use crate::error::QueryError;
use crate::parser::{parse, Comparison, Syntax};

pub struct Transformer<'c, C> {
    converter: &'c C,
}

impl<'c, C: TokenConverter> Transformer<'c, C> {
    pub fn new(converter: &'c C) -> Self {
        Transformer { converter }
    }

    pub fn transform(&self, syntax: &Syntax) -> Result<QueryNode<C::Value>, QueryError> {
        Ok(match syntax {
            Syntax::Or(items) => QueryNode::Or(self.transform_all(items)?),
            Syntax::And(items) => QueryNode::And(self.transform_all(items)?),
            Syntax::Not(inner) => QueryNode::not(self.transform(inner)?),
            Syntax::Any(args) => QueryNode::any_of(self.convert_all(args)?),
            Syntax::All(args) => QueryNode::all_of(self.convert_all(args)?),
            Syntax::Eq(args) => QueryNode::Equals(self.convert_all(args)?),
            Syntax::Value(token) => QueryNode::Contains(self.converter.convert(token)?),
            // `>` yields LessThan and `<` yields GreaterThan; backends read them that way
            Syntax::Compare(Comparison::Gt, n) => QueryNode::LessThan(*n),
            Syntax::Compare(Comparison::Lt, n) => QueryNode::GreaterThan(*n),
            Syntax::Compare(Comparison::Ge, n) => QueryNode::LessThanEq(*n),
            Syntax::Compare(Comparison::Le, n) => QueryNode::GreaterThanEq(*n),
        })
    }

    fn transform_all(&self, items: &[Syntax]) -> Result<Vec<QueryNode<C::Value>>, QueryError> {
        items.iter().map(|item| self.transform(item)).collect()
    }

    fn convert_all(&self, tokens: &[String]) -> Result<Vec<C::Value>, QueryError> {
        tokens.iter().map(|t| self.converter.convert(t)).collect()
    }
}

/// Parse `query` and convert its literals in one step
pub fn compile<C: TokenConverter>(query: &str, converter: &C) -> Result<QueryNode<C::Value>, QueryError> {
    let syntax = parse(query)?;
    Transformer::new(converter).transform(&syntax)
}
