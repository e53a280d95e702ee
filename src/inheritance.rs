//! Inheritance bitmask language
//!
//! A smaller sibling of the attribute language whose literals are the fixed
//! [`Inheritance`] flags. It compiles straight to bit tests on one integer column:
//!
//! ```text
//! expr     := and_chain ("or" and_chain)*
//! and_chain:= molecule ("and" molecule)*
//! molecule := "not" literal | "any(" literals ")" | "all(" literals ")" | literal
//! ```
//!
//! `any(...)`/`all(...)` merge their flags into one shared mask test, while an
//! `and`/`or` chain keeps one test per literal.

use std::fmt;

use chumsky::prelude::*;

use crate::attributes::{Category, Inheritance};
use crate::dialect::Dialect;
use crate::error::QueryError;
use crate::lexer::Token;
use crate::parser::{arg, arg_list, chain, function, parse_with};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InheritanceExpr<L = Inheritance> {
    Flag(L),
    NotFlag(L),
    Any(Vec<L>),
    All(Vec<L>),
    And(Vec<InheritanceExpr<L>>),
    Or(Vec<InheritanceExpr<L>>),
}

/// Parser for the inheritance language; literals stay unresolved strings
pub fn inheritance_parser() -> impl Parser<Token, InheritanceExpr<String>, Error = Simple<Token>> + Clone {
    let molecule = choice((
        just(Token::Not).ignore_then(arg()).map(InheritanceExpr::NotFlag),
        function("any").ignore_then(arg_list(arg())).map(InheritanceExpr::Any),
        function("all").ignore_then(arg_list(arg())).map(InheritanceExpr::All),
        arg().map(InheritanceExpr::Flag),
    ));

    let and_chain = chain(molecule, Token::And, InheritanceExpr::And);
    chain(and_chain, Token::Or, InheritanceExpr::Or).then_ignore(end())
}

impl InheritanceExpr<String> {
    /// Resolve every literal to its flag, failing on the first unknown name
    pub fn resolve(&self) -> Result<InheritanceExpr, QueryError> {
        fn flag(name: &str) -> Result<Inheritance, QueryError> {
            Inheritance::from_name(name).ok_or_else(|| QueryError::conversion(Inheritance::KIND, name))
        }
        fn flags(names: &[String]) -> Result<Vec<Inheritance>, QueryError> {
            names.iter().map(|n| flag(n)).collect()
        }
        fn all(items: &[InheritanceExpr<String>]) -> Result<Vec<InheritanceExpr>, QueryError> {
            items.iter().map(|i| i.resolve()).collect()
        }

        Ok(match self {
            InheritanceExpr::Flag(name) => InheritanceExpr::Flag(flag(name)?),
            InheritanceExpr::NotFlag(name) => InheritanceExpr::NotFlag(flag(name)?),
            InheritanceExpr::Any(names) => InheritanceExpr::Any(flags(names)?),
            InheritanceExpr::All(names) => InheritanceExpr::All(flags(names)?),
            InheritanceExpr::And(items) => InheritanceExpr::And(all(items)?),
            InheritanceExpr::Or(items) => InheritanceExpr::Or(all(items)?),
        })
    }
}

impl InheritanceExpr {
    /// Bit-test SQL against `column`
    pub fn to_sql(&self, column: &str, dialect: &Dialect) -> String {
        let col = dialect.quote_identifier(column);
        self.render(&col, dialect)
    }

    fn render(&self, col: &str, dialect: &Dialect) -> String {
        match self {
            InheritanceExpr::Flag(f) => format!("({} != 0)", dialect.bit_and(col, &f.bits().to_string())),
            InheritanceExpr::NotFlag(f) => {
                format!("(NOT (({} != 0)))", dialect.bit_and(col, &f.bits().to_string()))
            }
            InheritanceExpr::Any(flags) => {
                let mask = Inheritance::mask_of(flags).to_string();
                format!("({} != 0)", dialect.bit_and(&mask, col))
            }
            InheritanceExpr::All(flags) => {
                let mask = Inheritance::mask_of(flags).to_string();
                format!("({} = {})", dialect.bit_and(&mask, col), mask)
            }
            InheritanceExpr::And(items) => Self::reduce(items, "AND", col, dialect),
            InheritanceExpr::Or(items) => Self::reduce(items, "OR", col, dialect),
        }
    }

    fn reduce(items: &[InheritanceExpr], keyword: &str, col: &str, dialect: &Dialect) -> String {
        let mut parts = items.iter().map(|item| item.render(col, dialect));
        let first = parts.next().unwrap_or_default();
        parts.fold(first, |acc, next| format!("({acc}) {keyword} ({next})"))
    }

    /// Evaluate against the inheritance bits of one family member
    pub fn matches(&self, bits: u64) -> bool {
        match self {
            InheritanceExpr::Flag(f) => bits & f.bits() != 0,
            InheritanceExpr::NotFlag(f) => bits & f.bits() == 0,
            InheritanceExpr::Any(flags) => bits & Inheritance::mask_of(flags) != 0,
            InheritanceExpr::All(flags) => {
                let mask = Inheritance::mask_of(flags);
                bits & mask == mask
            }
            InheritanceExpr::And(items) => items.iter().all(|i| i.matches(bits)),
            InheritanceExpr::Or(items) => items.iter().any(|i| i.matches(bits)),
        }
    }
}

impl<L: fmt::Display> fmt::Display for InheritanceExpr<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<L: fmt::Display>(items: &[L]) -> String {
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        }
        fn joined<L: fmt::Display>(items: &[InheritanceExpr<L>], sep: &str) -> String {
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(sep)
        }

        match self {
            InheritanceExpr::Flag(l) => write!(f, "{l}"),
            InheritanceExpr::NotFlag(l) => write!(f, "not {l}"),
            InheritanceExpr::Any(ls) => write!(f, "any({})", list(ls)),
            InheritanceExpr::All(ls) => write!(f, "all({})", list(ls)),
            InheritanceExpr::And(items) => write!(f, "{}", joined(items, " and ")),
            InheritanceExpr::Or(items) => write!(f, "{}", joined(items, " or ")),
        }
    }
}

/// Parse and resolve an inheritance query
pub fn parse_inheritance(query: &str) -> Result<InheritanceExpr, QueryError> {
    parse_with(query, inheritance_parser())?.resolve()
}

/// Parse an inheritance query and render it as a bit test on `column`
pub fn inheritance_sql(query: &str, column: &str, dialect: &Dialect) -> Result<String, QueryError> {
    Ok(parse_inheritance(query)?.to_sql(column, dialect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_chain_matches_single_flags() {
        let expr = parse_inheritance("mendelian and not denovo").unwrap();
        assert!(expr.matches(Inheritance::Mendelian.bits()));
        assert!(!expr.matches(Inheritance::Denovo.bits()));
        assert!(!expr.matches(Inheritance::Mendelian.bits() | Inheritance::Denovo.bits()));
    }
}
