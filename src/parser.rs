//! Parser for the attribute language
//!
//! Parses token streams into a concrete parse tree ([`Syntax`]). The tree keeps the
//! surface forms (`any(...)`, `> 3`, bare values) so the transform step can decide
//! how each production becomes an AST node.
//!
//! ```text
//! expr     := or_chain
//! or_chain := and_chain ("or" and_chain)*
//! and_chain:= molecule ("and" molecule)*
//! molecule := "not" molecule | funccall | atom
//! funccall := "any(" args ")" | "all(" args ")" | "eq(" args ")"
//! atom     := "(" or_chain ")" | cmp | arg
//! cmp      := (">" | "<" | ">=" | "<=") number
//! ```

use chumsky::prelude::*;

use crate::error::{QueryError, SyntaxError};
use crate::lexer::{tokenize, Token};

/// Comparison operator as written
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
        }
    }
}

/// Concrete parse tree of an attribute query
#[derive(Clone, Debug, PartialEq)]
pub enum Syntax {
    /// `a or b or ...`, two or more operands
    Or(Vec<Syntax>),
    /// `a and b and ...`, two or more operands
    And(Vec<Syntax>),
    Not(Box<Syntax>),
    Any(Vec<String>),
    All(Vec<String>),
    Eq(Vec<String>),
    Compare(Comparison, f64),
    Value(String),
}

// ============================================================================
// Helpers
// ============================================================================

/// A bare or quoted literal
pub(crate) fn arg() -> impl Parser<Token, String, Error = Simple<Token>> + Clone {
    select! {
        Token::Word(w) => w,
        Token::Quoted(q) => q,
    }
}

/// A function name; these are ordinary words unless a `(` follows
pub(crate) fn function(name: &'static str) -> impl Parser<Token, (), Error = Simple<Token>> + Clone {
    filter(move |t: &Token| matches!(t, Token::Word(w) if w.eq_ignore_ascii_case(name)))
        .ignored()
        .labelled(name)
}

/// `( arg, arg, ... )` with at least one argument
pub(crate) fn arg_list<P>(item: P) -> impl Parser<Token, Vec<String>, Error = Simple<Token>> + Clone
where
    P: Parser<Token, String, Error = Simple<Token>> + Clone,
{
    item.separated_by(just(Token::Comma))
        .allow_trailing()
        .at_least(1)
        .delimited_by(just(Token::LParen), just(Token::RParen))
}

/// `item (sep item)*`, producing an n-ary node only when the separator occurs.
/// Parenthesised sub-chains stay nested.
pub(crate) fn chain<T, P>(
    item: P,
    sep: Token,
    build: fn(Vec<T>) -> T,
) -> impl Parser<Token, T, Error = Simple<Token>> + Clone
where
    P: Parser<Token, T, Error = Simple<Token>> + Clone,
{
    item.clone()
        .then(just(sep).ignore_then(item).repeated())
        .map(move |(first, rest)| {
            if rest.is_empty() {
                first
            } else {
                let mut items = Vec::with_capacity(rest.len() + 1);
                items.push(first);
                items.extend(rest);
                build(items)
            }
        })
}

fn number() -> impl Parser<Token, f64, Error = Simple<Token>> + Clone {
    select! { Token::Word(w) => w }.try_map(|w, span| match w.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(Simple::custom(span, format!("expected a number, found '{}'", w))),
    })
}

// ============================================================================
// Attribute language
// ============================================================================

/// Create a parser for a complete attribute query
pub fn attribute_parser() -> impl Parser<Token, Syntax, Error = Simple<Token>> + Clone {
    recursive(|expr| {
        let paren = expr.delimited_by(just(Token::LParen), just(Token::RParen));

        let op = select! {
            Token::Gt => Comparison::Gt,
            Token::Lt => Comparison::Lt,
            Token::Ge => Comparison::Ge,
            Token::Le => Comparison::Le,
        };
        let cmp = op.then(number()).map(|(op, n)| Syntax::Compare(op, n));

        let atom = choice((paren, cmp, arg().map(Syntax::Value)));

        let funccall = choice((
            function("any").ignore_then(arg_list(arg())).map(Syntax::Any),
            function("all").ignore_then(arg_list(arg())).map(Syntax::All),
            function("eq").ignore_then(arg_list(arg())).map(Syntax::Eq),
        ));

        let molecule = recursive(|molecule| {
            just(Token::Not)
                .ignore_then(molecule)
                .map(|m| Syntax::Not(Box::new(m)))
                .or(funccall)
                .or(atom)
        });

        let and_chain = chain(molecule, Token::And, Syntax::And);
        chain(and_chain, Token::Or, Syntax::Or)
    })
    .then_ignore(end())
}

/// Run a token parser over `input`, collecting every error with its character span
pub(crate) fn parse_with<O>(
    input: &str,
    parser: impl Parser<Token, O, Error = Simple<Token>>,
) -> Result<O, QueryError> {
    let tokens = tokenize(input)?;
    let len = input.chars().count();

    parser
        .parse(chumsky::Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errs| QueryError::syntax(input, errs.iter().map(SyntaxError::from_parser).collect()))
}

/// Parse an attribute query into its parse tree
pub fn parse(input: &str) -> Result<Syntax, QueryError> {
    parse_with(input, attribute_parser())
}

// Unit tests live in tests/unit_parsing.rs
