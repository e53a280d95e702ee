//! Lexer for the filter languages
//!
//! Tokenizes attribute and inheritance expressions into a stream for the parsers.
//! Both languages share one token set; function names (`any`, `all`, `eq`) stay
//! plain words and are recognised by the parsers when followed by `(`.

use chumsky::prelude::*;
use std::ops::Range;

use crate::error::{QueryError, SyntaxError};

/// Token types shared by the attribute and inheritance languages
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    // Keywords
    And,
    Or,
    Not,

    // Values
    Word(String),
    Quoted(String),

    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,
    Gt,     // >
    Lt,     // <
    Ge,     // >=
    Le,     // <=
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Word(s) => write!(f, "{}", s),
            Token::Quoted(s) => write!(f, "'{}'", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Gt => write!(f, ">"),
            Token::Lt => write!(f, "<"),
            Token::Ge => write!(f, ">="),
            Token::Le => write!(f, "<="),
        }
    }
}

/// Type alias for spans (character offsets into the query text)
pub type Span = Range<usize>;

/// Characters that may start a bare word
pub fn is_word_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '+')
}

/// Characters that may continue a bare word (effect types such as `5'UTR` carry a quote)
pub fn is_word_char(c: char) -> bool {
    is_word_start(c) || c == '\''
}

/// Create a lexer for filter expressions
pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let word = filter(|c: &char| is_word_start(*c))
        .chain(filter(|c: &char| is_word_char(*c)).repeated())
        .collect::<String>()
        .map(|s| match s.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Word(s),
        });

    let single_quoted = just('\'')
        .ignore_then(filter(|c: &char| *c != '\'').repeated())
        .then_ignore(just('\''))
        .collect::<String>();
    let double_quoted = just('"')
        .ignore_then(filter(|c: &char| *c != '"').repeated())
        .then_ignore(just('"'))
        .collect::<String>();
    let quoted = single_quoted.or(double_quoted).map(Token::Quoted);

    // `>=`/`<=` must be tried before the single-character operators
    let punctuation = choice((
        just(">=").to(Token::Ge),
        just("<=").to(Token::Le),
        just('>').to(Token::Gt),
        just('<').to(Token::Lt),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
    ));

    choice((quoted, punctuation, word))
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

/// Tokenize a query, reporting every lexical error with its span
pub fn tokenize(input: &str) -> Result<Vec<(Token, Span)>, QueryError> {
    lexer().parse(input).map_err(|errs| {
        QueryError::syntax(input, errs.iter().map(SyntaxError::from_lexer).collect())
    })
}

// Unit tests live in tests/unit_parsing.rs
