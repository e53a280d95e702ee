//! Errors for the filter languages and the WHERE planner
//!
//! Syntax errors keep character spans so they can be rendered with ariadne.

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::error::SimpleReason;
use chumsky::prelude::Simple;
use thiserror::Error;

use crate::lexer::{Span, Token};

/// One problem found while lexing or parsing a query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("malformed query {query:?}: {}", first_message(.errors))]
    Syntax {
        query: String,
        errors: Vec<SyntaxError>,
    },

    /// A literal the token converter does not recognise
    #[error("unknown {kind} {token:?}")]
    Conversion { kind: &'static str, token: String },

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: String,
    },

    #[error("unknown study {0:?}")]
    UnknownStudy(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid region {0:?}")]
    InvalidRegion(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn first_message(errors: &[SyntaxError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

impl QueryError {
    pub fn syntax(query: &str, errors: Vec<SyntaxError>) -> Self {
        QueryError::Syntax {
            query: query.to_string(),
            errors,
        }
    }

    pub fn conversion(kind: &'static str, token: impl Into<String>) -> Self {
        QueryError::Conversion {
            kind,
            token: token.into(),
        }
    }

    pub fn unsupported(backend: &'static str, operation: impl Into<String>) -> Self {
        QueryError::Unsupported {
            backend,
            operation: operation.into(),
        }
    }

    /// Human-readable rendering; syntax errors get an annotated source excerpt
    pub fn render(&self) -> String {
        match self {
            QueryError::Syntax { query, errors } => format_syntax_errors(query, errors),
            other => other.to_string(),
        }
    }
}

impl SyntaxError {
    pub fn from_lexer(error: &Simple<char>) -> Self {
        let found = error
            .found()
            .map(|c| format!("'{}'", c))
            .unwrap_or_else(|| "end of input".to_string());

        let message = if error.expected().next().is_some() {
            format!(
                "Unexpected {}, expected {}",
                found,
                format_char_set(error.expected())
            )
        } else {
            format!("Unexpected character {}", found)
        };

        SyntaxError {
            span: error.span(),
            message,
        }
    }

    /// Parser errors already carry character spans, since the token stream is built from them
    pub fn from_parser(error: &Simple<Token>) -> Self {
        let message = if let SimpleReason::Custom(msg) = error.reason() {
            msg.clone()
        } else {
            let found = error
                .found()
                .map(|t| format!("'{}'", t))
                .unwrap_or_else(|| "end of input".to_string());
            let expected: Vec<String> = error
                .expected()
                .map(|t| match t {
                    Some(t) => format!("'{}'", t),
                    None => "end of input".to_string(),
                })
                .collect();

            if expected.is_empty() {
                format!("Unexpected token {}", found)
            } else {
                format!("Unexpected {}, expected one of: {}", found, expected.join(", "))
            }
        };

        SyntaxError {
            span: error.span(),
            message,
        }
    }
}

/// Render syntax errors against the query text, one report per error
pub fn format_syntax_errors(query: &str, errors: &[SyntaxError]) -> String {
    let mut output = Vec::new();
    let len = query.chars().count();

    for error in errors {
        let span = error.span.start.min(len)..error.span.end.min(len);
        let report = Report::build(ReportKind::Error, (), span.start)
            .with_message("Syntax error")
            .with_label(
                Label::new(span)
                    .with_message(&error.message)
                    .with_color(Color::Red),
            )
            .finish();

        if report.write(Source::from(query), &mut output).is_err() {
            return first_message(errors);
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

fn format_char_set<'a>(expected: impl Iterator<Item = &'a Option<char>>) -> String {
    let chars: Vec<String> = expected
        .filter_map(|opt| opt.as_ref())
        .map(|c| format!("'{}'", c))
        .collect();

    match chars.len() {
        0 => "valid character".to_string(),
        1 => chars[0].clone(),
        _ => chars.join(" or "),
    }
}
