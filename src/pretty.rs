//! Pretty-printer for attribute queries
//!
//! Renders an AST back to query text for round-trip testing and for echoing
//! normalised queries in the shell.

use std::fmt::Display;

use crate::ast::QueryNode;
use crate::lexer::{is_word_char, is_word_start};

/// A pretty-printer accumulating query text
#[derive(Default)]
pub struct Pretty {
    output: String,
}

impl Pretty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }
}

// ============ Pretty-printing implementations ============

impl Pretty {
    pub fn node<V: Display>(&mut self, node: &QueryNode<V>) {
        match node {
            QueryNode::And(children) => self.chain(children, " and ", "all"),
            QueryNode::Or(children) => self.chain(children, " or ", "any"),
            QueryNode::Not(child) => {
                self.write("not ");
                self.molecule(child);
            }
            QueryNode::Contains(value) => self.token(value),
            QueryNode::ElementOf(values) => self.call("any", values),
            QueryNode::Equals(values) => self.call("eq", values),
            QueryNode::LessThan(n) => self.write(&format!("> {n}")),
            QueryNode::GreaterThan(n) => self.write(&format!("< {n}")),
            QueryNode::LessThanEq(n) => self.write(&format!(">= {n}")),
            QueryNode::GreaterThanEq(n) => self.write(&format!("<= {n}")),
        }
    }

    /// A chain operand; nested chains keep their parentheses
    fn molecule<V: Display>(&mut self, node: &QueryNode<V>) {
        let compound = match node {
            QueryNode::And(children) | QueryNode::Or(children) => single_contains(children).is_none(),
            _ => false,
        };
        if compound {
            self.write("(");
            self.node(node);
            self.write(")");
        } else {
            self.node(node);
        }
    }

    fn chain<V: Display>(&mut self, children: &[QueryNode<V>], sep: &str, function: &str) {
        if let Some(value) = single_contains(children) {
            self.write(function);
            self.write("(");
            self.token(value);
            self.write(")");
            return;
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.write(sep);
            }
            self.molecule(child);
        }
    }

    fn call<V: Display>(&mut self, function: &str, values: &[V]) {
        self.write(function);
        self.write("(");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.token(value);
        }
        self.write(")");
    }

    fn token<V: Display>(&mut self, value: &V) {
        let text = value.to_string();
        let quoted = quote_token(&text);
        self.write(&quoted);
    }
}

/// The value of a one-element `any(...)`/`all(...)`
fn single_contains<V>(children: &[QueryNode<V>]) -> Option<&V> {
    match children {
        [QueryNode::Contains(value)] => Some(value),
        _ => None,
    }
}

/// Bare when the lexer reads it back as the same word, quoted otherwise
pub fn quote_token(text: &str) -> String {
    let mut chars = text.chars();
    let bare = chars.next().is_some_and(is_word_start)
        && chars.all(is_word_char)
        && !matches!(text, "and" | "or" | "not");

    if bare {
        text.to_string()
    } else if !text.contains('\'') {
        format!("'{text}'")
    } else {
        format!("\"{text}\"")
    }
}

/// Convenience function to pretty-print a query
pub fn pretty_print<V: Display>(node: &QueryNode<V>) -> String {
    let mut p = Pretty::new();
    p.node(node);
    p.finish()
}

// Unit tests live in tests/unit_pretty.rs
