//! SQL dialect knobs
//!
//! The planner targets Impala-style SQL by default. The ANSI flavour exists for
//! engines without `BITAND` and for checking emitted SQL with a generic parser.

use serde::{Deserialize, Serialize};

/// Words that cannot appear as bare column names
const RESERVED: &[&str] = &[
    "all", "and", "as", "by", "chromosome", "end", "from", "group", "having", "in", "is",
    "limit", "not", "null", "or", "order", "position", "reference", "select", "table",
    "type", "where",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// `BITAND(a, b)` when set, `(a & b)` otherwise
    pub use_bit_and_function: bool,
    /// Character placed before an embedded single quote
    pub escape_quote_char: char,
    pub identifier_quote: char,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::impala()
    }
}

impl Dialect {
    pub fn impala() -> Self {
        Dialect {
            use_bit_and_function: true,
            escape_quote_char: '\\',
            identifier_quote: '`',
        }
    }

    pub fn ansi() -> Self {
        Dialect {
            use_bit_and_function: false,
            escape_quote_char: '\'',
            identifier_quote: '"',
        }
    }

    /// Single-quoted string literal with embedded quotes escaped
    pub fn quote_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            if c == '\'' || (c == self.escape_quote_char && c != '\'') {
                out.push(self.escape_quote_char);
            }
            out.push(c);
        }
        out.push('\'');
        out
    }

    /// Column name, quoted only when it collides with a keyword or is not a plain identifier
    pub fn quote_identifier(&self, name: &str) -> String {
        let plain = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let reserved = RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name));

        if plain && !reserved {
            return name.to_string();
        }
        let q = self.identifier_quote;
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Table reference, quoting each dotted part separately
    pub fn quote_table(&self, db: Option<&str>, table: &str) -> String {
        match db {
            Some(db) => format!("{}.{}", self.quote_identifier(db), self.quote_identifier(table)),
            None => self.quote_identifier(table),
        }
    }

    pub fn bit_and(&self, left: &str, right: &str) -> String {
        if self.use_bit_and_function {
            format!("BITAND({left}, {right})")
        } else {
            format!("({left} & {right})")
        }
    }
}
