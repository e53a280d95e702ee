//! REPL (Read-Eval-Print Loop) for the filter languages
//!
//! Lets a user type attribute expressions and see how each backend compiles them,
//! try the inheritance language, match values in memory, and build complete
//! statements against a study catalog.

use std::path::{Path, PathBuf};

use crate::attributes::{Category, Role, Sex, Status, VariantType};
use crate::backend::{BitwiseSqlCompiler, Matcher, SqlCompiler};
use crate::builder::{QueryFilters, QueryKind};
use crate::catalog::StudyCatalog;
use crate::convert::{CategoryConverter, Identity};
use crate::dialect::Dialect;
use crate::error::QueryError;
use crate::inheritance::parse_inheritance;
use crate::pretty::pretty_print;
use crate::transform::compile;

/// Column name used when compiling bare expressions
pub const DEFAULT_COLUMN: &str = "col";

/// REPL state: the active catalog and the compilation settings
pub struct ReplState {
    pub catalog: Option<StudyCatalog>,
    pub dialect: Dialect,
    pub column: String,

    /// Multi-line input buffer
    pub input_buffer: String,

    /// Parenthesis depth for multi-line detection
    pub paren_depth: i32,
}

impl Default for ReplState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplState {
    pub fn new() -> Self {
        Self {
            catalog: None,
            dialect: Dialect::default(),
            column: DEFAULT_COLUMN.to_string(),
            input_buffer: String::new(),
            paren_depth: 0,
        }
    }

    /// Start with a catalog loaded from `path`, adopting its dialect
    pub fn with_catalog(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let mut state = Self::new();
        state.load_catalog(path)?;
        Ok(state)
    }

    pub fn load_catalog(&mut self, path: impl AsRef<Path>) -> Result<usize, QueryError> {
        let catalog = StudyCatalog::from_path(path)?;
        let count = catalog.studies.len();
        self.dialect = catalog.dialect.clone();
        self.catalog = Some(catalog);
        Ok(count)
    }

    /// Process a line of input, joining lines until parentheses balance
    pub fn process_line(&mut self, line: &str) -> InputResult {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if self.input_buffer.is_empty() {
                return InputResult::Empty;
            }
            return InputResult::Incomplete;
        }

        // Meta-command (only at start, not in continuation)
        if trimmed.starts_with(':') && self.input_buffer.is_empty() {
            return InputResult::MetaCommand(MetaCommand::parse(trimmed));
        }

        if !self.input_buffer.is_empty() {
            self.input_buffer.push(' ');
        }
        self.input_buffer.push_str(trimmed);

        for ch in trimmed.chars() {
            match ch {
                '(' => self.paren_depth += 1,
                ')' => self.paren_depth -= 1,
                _ => {}
            }
        }

        if self.paren_depth <= 0 {
            self.paren_depth = 0;
            InputResult::Expression(std::mem::take(&mut self.input_buffer))
        } else {
            InputResult::Incomplete
        }
    }

    /// Force submit current buffer (for Ctrl-D)
    pub fn force_submit(&mut self) -> Option<String> {
        if self.input_buffer.is_empty() {
            None
        } else {
            self.paren_depth = 0;
            Some(std::mem::take(&mut self.input_buffer))
        }
    }

    /// Compile an attribute expression over plain strings
    pub fn evaluate(&self, query: &str) -> Result<ExprReport, QueryError> {
        let tree = compile(query, &Identity)?;
        Ok(ExprReport {
            normalized: pretty_print(&tree),
            sql: SqlCompiler::new(&self.column, &self.dialect).compile(&tree),
        })
    }

    pub fn bitwise(&self, category: CategoryKind, query: &str) -> Result<String, QueryError> {
        fn run<C: Category>(state: &ReplState, query: &str) -> Result<String, QueryError> {
            let tree = compile(query, &CategoryConverter::<C>::new())?;
            BitwiseSqlCompiler::new(&state.column, &state.dialect).compile_categories(&tree)
        }
        match category {
            CategoryKind::Role => run::<Role>(self, query),
            CategoryKind::Sex => run::<Sex>(self, query),
            CategoryKind::Status => run::<Status>(self, query),
            CategoryKind::VariantType => run::<VariantType>(self, query),
        }
    }

    pub fn inheritance(&self, query: &str) -> Result<String, QueryError> {
        Ok(parse_inheritance(query)?.to_sql(&self.column, &self.dialect))
    }

    /// Test the expression in memory against a set of values
    pub fn match_values(&self, query: &str, values: &[String]) -> Result<bool, QueryError> {
        let matcher = Matcher::new(compile(query, &Identity)?);
        Ok(match values {
            [single] => match single.parse::<f64>() {
                Ok(n) if matcher.tree().is_comparison() => matcher.matches_number(n),
                _ => matcher.matches_value(single),
            },
            _ => matcher.matches_values(values),
        })
    }

    pub fn studies(&self) -> Vec<StudyInfo> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        catalog
            .studies
            .iter()
            .map(|(id, study)| StudyInfo {
                id: id.clone(),
                table: match &study.db {
                    Some(db) => format!("{db}.{}", study.variants_table),
                    None => study.variants_table.clone(),
                },
                columns: study.schema.columns().count(),
                members: study.pedigree.len(),
            })
            .collect()
    }

    /// Build a full statement; `filters` is a JSON object of [`QueryFilters`]
    pub fn build_query(&self, study: &str, kind: &QueryKind, filters: &str) -> Result<String, QueryError> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| QueryError::Config("no catalog loaded; use :load <path>".to_string()))?;
        let filters: QueryFilters = if filters.trim().is_empty() {
            QueryFilters::default()
        } else {
            serde_json::from_str(filters).map_err(|e| QueryError::InvalidFilter(e.to_string()))?
        };
        catalog.build_query(study, kind, &filters)
    }
}

/// Result of compiling an attribute expression
#[derive(Debug, Clone, PartialEq)]
pub struct ExprReport {
    pub normalized: String,
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyInfo {
    pub id: String,
    pub table: String,
    pub columns: usize,
    pub members: usize,
}

/// Bitmask categories the shell can compile against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Role,
    Sex,
    Status,
    VariantType,
}

impl CategoryKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "role" | "roles" => Some(CategoryKind::Role),
            "sex" | "sexes" => Some(CategoryKind::Sex),
            "status" | "statuses" => Some(CategoryKind::Status),
            "variant_type" | "type" => Some(CategoryKind::VariantType),
            _ => None,
        }
    }
}

/// Result of processing a line of input
#[derive(Debug, PartialEq)]
pub enum InputResult {
    MetaCommand(MetaCommand),
    Expression(String),
    Incomplete,
    Empty,
}

/// Meta-commands supported by the REPL
#[derive(Debug, PartialEq)]
pub enum MetaCommand {
    Help(Option<String>),
    Quit,
    /// Load a study catalog: `:load <path>`
    Load(PathBuf),
    /// Column used in emitted SQL: `:column <name>`
    Column(String),
    /// `:dialect impala|ansi`
    Dialect(Dialect),
    /// `:bitwise <role|sex|status|variant_type> <expr>`
    Bitwise { category: CategoryKind, query: String },
    /// `:inheritance <expr>`
    Inheritance(String),
    /// `:match <expr> | v1, v2, ...`
    Match { query: String, values: Vec<String> },
    Studies,
    /// `:query <study> <family|summary[:n]|count> [filters json]`
    Query {
        study: String,
        kind: QueryKind,
        filters: String,
    },
    Unknown(String),
}

impl MetaCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim_start_matches(':').trim();
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        let arg = rest.split_whitespace().next();

        match cmd {
            "help" | "h" | "?" => MetaCommand::Help(arg.map(String::from)),
            "quit" | "q" | "exit" => MetaCommand::Quit,
            "load" => match arg {
                Some(path) => MetaCommand::Load(PathBuf::from(path)),
                None => MetaCommand::Unknown(":load requires a file path".to_string()),
            },
            "column" | "col" => match arg {
                Some(name) => MetaCommand::Column(name.to_string()),
                None => MetaCommand::Unknown(":column requires a name".to_string()),
            },
            "dialect" => match arg {
                Some("impala") => MetaCommand::Dialect(Dialect::impala()),
                Some("ansi") => MetaCommand::Dialect(Dialect::ansi()),
                _ => MetaCommand::Unknown(":dialect expects impala or ansi".to_string()),
            },
            "bitwise" | "bw" => {
                let (name, query) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                match CategoryKind::parse(name) {
                    Some(category) if !query.trim().is_empty() => MetaCommand::Bitwise {
                        category,
                        query: query.trim().to_string(),
                    },
                    _ => MetaCommand::Unknown(
                        ":bitwise requires <role|sex|status|variant_type> <expr>".to_string(),
                    ),
                }
            }
            "inheritance" | "inh" => {
                if rest.is_empty() {
                    MetaCommand::Unknown(":inheritance requires an expression".to_string())
                } else {
                    MetaCommand::Inheritance(rest.to_string())
                }
            }
            "match" | "m" => match rest.split_once('|') {
                Some((query, values)) if !query.trim().is_empty() => MetaCommand::Match {
                    query: query.trim().to_string(),
                    values: values
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(String::from)
                        .collect(),
                },
                _ => MetaCommand::Unknown(":match requires <expr> | v1, v2, ...".to_string()),
            },
            "studies" | "ls" => MetaCommand::Studies,
            "query" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                let study = parts.next().filter(|s| !s.is_empty());
                let kind = parts.next().and_then(parse_kind);
                let filters = parts.next().unwrap_or("").trim().to_string();
                match (study, kind) {
                    (Some(study), Some(kind)) => MetaCommand::Query {
                        study: study.to_string(),
                        kind,
                        filters,
                    },
                    _ => MetaCommand::Unknown(
                        ":query requires <study> <family|summary[:n]|count> [json]".to_string(),
                    ),
                }
            }
            other => MetaCommand::Unknown(format!("Unknown command: :{}", other)),
        }
    }
}

fn parse_kind(text: &str) -> Option<QueryKind> {
    match text.split_once(':') {
        Some(("summary", n)) => n.parse().ok().map(|n| QueryKind::SummaryVariants {
            min_families: Some(n),
        }),
        Some(_) => None,
        None => match text {
            "family" | "families" => Some(QueryKind::FamilyVariants),
            "summary" => Some(QueryKind::SummaryVariants { min_families: None }),
            "count" => Some(QueryKind::Count),
            _ => None,
        },
    }
}

// Unit tests live in tests/unit_repl.rs
