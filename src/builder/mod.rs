//! Statement assembly
//!
//! [`QueryBuilder`] produces one complete statement per call, in the fixed order
//! SELECT, FROM, WHERE, GROUP BY, HAVING, LIMIT. It holds only shared references to
//! the read-only catalog, so one builder can serve any number of queries and
//! threads.

pub mod filters;
pub mod heuristics;
pub mod planner;

pub use filters::{QueryFilters, QueryKind, RangeFilter};
pub use planner::WherePlanner;

use crate::catalog::{GeneModels, StudyConfig};
use crate::dialect::Dialect;
use crate::error::QueryError;

/// Column names of the variants table
pub mod columns {
    pub const BUCKET_INDEX: &str = "bucket_index";
    pub const SUMMARY_VARIANT_INDEX: &str = "summary_variant_index";
    pub const FAMILY_VARIANT_INDEX: &str = "family_variant_index";
    pub const CHROMOSOME: &str = "chromosome";
    pub const POSITION: &str = "position";
    pub const END_POSITION: &str = "end_position";
    pub const REFERENCE: &str = "reference";
    pub const VARIANT_TYPE: &str = "variant_type";
    pub const VARIANT_DATA: &str = "variant_data";
    pub const SUMMARY_DATA: &str = "summary_data";
    pub const FAMILY_ID: &str = "family_id";
    pub const ALLELE_INDEX: &str = "allele_index";
    pub const EFFECT_GENE_SYMBOLS: &str = "effect_gene_symbols";
    pub const EFFECT_TYPES: &str = "effect_types";
    pub const VARIANT_IN_MEMBERS: &str = "variant_in_members";
    pub const VARIANT_IN_ROLES: &str = "variant_in_roles";
    pub const VARIANT_IN_SEXES: &str = "variant_in_sexes";
    pub const VARIANT_IN_STATUSES: &str = "variant_in_statuses";
    pub const INHERITANCE_IN_MEMBERS: &str = "inheritance_in_members";
    pub const AF_ALLELE_COUNT: &str = "af_allele_count";
    pub const AF_ALLELE_FREQ: &str = "af_allele_freq";
    pub const FREQUENCY_BIN: &str = "frequency_bin";
    pub const FAMILY_BIN: &str = "family_bin";
    pub const CODING_BIN: &str = "coding_bin";
    pub const REGION_BIN: &str = "region_bin";
}

const FAMILY_COLUMNS: &[&str] = &[
    columns::BUCKET_INDEX,
    columns::SUMMARY_VARIANT_INDEX,
    columns::FAMILY_VARIANT_INDEX,
    columns::CHROMOSOME,
    columns::POSITION,
    columns::END_POSITION,
    columns::VARIANT_TYPE,
    columns::REFERENCE,
    columns::FAMILY_ID,
    columns::VARIANT_DATA,
];

const SUMMARY_COLUMNS: &[&str] = &[
    columns::BUCKET_INDEX,
    columns::SUMMARY_VARIANT_INDEX,
    columns::CHROMOSOME,
    columns::POSITION,
    columns::END_POSITION,
    columns::VARIANT_TYPE,
    columns::REFERENCE,
    columns::SUMMARY_DATA,
];

const VARIANT_IDENTITY: &[&str] = &[
    columns::BUCKET_INDEX,
    columns::SUMMARY_VARIANT_INDEX,
    columns::FAMILY_VARIANT_INDEX,
];

pub struct QueryBuilder<'a> {
    study: &'a StudyConfig,
    gene_models: &'a GeneModels,
    dialect: &'a Dialect,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(study: &'a StudyConfig, gene_models: &'a GeneModels, dialect: &'a Dialect) -> Self {
        QueryBuilder {
            study,
            gene_models,
            dialect,
        }
    }

    pub fn planner(&self) -> WherePlanner<'a> {
        WherePlanner::new(self.study, self.gene_models, self.dialect)
    }

    pub fn build(&self, kind: &QueryKind, filters: &QueryFilters) -> Result<String, QueryError> {
        let where_clause = self.planner().build_where(filters)?;

        let group_by = match kind {
            QueryKind::FamilyVariants => self.group_by(FAMILY_COLUMNS),
            QueryKind::SummaryVariants { .. } => self.group_by(SUMMARY_COLUMNS),
            QueryKind::Count => None,
        };
        let having = match kind {
            QueryKind::SummaryVariants {
                min_families: Some(n),
            } => Some(format!(
                "HAVING COUNT(DISTINCT {}) >= {n}",
                self.dialect.quote_identifier(columns::FAMILY_ID)
            )),
            _ => None,
        };
        let limit = match kind {
            QueryKind::Count => None,
            _ => filters.limit.map(|n| format!("LIMIT {n}")),
        };

        let parts = [
            Some(self.select(kind)),
            Some(self.from()),
            where_clause,
            group_by,
            having,
            limit,
        ];
        Ok(parts.into_iter().flatten().collect::<Vec<_>>().join(" "))
    }

    /// Columns from `wanted` the table actually has, quoted
    fn present(&self, wanted: &[&str]) -> Vec<String> {
        wanted
            .iter()
            .filter(|c| self.study.schema.has(c))
            .map(|c| self.dialect.quote_identifier(c))
            .collect()
    }

    fn select(&self, kind: &QueryKind) -> String {
        let mut cols = match kind {
            QueryKind::FamilyVariants => self.present(FAMILY_COLUMNS),
            QueryKind::SummaryVariants { .. } => self.present(SUMMARY_COLUMNS),
            QueryKind::Count => {
                let identity = self.present(VARIANT_IDENTITY);
                let count = if identity.is_empty() {
                    "COUNT(*)".to_string()
                } else {
                    format!("COUNT(DISTINCT {})", identity.join(", "))
                };
                return format!("SELECT {count}");
            }
        };
        let allele_index = self.dialect.quote_identifier(columns::ALLELE_INDEX);
        match kind {
            QueryKind::FamilyVariants => {
                cols.push(format!("GROUP_CONCAT(DISTINCT CAST({allele_index} AS string))"))
            }
            _ => cols.push(format!(
                "COUNT(DISTINCT {})",
                self.dialect.quote_identifier(columns::FAMILY_ID)
            )),
        }
        format!("SELECT {}", cols.join(", "))
    }

    fn from(&self) -> String {
        format!(
            "FROM {}",
            self.dialect
                .quote_table(self.study.db.as_deref(), &self.study.variants_table)
        )
    }

    fn group_by(&self, wanted: &[&str]) -> Option<String> {
        let cols = self.present(wanted);
        (!cols.is_empty()).then(|| format!("GROUP BY {}", cols.join(", ")))
    }
}

// Unit tests live in tests/unit_builder.rs
