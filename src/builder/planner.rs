//! WHERE-clause planner
//!
//! Combines the exact filters with the partition-pruning heuristics. Sub-clauses are
//! computed independently, empty ones are dropped, and the rest are joined as
//! `( a ) AND ( b ) ...` in a fixed order.

use indexmap::IndexSet;
use tracing::debug;

use crate::attributes::{Category, Role, Sex, Status, VariantType};
use crate::backend::{BitwiseSqlCompiler, SqlCompiler};
use crate::builder::columns;
use crate::builder::filters::{QueryFilters, RangeFilter};
use crate::builder::heuristics;
use crate::catalog::{GeneModels, StudyConfig};
use crate::convert::CategoryConverter;
use crate::dialect::Dialect;
use crate::error::QueryError;
use crate::inheritance::{parse_inheritance, InheritanceExpr};
use crate::region::Region;
use crate::transform::compile;

/// `af_allele_count` at most this is ultra rare
pub const ULTRA_RARE_MAX_COUNT: f64 = 1.0;

pub struct WherePlanner<'a> {
    study: &'a StudyConfig,
    gene_models: &'a GeneModels,
    dialect: &'a Dialect,
}

impl<'a> WherePlanner<'a> {
    pub fn new(study: &'a StudyConfig, gene_models: &'a GeneModels, dialect: &'a Dialect) -> Self {
        WherePlanner {
            study,
            gene_models,
            dialect,
        }
    }

    /// The conjunction of every non-empty sub-clause, without the `WHERE` keyword
    pub fn conditions(&self, filters: &QueryFilters) -> Result<Vec<String>, QueryError> {
        let schema = &self.study.schema;
        let properties = &self.study.properties;
        let pedigree = &self.study.pedigree;
        let mut clauses: Vec<Option<String>> = Vec::new();

        let mut regions = filters.regions.clone();
        if let Some(genes) = &filters.genes {
            regions = heuristics::gene_regions(genes, regions, self.gene_models);
            clauses.push(Some(self.in_list(columns::EFFECT_GENE_SYMBOLS, genes)));
        }
        if let Some(regions) = &regions {
            clauses.push(self.regions_where(regions));
        }

        let family_ids: Option<Vec<String>> = filters
            .family_ids
            .as_ref()
            .map(|ids| known(ids, |id| pedigree.has_family(id)));
        if let Some(ids) = &family_ids {
            clauses.push(Some(self.in_list(columns::FAMILY_ID, ids)));
        }

        let person_ids: Option<Vec<String>> = filters
            .person_ids
            .as_ref()
            .map(|ids| known(ids, |id| pedigree.has_person(id)));
        if let Some(ids) = &person_ids {
            clauses.push(Some(self.in_list(columns::VARIANT_IN_MEMBERS, ids)));
        }

        if let Some(effect_types) = &filters.effect_types {
            clauses.push(Some(self.in_list(columns::EFFECT_TYPES, effect_types)));
        }

        let inheritance = filters
            .inheritance
            .as_ref()
            .map(|queries| queries.iter().map(|q| parse_inheritance(q)).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        if let Some(exprs) = &inheritance {
            clauses.extend(exprs.iter().map(|e| Some(self.inheritance_where(e))));
        }

        if let Some(roles) = &filters.roles {
            clauses.push(Some(self.bitwise_where::<Role>(columns::VARIANT_IN_ROLES, roles)?));
        }
        if let Some(sexes) = &filters.sexes {
            clauses.push(Some(self.bitwise_where::<Sex>(columns::VARIANT_IN_SEXES, sexes)?));
        }
        if let Some(statuses) = &filters.affected_statuses {
            clauses.push(Some(self.bitwise_where::<Status>(columns::VARIANT_IN_STATUSES, statuses)?));
        }
        if let Some(variant_type) = &filters.variant_type {
            clauses.push(Some(
                self.bitwise_where::<VariantType>(columns::VARIANT_TYPE, variant_type)?,
            ));
        }

        if let Some(ranges) = &filters.real_attr_filter {
            clauses.push(self.real_attr_where(ranges, false)?);
        }
        if let Some(ranges) = &filters.frequency_filter {
            clauses.push(self.real_attr_where(ranges, true)?);
        }
        if filters.ultra_rare {
            clauses.push(self.ultra_rare_where()?);
        }

        clauses.push(self.allele_index_where(filters.return_reference, filters.return_unknown));
        clauses.push(heuristics::frequency_bin_where(
            schema,
            properties,
            inheritance.as_deref(),
            filters.ultra_rare,
            filters.frequency_filter.as_deref(),
            self.dialect,
        ));
        clauses.push(heuristics::family_bin_where(
            schema,
            properties,
            pedigree,
            family_ids.as_deref(),
            person_ids.as_deref(),
            self.dialect,
        ));
        clauses.push(heuristics::coding_bin_where(
            schema,
            properties,
            filters.effect_types.as_deref(),
            self.dialect,
        ));
        clauses.push(heuristics::region_bin_where(
            schema,
            properties,
            regions.as_deref(),
            self.dialect,
        ));

        let clauses: Vec<String> = clauses.into_iter().flatten().filter(|c| !c.is_empty()).collect();
        debug!(clauses = clauses.len(), "planned where clause");
        Ok(clauses)
    }

    /// `WHERE ( a ) AND ( b ) ...`, or `None` when nothing filters
    pub fn build_where(&self, filters: &QueryFilters) -> Result<Option<String>, QueryError> {
        let clauses = self.conditions(filters)?;
        if clauses.is_empty() {
            return Ok(None);
        }
        let joined: Vec<String> = clauses.iter().map(|c| format!("( {c} )")).collect();
        Ok(Some(format!("WHERE {}", joined.join(" AND "))))
    }

    pub fn in_list(&self, column: &str, values: &[String]) -> String {
        SqlCompiler::new(column, self.dialect).in_list(values)
    }

    /// Overlap test for each region, OR'd together
    pub fn regions_where(&self, regions: &[Region]) -> Option<String> {
        if regions.is_empty() {
            return None;
        }
        let d = self.dialect;
        let chrom = d.quote_identifier(columns::CHROMOSOME);
        let pos = d.quote_identifier(columns::POSITION);
        let end = format!("COALESCE({}, -1)", d.quote_identifier(columns::END_POSITION));

        let parts: Vec<String> = regions
            .iter()
            .map(|r| {
                let (start, stop) = (r.start, r.stop);
                format!(
                    "({chrom} = {} AND (({pos} >= {start} AND {pos} <= {stop}) \
                     OR ({end} >= {start} AND {end} <= {stop}) \
                     OR ({start} >= {pos} AND {stop} <= {end})))",
                    d.quote_string(&r.chrom)
                )
            })
            .collect();
        Some(parts.join(" OR "))
    }

    pub fn inheritance_where(&self, expr: &InheritanceExpr) -> String {
        expr.to_sql(columns::INHERITANCE_IN_MEMBERS, self.dialect)
    }

    /// Attribute-language query over a category bitmask column
    pub fn bitwise_where<C: Category>(&self, column: &str, query: &str) -> Result<String, QueryError> {
        let tree = compile(query, &CategoryConverter::<C>::new())?;
        BitwiseSqlCompiler::new(column, self.dialect).compile_categories(&tree)
    }

    /// Inclusive numeric ranges; a missing upper bound keeps NULLs out, a missing
    /// lower bound lets them in
    pub fn real_attr_where(
        &self,
        ranges: &[RangeFilter],
        is_frequency: bool,
    ) -> Result<Option<String>, QueryError> {
        let mut parts = Vec::with_capacity(ranges.len());
        for range in ranges {
            let Some(column_type) = self.study.schema.column_type(&range.attribute) else {
                parts.push("FALSE".to_string());
                continue;
            };
            if !column_type.is_numeric() {
                return Err(QueryError::InvalidFilter(format!(
                    "attribute {} is not numeric",
                    range.attribute
                )));
            }
            for bound in [range.min, range.max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(QueryError::InvalidFilter(format!(
                        "bound {bound} on {} is not a finite number",
                        range.attribute
                    )));
                }
            }

            let col = self.dialect.quote_identifier(&range.attribute);
            match (range.min, range.max) {
                (None, None) if is_frequency => {}
                (None, None) => parts.push(format!("({col} IS NOT NULL)")),
                (None, Some(max)) => parts.push(format!("({col} <= {max} OR {col} IS NULL)")),
                (Some(min), None) => parts.push(format!("({col} >= {min})")),
                (Some(min), Some(max)) => parts.push(format!("({col} >= {min} AND {col} <= {max})")),
            }
        }
        Ok((!parts.is_empty()).then(|| parts.join(" AND ")))
    }

    pub fn ultra_rare_where(&self) -> Result<Option<String>, QueryError> {
        self.real_attr_where(
            &[RangeFilter::new(columns::AF_ALLELE_COUNT, None, Some(ULTRA_RARE_MAX_COUNT))],
            true,
        )
    }

    /// Reference alleles have index 0 and unknown alleles a negative index
    pub fn allele_index_where(&self, return_reference: bool, return_unknown: bool) -> Option<String> {
        let col = self.dialect.quote_identifier(columns::ALLELE_INDEX);
        if !return_reference {
            Some(format!("{col} > 0"))
        } else if !return_unknown {
            Some(format!("{col} >= 0"))
        } else {
            None
        }
    }
}

/// Ids the pedigree knows about, in request order
fn known(ids: &[String], is_known: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen = IndexSet::new();
    for id in ids {
        if is_known(id) {
            seen.insert(id.clone());
        }
    }
    seen.into_iter().collect()
}
