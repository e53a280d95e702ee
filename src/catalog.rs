//! Study catalog
//!
//! Read-only collaborators of the WHERE planner: the variants table schema and its
//! partitioning properties, the pedigree index used for family bins, and the gene
//! models used for gene→region expansion. Loaded once from JSON and shared by every
//! query built against it.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{QueryBuilder, QueryFilters, QueryKind};
use crate::dialect::Dialect;
use crate::error::QueryError;

/// Storage type of a variants-table column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    Float,
    String,
    Bool,
    Blob,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

/// Column name → type, in table order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: IndexMap<String, ColumnType>,
}

impl TableSchema {
    pub fn new(columns: impl IntoIterator<Item = (String, ColumnType)>) -> Self {
        TableSchema {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// Partitioning properties of one physical variants table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableProperties {
    /// Allele frequency (percent) separating rare from common variants
    #[serde(default = "default_rare_boundary")]
    pub rare_boundary: f64,

    #[serde(default)]
    pub coding_effect_types: BTreeSet<String>,

    /// Width of a region bin in base pairs; 0 disables region bins
    #[serde(default)]
    pub region_length: u64,

    /// Contigs with their own region bins; everything else lands in "other"
    #[serde(default)]
    pub chromosomes: BTreeSet<String>,

    /// Number of family bins; 0 disables family bins
    #[serde(default)]
    pub family_bin_size: usize,
}

fn default_rare_boundary() -> f64 {
    5.0
}

impl Default for TableProperties {
    fn default() -> Self {
        TableProperties {
            rare_boundary: default_rare_boundary(),
            coding_effect_types: BTreeSet::new(),
            region_length: 0,
            chromosomes: BTreeSet::new(),
            family_bin_size: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedigreeMember {
    pub family_id: String,
    pub person_id: String,
    #[serde(default)]
    pub family_bin: Option<u32>,
}

/// Lookup of pedigree members by family and person id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PedigreeMember>", into = "Vec<PedigreeMember>")]
pub struct PedigreeIndex {
    members: Vec<PedigreeMember>,
    by_family: HashMap<String, Vec<usize>>,
    by_person: HashMap<String, usize>,
}

impl From<Vec<PedigreeMember>> for PedigreeIndex {
    fn from(members: Vec<PedigreeMember>) -> Self {
        let mut by_family: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_person = HashMap::new();
        for (idx, member) in members.iter().enumerate() {
            by_family.entry(member.family_id.clone()).or_default().push(idx);
            by_person.insert(member.person_id.clone(), idx);
        }
        PedigreeIndex {
            members,
            by_family,
            by_person,
        }
    }
}

impl From<PedigreeIndex> for Vec<PedigreeMember> {
    fn from(index: PedigreeIndex) -> Self {
        index.members
    }
}

impl PedigreeIndex {
    pub fn has_family(&self, family_id: &str) -> bool {
        self.by_family.contains_key(family_id)
    }

    pub fn has_person(&self, person_id: &str) -> bool {
        self.by_person.contains_key(person_id)
    }

    /// Whether the pedigree carries family bins at all
    pub fn has_family_bins(&self) -> bool {
        self.members.iter().any(|m| m.family_bin.is_some())
    }

    pub fn family_bins<'a>(
        &self,
        family_ids: impl IntoIterator<Item = &'a str>,
        person_ids: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<u32> {
        let by_family = family_ids
            .into_iter()
            .filter_map(|id| self.by_family.get(id))
            .flatten()
            .copied();
        let by_person = person_ids
            .into_iter()
            .filter_map(|id| self.by_person.get(id))
            .copied();

        by_family
            .chain(by_person)
            .filter_map(|idx| self.members[idx].family_bin)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub chrom: String,
    pub tx_start: u64,
    pub tx_end: u64,
}

/// Gene symbol → transcripts
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneModels {
    genes: IndexMap<String, Vec<Transcript>>,
}

impl GeneModels {
    pub fn new(genes: impl IntoIterator<Item = (String, Vec<Transcript>)>) -> Self {
        GeneModels {
            genes: genes.into_iter().collect(),
        }
    }

    pub fn transcripts(&self, gene: &str) -> Option<&[Transcript]> {
        self.genes
            .get(gene)
            .map(Vec::as_slice)
            .filter(|txs| !txs.is_empty())
    }
}

/// One study: where its variants live and how the table is partitioned
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub db: Option<String>,
    pub variants_table: String,
    pub schema: TableSchema,
    #[serde(default)]
    pub properties: TableProperties,
    #[serde(default)]
    pub pedigree: PedigreeIndex,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StudyCatalog {
    pub studies: IndexMap<String, StudyConfig>,
    #[serde(default)]
    pub gene_models: GeneModels,
    #[serde(default)]
    pub dialect: Dialect,
}

impl StudyCatalog {
    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        let catalog: StudyCatalog =
            serde_json::from_str(json).map_err(|e| QueryError::Config(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            studies = catalog.studies.len(),
            "loaded study catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), QueryError> {
        for (id, study) in &self.studies {
            let boundary = study.properties.rare_boundary;
            if !boundary.is_finite() || boundary < 0.0 {
                return Err(QueryError::Config(format!(
                    "study {id}: rare_boundary must be a non-negative number, got {boundary}"
                )));
            }
            if study.variants_table.is_empty() {
                return Err(QueryError::Config(format!("study {id}: empty variants_table")));
            }
        }
        Ok(())
    }

    pub fn study(&self, id: &str) -> Result<&StudyConfig, QueryError> {
        self.studies
            .get(id)
            .ok_or_else(|| QueryError::UnknownStudy(id.to_string()))
    }

    pub fn builder<'a>(&'a self, id: &str) -> Result<QueryBuilder<'a>, QueryError> {
        Ok(QueryBuilder::new(self.study(id)?, &self.gene_models, &self.dialect))
    }

    /// Build one complete SQL statement for `study`
    pub fn build_query(
        &self,
        study: &str,
        kind: &QueryKind,
        filters: &QueryFilters,
    ) -> Result<String, QueryError> {
        self.builder(study)?.build(kind, filters)
    }
}

// Unit tests live in tests/unit_catalog.rs
