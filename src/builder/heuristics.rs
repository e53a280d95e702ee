//! Partition-pruning heuristics
//!
//! Each heuristic narrows the scan to a set of partition bins. None of them may ever
//! exclude a row that the exact filters would accept: when a precondition does not
//! hold they emit nothing.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::attributes::{Category, Inheritance};
use crate::builder::columns;
use crate::builder::filters::RangeFilter;
use crate::catalog::{GeneModels, PedigreeIndex, TableProperties, TableSchema};
use crate::dialect::Dialect;
use crate::inheritance::InheritanceExpr;
use crate::region::{collapse, Region};

/// Above this many genes the gene→region expansion is skipped
pub const GENE_REGIONS_CUTOFF: usize = 20;

/// Base pairs added on both sides of a transcript
pub const GENE_REGIONS_EXTEND: u64 = 20_000;

/// Above this many region bins no region-bin filter is emitted
pub const REGION_BINS_CUTOFF: u64 = 10_000;

/// Frequency bins: de novo, ultra rare, rare, common
pub const DENOVO_BIN: u8 = 0;
pub const ULTRA_RARE_BIN: u8 = 1;
pub const RARE_BIN: u8 = 2;
pub const COMMON_BIN: u8 = 3;
const ALL_FREQUENCY_BINS: [u8; 4] = [DENOVO_BIN, ULTRA_RARE_BIN, RARE_BIN, COMMON_BIN];

/// Expand genes into padded transcript windows and narrow `regions` with them.
///
/// Returns the regions the query should be restricted to, which are the explicit
/// ones unchanged whenever the heuristic does not apply.
pub fn gene_regions(
    genes: &[String],
    regions: Option<Vec<Region>>,
    gene_models: &GeneModels,
) -> Option<Vec<Region>> {
    if genes.is_empty() || genes.len() > GENE_REGIONS_CUTOFF {
        debug!(genes = genes.len(), "gene region heuristic skipped");
        return regions;
    }

    let mut windows = Vec::new();
    for gene in genes {
        match gene_models.transcripts(gene) {
            Some(transcripts) => windows.extend(transcripts.iter().map(|tx| {
                Region::around(tx.chrom.clone(), tx.tx_start, tx.tx_end, GENE_REGIONS_EXTEND)
            })),
            None => {
                warn!(gene = %gene, "gene model not found; gene region heuristic skipped");
                return regions;
            }
        }
    }
    let windows = collapse(windows);
    info!(genes = ?genes, windows = ?windows, "gene regions");

    match regions {
        Some(explicit) if !explicit.is_empty() => {
            let narrowed = collapse(
                windows
                    .iter()
                    .flat_map(|w| explicit.iter().filter_map(move |r| w.intersection(r)))
                    .collect(),
            );
            info!(input = ?explicit, result = ?narrowed, "gene regions intersected");
            if narrowed.is_empty() {
                Some(explicit)
            } else {
                Some(narrowed)
            }
        }
        _ => Some(windows),
    }
}

/// Inheritance kinds of alleles stored in the transmitted bins 1-3
pub const TRANSMITTED_INHERITANCE: [Inheritance; 3] = [
    Inheritance::Mendelian,
    Inheritance::PossibleDenovo,
    Inheritance::PossibleOmission,
];

/// Frequency bins a matching variant can live in.
///
/// Each inheritance expression is tested against single flags: bin 0 is opened by an
/// expression accepting `denovo`, the transmitted bins only when every expression
/// accepts one of [`TRANSMITTED_INHERITANCE`].
pub fn frequency_bins(
    inheritance: Option<&[InheritanceExpr]>,
    ultra_rare: bool,
    frequency_filter: Option<&[RangeFilter]>,
    rare_boundary: f64,
) -> BTreeSet<u8> {
    let inheritance = inheritance.filter(|exprs| !exprs.is_empty());
    let mut bins = BTreeSet::new();

    if let Some(exprs) = inheritance {
        if exprs.iter().any(|e| e.matches(Inheritance::Denovo.bits())) {
            bins.insert(DENOVO_BIN);
        }
    }

    let transmitted = inheritance.map_or(true, |exprs| {
        exprs.iter().all(|e| {
            TRANSMITTED_INHERITANCE
                .iter()
                .any(|flag| e.matches(flag.bits()))
        })
    });

    let af_filters: Vec<&RangeFilter> = frequency_filter
        .unwrap_or_default()
        .iter()
        .filter(|f| f.attribute == columns::AF_ALLELE_FREQ)
        .collect();

    if transmitted {
        if ultra_rare {
            bins.extend([DENOVO_BIN, ULTRA_RARE_BIN]);
        } else if !af_filters.is_empty() {
            for filter in af_filters {
                match (filter.min, filter.max) {
                    (_, Some(max)) if max < rare_boundary => {
                        bins.extend([DENOVO_BIN, ULTRA_RARE_BIN, RARE_BIN])
                    }
                    (Some(min), _) if min >= rare_boundary => {
                        bins.insert(COMMON_BIN);
                    }
                    _ => bins.extend(ALL_FREQUENCY_BINS),
                }
            }
        } else if inheritance.is_some() {
            // Coarse: any transmitted inheritance query opens every transmitted bin
            bins.extend([ULTRA_RARE_BIN, RARE_BIN, COMMON_BIN]);
        }
    }

    debug!(bins = ?bins, transmitted, ultra_rare, "frequency bin heuristic");
    bins
}

pub fn frequency_bin_where(
    schema: &TableSchema,
    properties: &TableProperties,
    inheritance: Option<&[InheritanceExpr]>,
    ultra_rare: bool,
    frequency_filter: Option<&[RangeFilter]>,
    dialect: &Dialect,
) -> Option<String> {
    if !schema.has(columns::FREQUENCY_BIN) {
        return None;
    }
    let bins = frequency_bins(inheritance, ultra_rare, frequency_filter, properties.rare_boundary);
    if bins.is_empty() || bins.len() == ALL_FREQUENCY_BINS.len() {
        return None;
    }
    let list: Vec<String> = bins.iter().map(u8::to_string).collect();
    Some(format!(
        "{} IN ({})",
        dialect.quote_identifier(columns::FREQUENCY_BIN),
        list.join(", ")
    ))
}

/// `coding_bin = 1` when every requested effect type is coding, `= 0` when none is
pub fn coding_bin_where(
    schema: &TableSchema,
    properties: &TableProperties,
    effect_types: Option<&[String]>,
    dialect: &Dialect,
) -> Option<String> {
    let effect_types = effect_types?;
    if !schema.has(columns::CODING_BIN) || effect_types.is_empty() {
        return None;
    }
    let coding = effect_types
        .iter()
        .filter(|e| properties.coding_effect_types.contains(e.as_str()))
        .count();
    debug!(
        requested = effect_types.len(),
        coding,
        "coding bin heuristic"
    );

    let col = dialect.quote_identifier(columns::CODING_BIN);
    if coding == effect_types.len() {
        Some(format!("{col} = 1"))
    } else if coding == 0 {
        Some(format!("{col} = 0"))
    } else {
        None
    }
}

/// Family bins of the requested families and persons, when they are few enough to prune
pub fn family_bin_where(
    schema: &TableSchema,
    properties: &TableProperties,
    pedigree: &PedigreeIndex,
    family_ids: Option<&[String]>,
    person_ids: Option<&[String]>,
    dialect: &Dialect,
) -> Option<String> {
    if !schema.has(columns::FAMILY_BIN) || !pedigree.has_family_bins() {
        return None;
    }
    let bins = pedigree.family_bins(
        family_ids.unwrap_or_default().iter().map(String::as_str),
        person_ids.unwrap_or_default().iter().map(String::as_str),
    );
    debug!(bins = ?bins, family_bin_size = properties.family_bin_size, "family bin heuristic");

    if bins.is_empty() || bins.len() >= properties.family_bin_size {
        return None;
    }
    let list: Vec<String> = bins.iter().map(u32::to_string).collect();
    Some(format!(
        "{} IN ({})",
        dialect.quote_identifier(columns::FAMILY_BIN),
        list.join(", ")
    ))
}

/// Region bins `<chrom>_<pos / region_length>` touched by the regions
///
/// Empty when binning is off or the regions span more than [`REGION_BINS_CUTOFF`] bins.
pub fn region_bins(properties: &TableProperties, regions: &[Region]) -> IndexSet<String> {
    let mut bins = IndexSet::new();
    let length = properties.region_length;
    if length == 0 {
        return bins;
    }
    let spanned = regions.iter().fold(0u64, |total, region| {
        let span = (region.stop / length).saturating_sub(region.start / length);
        total.saturating_add(span).saturating_add(1)
    });
    if spanned > REGION_BINS_CUTOFF {
        debug!(bins = spanned, "region bin heuristic skipped");
        return bins;
    }
    for region in regions {
        let chrom_bin = if properties.chromosomes.contains(&region.chrom) {
            region.chrom.as_str()
        } else {
            "other"
        };
        let first = region.start / length;
        let last = region.stop / length;
        for bin in first..=last {
            bins.insert(format!("{chrom_bin}_{bin}"));
        }
    }
    bins
}

pub fn region_bin_where(
    schema: &TableSchema,
    properties: &TableProperties,
    regions: Option<&[Region]>,
    dialect: &Dialect,
) -> Option<String> {
    let regions = regions?;
    if !schema.has(columns::REGION_BIN) {
        return None;
    }
    let bins = region_bins(properties, regions);
    debug!(bins = bins.len(), "region bin heuristic");
    if bins.is_empty() {
        return None;
    }
    let list: Vec<String> = bins.iter().map(|b| dialect.quote_string(b)).collect();
    Some(format!(
        "{} IN ({})",
        dialect.quote_identifier(columns::REGION_BIN),
        list.join(", ")
    ))
}

// Unit tests live in tests/unit_builder.rs and tests/proptest_heuristics.rs
