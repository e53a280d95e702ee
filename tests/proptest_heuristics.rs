//! Property tests for the partition heuristics: pruning never drops a matching row


use proptest::collection::vec;
use proptest::prelude::*;
use varql::attributes::{Category, Inheritance};
use varql::builder::heuristics::{
    frequency_bins, gene_regions, region_bins, COMMON_BIN, DENOVO_BIN, GENE_REGIONS_CUTOFF,
    RARE_BIN, REGION_BINS_CUTOFF, ULTRA_RARE_BIN,
};
use varql::builder::RangeFilter;
use varql::catalog::{GeneModels, PedigreeIndex, PedigreeMember, TableProperties, Transcript};
use varql::inheritance::InheritanceExpr;
use varql::region::Region;

const RARE_BOUNDARY: f64 = 5.0;

/// A stored variant as the partitioner sees it
#[derive(Clone, Debug)]
struct Variant {
    inheritance: u64,
    allele_count: u32,
    /// Allele frequency in percent
    frequency: f64,
}

impl Variant {
    fn is_denovo(&self) -> bool {
        self.inheritance == Inheritance::Denovo.bits()
    }

    fn frequency_bin(&self) -> u8 {
        if self.is_denovo() {
            DENOVO_BIN
        } else if self.allele_count <= 1 {
            ULTRA_RARE_BIN
        } else if self.frequency < RARE_BOUNDARY {
            RARE_BIN
        } else {
            COMMON_BIN
        }
    }

    fn in_range(&self, filter: &RangeFilter) -> bool {
        filter.min.map_or(true, |min| self.frequency >= min)
            && filter.max.map_or(true, |max| self.frequency <= max)
    }
}

/// A stored allele is either de novo or transmitted, never both
fn arb_inheritance_flag() -> impl Strategy<Value = u64> {
    prop::sample::select(vec![
        Inheritance::Denovo,
        Inheritance::Mendelian,
        Inheritance::PossibleDenovo,
        Inheritance::PossibleOmission,
    ])
    .prop_map(|flag| flag.bits())
}

/// De novo and ultra-rare alleles are always below the rare boundary
fn arb_variant() -> impl Strategy<Value = Variant> {
    (arb_inheritance_flag(), 0u32..6, 0u32..100).prop_map(|(inheritance, count, f)| {
        let mut frequency = f64::from(f) / 4.0;
        let rare = inheritance == Inheritance::Denovo.bits() || count <= 1;
        if rare && frequency >= RARE_BOUNDARY {
            frequency -= RARE_BOUNDARY * (frequency / RARE_BOUNDARY).floor();
        }
        Variant {
            inheritance,
            allele_count: count,
            frequency,
        }
    })
}

fn arb_inheritance_queries() -> impl Strategy<Value = Option<Vec<InheritanceExpr>>> {
    prop::option::of(vec(generators::arb_inheritance_expr(), 0..3))
}

proptest! {
    /// Whenever a variant passes the exact filters its frequency bin is selected
    #[test]
    fn frequency_bins_never_exclude_matches(
        variant in arb_variant(),
        inheritance in arb_inheritance_queries(),
        ultra_rare in any::<bool>(),
        frequency_filter in generators::arb_frequency_filter(),
    ) {
        let passes = inheritance
            .as_deref()
            .unwrap_or_default()
            .iter()
            .all(|e| e.matches(variant.inheritance))
            && (!ultra_rare || variant.allele_count <= 1)
            && frequency_filter
                .as_deref()
                .unwrap_or_default()
                .iter()
                .all(|f| variant.in_range(f));
        if !passes {
            return Ok(());
        }

        let bins = frequency_bins(
            inheritance.as_deref(),
            ultra_rare,
            frequency_filter.as_deref(),
            RARE_BOUNDARY,
        );
        prop_assert!(
            bins.is_empty() || bins.contains(&variant.frequency_bin()),
            "bins {:?} miss {:?}",
            bins,
            variant
        );
    }

    /// Every position of a transcript lies inside the expanded gene windows
    #[test]
    fn gene_windows_cover_transcripts(
        transcripts in vec(
            (generators::arb_chrom(), 1u64..1_000_000, 0u64..50_000),
            1..4,
        ),
        offset in 0u64..50_000,
    ) {
        let transcripts: Vec<Transcript> = transcripts
            .into_iter()
            .map(|(chrom, tx_start, len)| Transcript { chrom, tx_start, tx_end: tx_start + len })
            .collect();
        let models = GeneModels::new([("G".to_string(), transcripts.clone())]);
        let windows = gene_regions(&["G".to_string()], None, &models).unwrap();

        for tx in &transcripts {
            let pos = tx.tx_start + offset.min(tx.tx_end - tx.tx_start);
            prop_assert!(windows.iter().any(|w| w.contains(&tx.chrom, pos)));
        }
    }

    /// Narrowing by genes keeps every explicit position that lies inside a gene window
    #[test]
    fn gene_windows_keep_explicit_overlap(
        explicit in generators::arb_regions(),
        tx_start in 1u64..100_000,
    ) {
        let tx = Transcript { chrom: "1".to_string(), tx_start, tx_end: tx_start + 1_000 };
        let window = Region::around("1", tx.tx_start, tx.tx_end, 20_000);
        let models = GeneModels::new([("G".to_string(), vec![tx])]);
        let narrowed = gene_regions(&["G".to_string()], Some(explicit.clone()), &models);

        if explicit.is_empty() {
            prop_assert_eq!(narrowed, Some(vec![window]));
            return Ok(());
        }
        let narrowed = narrowed.unwrap();
        for region in explicit.iter().filter(|r| r.chrom == "1") {
            for pos in [region.start, region.stop] {
                if window.contains("1", pos) {
                    prop_assert!(narrowed.iter().any(|n| n.contains("1", pos)));
                }
            }
        }
    }

    /// Too many genes disable the heuristic entirely
    #[test]
    fn gene_cutoff_passes_regions_through(
        extra in 1usize..5,
        regions in prop::option::of(generators::arb_regions()),
    ) {
        let genes: Vec<String> = (0..GENE_REGIONS_CUTOFF + extra).map(|i| format!("G{i}")).collect();
        let models = GeneModels::new(
            genes
                .iter()
                .map(|g| (g.clone(), vec![Transcript { chrom: "1".to_string(), tx_start: 1, tx_end: 2 }])),
        );
        prop_assert_eq!(gene_regions(&genes, regions.clone(), &models), regions);
    }

    /// Each position in a region maps to a bin the region selects
    #[test]
    fn region_bins_cover_positions(
        region in generators::arb_region(),
        region_length in 10u64..50_000,
        step in 0u64..20_000,
    ) {
        let properties = TableProperties {
            region_length,
            chromosomes: ["1", "2", "X"].iter().map(|c| c.to_string()).collect(),
            ..TableProperties::default()
        };
        let bins = region_bins(&properties, std::slice::from_ref(&region));
        let pos = region.start + step.min(region.stop - region.start);
        let chrom = if properties.chromosomes.contains(&region.chrom) {
            region.chrom.as_str()
        } else {
            "other"
        };
        let expected = format!("{chrom}_{}", pos / region_length);
        prop_assert!(bins.contains(&expected));
    }

    /// Region sets spanning too many bins produce no bins at all
    #[test]
    fn region_bins_fail_open_past_cutoff(
        regions in generators::arb_regions(),
        region_length in 1u64..20,
    ) {
        let properties = TableProperties {
            region_length,
            ..TableProperties::default()
        };
        let spanned: u64 = regions
            .iter()
            .map(|r| r.stop / region_length - r.start / region_length + 1)
            .sum();
        let bins = region_bins(&properties, &regions);
        if spanned > REGION_BINS_CUTOFF {
            prop_assert!(bins.is_empty());
        } else {
            prop_assert!(bins.len() as u64 <= spanned);
        }
    }

    /// The bins of the requested families always include each family's own bin
    #[test]
    fn family_bins_cover_requested_families(
        assignment in vec(0u32..8, 1..10),
        picks in vec(any::<prop::sample::Index>(), 1..4),
    ) {
        let members: Vec<PedigreeMember> = assignment
            .iter()
            .enumerate()
            .map(|(i, bin)| PedigreeMember {
                family_id: format!("f{i}"),
                person_id: format!("p{i}"),
                family_bin: Some(*bin),
            })
            .collect();
        let index = PedigreeIndex::from(members);
        let families: Vec<String> = picks.iter().map(|p| format!("f{}", p.index(assignment.len()))).collect();
        let bins = index.family_bins(families.iter().map(String::as_str), std::iter::empty());

        for family in &families {
            let i: usize = family[1..].parse().unwrap();
            prop_assert!(bins.contains(&assignment[i]));
        }
    }
}
