//! Genomic regions
//!
//! 1-based, inclusive `(chrom, start, stop)` triples. Used both for explicit region
//! filters and as the output of the gene→region heuristic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub stop: u64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, stop: u64) -> Self {
        Region {
            chrom: chrom.into(),
            start,
            stop,
        }
    }

    /// `[start - margin, stop + margin]`, clamped to position 1
    pub fn around(chrom: impl Into<String>, start: u64, stop: u64, margin: u64) -> Self {
        Region::new(
            chrom,
            start.saturating_sub(margin).max(1),
            stop.saturating_add(margin),
        )
    }

    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && self.start <= pos && pos <= self.stop
    }

    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if self.chrom != other.chrom {
            return None;
        }
        let start = self.start.max(other.start);
        let stop = self.stop.min(other.stop);
        (start <= stop).then(|| Region::new(self.chrom.clone(), start, stop))
    }
}

/// Sort by chromosome then start and merge regions that overlap. Adjacent regions
/// (`1-2`, `3-4`) stay separate.
pub fn collapse(mut regions: Vec<Region>) -> Vec<Region> {
    regions.sort();

    let mut merged: Vec<Region> = Vec::with_capacity(regions.len());
    for region in regions {
        match merged.last_mut() {
            Some(last) if last.chrom == region.chrom && region.start <= last.stop => {
                last.stop = last.stop.max(region.stop);
            }
            _ => merged.push(region),
        }
    }
    merged
}

fn parse_position(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for Region {
    type Err = QueryError;

    /// `chrom:start-stop` or `chrom:pos`; positions may use thousands separators
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidRegion(s.to_string());

        let (chrom, span) = s.trim().split_once(':').ok_or_else(invalid)?;
        if chrom.is_empty() {
            return Err(invalid());
        }
        let (start, stop) = match span.split_once('-') {
            Some((start, stop)) => (
                parse_position(start).ok_or_else(invalid)?,
                parse_position(stop).ok_or_else(invalid)?,
            ),
            None => {
                let pos = parse_position(span).ok_or_else(invalid)?;
                (pos, pos)
            }
        };
        if start == 0 || start > stop {
            return Err(invalid());
        }
        Ok(Region::new(chrom, start, stop))
    }
}

impl TryFrom<String> for Region {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.to_string()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.stop)
    }
}

// Unit tests live in tests/unit_regions.rs
