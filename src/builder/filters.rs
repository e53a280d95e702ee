//! Query inputs
//!
//! Every filter is optional. `None` means "not filtered"; an empty list is a real
//! filter that matches only missing values.

use serde::{Deserialize, Serialize};

use crate::region::Region;

/// Inclusive numeric range on one attribute; an absent bound is open
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub attribute: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl RangeFilter {
    pub fn new(attribute: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        RangeFilter {
            attribute: attribute.into(),
            min,
            max,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryFilters {
    pub regions: Option<Vec<Region>>,
    pub genes: Option<Vec<String>>,
    pub effect_types: Option<Vec<String>>,
    pub family_ids: Option<Vec<String>>,
    pub person_ids: Option<Vec<String>>,
    /// Inheritance-language queries; each one must hold
    pub inheritance: Option<Vec<String>>,
    /// Attribute-language queries over bitmask columns
    pub roles: Option<String>,
    pub sexes: Option<String>,
    pub affected_statuses: Option<String>,
    pub variant_type: Option<String>,
    pub real_attr_filter: Option<Vec<RangeFilter>>,
    pub frequency_filter: Option<Vec<RangeFilter>>,
    pub ultra_rare: bool,
    pub return_reference: bool,
    pub return_unknown: bool,
    pub limit: Option<u64>,
}

/// Shape of the statement around the WHERE clause
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryKind {
    /// One row per family variant, with the matching allele indexes concatenated
    #[default]
    FamilyVariants,
    /// One row per summary variant; optionally only those seen in enough families
    SummaryVariants {
        #[serde(default)]
        min_families: Option<u32>,
    },
    Count,
}
