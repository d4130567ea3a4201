//! Core data models used throughout the ingestion pipeline.
//!
//! These types represent the raw extract rows, the normalized tables built
//! from them, and the lookup results returned by the query layer.

use serde::Serialize;
use std::fmt;

/// Number of proprietor name / country column pairs in each extract row.
pub const PROPRIETOR_SLOTS: usize = 4;

/// Footer row the registry appends to each extract.
pub const ROW_COUNT_SENTINEL: &str = "Row Count";

/// Country assumed for domestic-extract owners with no recorded country.
pub const HOME_JURISDICTION: &str = "UK";

/// Which of the two registry extracts a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    /// UK companies that own property (CCOD).
    Domestic,
    /// Overseas companies that own property (OCOD).
    Overseas,
}

impl SourceTag {
    /// Build order: domestic rows are concatenated before overseas rows.
    pub const ALL: [SourceTag; 2] = [SourceTag::Domestic, SourceTag::Overseas];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Domestic => "domestic",
            SourceTag::Overseas => "overseas",
        }
    }

    /// The registry's dataset code for this extract.
    pub fn dataset_code(&self) -> &'static str {
        match self {
            SourceTag::Domestic => "CCOD",
            SourceTag::Overseas => "OCOD",
        }
    }

    /// Only the overseas extract carries `Country Incorporated (n)` columns.
    pub fn has_country_columns(&self) -> bool {
        matches!(self, SourceTag::Overseas)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proprietor column pair from an extract row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProprietorSlot {
    pub name: Option<String>,
    pub country: Option<String>,
}

/// One title row as it appears in a source extract, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub title_number: String,
    pub address: Option<String>,
    pub price: Option<f64>,
    pub proprietors: [ProprietorSlot; PROPRIETOR_SLOTS],
    pub source: SourceTag,
}

impl RawRecord {
    pub fn is_footer(&self) -> bool {
        self.title_number == ROW_COUNT_SENTINEL
    }
}

/// A populated proprietor slot in long format, owner name already canonical.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerSlot {
    pub title_number: String,
    pub owner: String,
    pub country: Option<String>,
    pub source: SourceTag,
}

/// Normalized `titles` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub title_id: i64,
    pub title_number: String,
    pub address: Option<String>,
    pub price: Option<f64>,
}

/// Normalized `owners` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Owner {
    pub owner_id: i64,
    pub owner: String,
    pub country: Option<String>,
    pub source: SourceTag,
}

/// Normalized `titles_owners` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TitleOwnerLink {
    pub title_id: i64,
    pub owner_id: i64,
}

/// The three relations produced by one build.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub titles: Vec<Title>,
    pub owners: Vec<Owner>,
    pub links: Vec<TitleOwnerLink>,
}

/// Effective country of incorporation for display and export.
///
/// Domestic-extract owners with no recorded country are incorporated in the
/// registry's own jurisdiction. Overseas owners keep whatever was recorded,
/// including nothing.
pub fn effective_country(country: Option<&str>, source: &str) -> Option<String> {
    match country {
        Some(c) => Some(c.to_string()),
        None if source == SourceTag::Domestic.as_str() => Some(HOME_JURISDICTION.to_string()),
        None => None,
    }
}
