//! The canonical job listing record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Adapter-specific extras. Keys not applicable to the producing adapter
/// are present with a `null` value.
pub type Metadata = BTreeMap<String, Option<String>>;

/// One job listing as persisted and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub posted: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// RFC 3339 capture time, set once at extraction.
    pub timestamp: String,
}
