//! JSON snapshot export

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::ListingRecord;
use crate::store::{write_atomic, JobStore, KeyValueBackend};

pub const SCHEMA_VERSION: u32 = 1;

/// The exported file: a versioned envelope around the stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub schema_version: u32,
    pub exported_at: String,
    pub jobs: Vec<ListingRecord>,
}

impl Snapshot {
    pub fn new(jobs: Vec<ListingRecord>, exported_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            jobs,
        }
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `jobs_<date>.json`
pub fn default_export_filename(date: NaiveDate) -> String {
    format!("jobs_{}.json", date.format("%Y-%m-%d"))
}

/// Write the whole store to `path` as pretty-printed JSON. Returns the
/// number of records written.
pub fn export_snapshot<B: KeyValueBackend>(
    store: &JobStore<B>,
    path: &Path,
) -> Result<usize, StoreError> {
    let snapshot = Snapshot::new(store.records()?, Utc::now());
    let json = snapshot.to_pretty_json()?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!(path = %path.display(), jobs = snapshot.jobs.len(), "exported snapshot");
    Ok(snapshot.jobs.len())
}
