//! Last-write-wins merge keyed by listing id

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::record::ListingRecord;

/// Outcome of merging one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Records in the incoming batch
    pub batch: usize,
    /// Batch records whose id was not stored before
    pub new: usize,
    /// Batch records that replaced an existing id, or repeated an id within the batch
    pub duplicates: usize,
    /// Records in the merged collection
    pub total: usize,
}

/// Merge `batch` into `existing`.
///
/// Existing ids keep their position and take the batch's version wholesale;
/// unseen ids are appended in batch order. When an id repeats inside the
/// batch, the later record wins.
pub fn merge_batch(
    existing: Vec<ListingRecord>,
    batch: Vec<ListingRecord>,
) -> (Vec<ListingRecord>, MergeStats) {
    let existing_count = existing.len();
    let batch_count = batch.len();

    let mut merged: Vec<ListingRecord> = Vec::with_capacity(existing_count + batch_count);
    let mut index: HashMap<String, usize> = HashMap::with_capacity(existing_count + batch_count);

    for record in existing.into_iter().chain(batch) {
        match index.get(&record.id) {
            Some(&slot) => merged[slot] = record,
            None => {
                index.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    // A stored collection that already held repeated ids collapses here,
    // so `new` saturates rather than going negative.
    if merged.len() < existing_count {
        warn!(
            stored = existing_count,
            merged = merged.len(),
            "stored listings held repeated ids; counts for this merge are approximate"
        );
    }
    let new = merged.len().saturating_sub(existing_count);
    let stats = MergeStats {
        batch: batch_count,
        new,
        duplicates: batch_count - new.min(batch_count),
        total: merged.len(),
    };
    (merged, stats)
}
