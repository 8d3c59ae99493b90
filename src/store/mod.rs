//! Persistent, duplicate-free collection of job listings
//!
//! The whole collection lives under one key of a [`KeyValueBackend`] as a
//! JSON array. Every merge is a single backend `update`, so concurrent
//! callers on the same store, even through separate handles, never lose each
//! other's merges and no reader ever sees a half-merged collection.

mod backend;
mod merge;

pub use backend::*;
pub use merge::*;
pub(crate) use backend::{json_kind, write_atomic};

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::error::StoreError;
use crate::record::ListingRecord;

/// Key the collection is persisted under.
pub const JOBS_KEY: &str = "jobs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Empty,
    Populated,
}

#[derive(Debug)]
pub struct JobStore<B> {
    backend: B,
    key: String,
}

impl<B: KeyValueBackend> JobStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, JOBS_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Write an empty collection if nothing is stored yet.
    pub fn init(&self) -> Result<(), StoreError> {
        self.backend.update(&self.key, &mut |current| {
            Ok(current.is_none().then(|| Value::Array(vec![])))
        })
    }

    pub fn records(&self) -> Result<Vec<ListingRecord>, StoreError> {
        self.decode(self.backend.get(&self.key)?)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn state(&self) -> Result<StoreState, StoreError> {
        Ok(if self.is_empty()? {
            StoreState::Empty
        } else {
            StoreState::Populated
        })
    }

    /// Merge `batch` into the stored collection, newest record per id wins.
    ///
    /// On error nothing is written and the previous collection stays intact.
    pub fn merge_batch(&self, batch: Vec<ListingRecord>) -> Result<MergeStats, StoreError> {
        let mut batch = Some(batch);
        let mut stats = MergeStats::default();
        self.backend.update(&self.key, &mut |current| {
            let existing = self.decode(current)?;
            let (merged, merge_stats) = merge_batch(existing, batch.take().unwrap_or_default());
            stats = merge_stats;
            if stats.batch == 0 {
                return Ok(None);
            }
            Ok(Some(serde_json::to_value(&merged)?))
        })?;
        info!(
            batch = stats.batch,
            new = stats.new,
            duplicates = stats.duplicates,
            total = stats.total,
            "merged listings"
        );
        Ok(stats)
    }

    /// Drop every stored record, replacing whatever is stored, even a
    /// collection that no longer parses.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.set(&self.key, Value::Array(vec![]))?;
        info!("cleared stored listings");
        Ok(())
    }

    /// Record count per `source`, sorted by source.
    pub fn counts_by_source(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let mut counts = BTreeMap::new();
        for record in self.records()? {
            *counts.entry(record.source).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn decode(&self, value: Option<Value>) -> Result<Vec<ListingRecord>, StoreError> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value @ Value::Array(_)) => serde_json::from_value(value).map_err(|e| {
                StoreError::Corrupt {
                    key: self.key.clone(),
                    details: e.to_string(),
                }
            }),
            Some(other) => Err(StoreError::Corrupt {
                key: self.key.clone(),
                details: format!("expected an array, found {}", json_kind(&other)),
            }),
        }
    }
}
