//! Job listing scraper for freelance job boards
//!
//! Turns loaded results pages into canonical job records and keeps them in a
//! duplicate-free store:
//! - Site adapters (Upwork, Freelancer.com) as declarative profiles
//! - Per-container field extraction with total defaults
//! - Identity derivation from listing URLs
//! - Last-write-wins merge into a key-value store
//! - Versioned JSON export

pub mod config;
pub mod error;
pub mod export;
pub mod extractors;
pub mod ffi;
pub mod identity;
pub mod pagination;
pub mod record;
pub mod scrape;
pub mod sites;
pub mod store;

pub use error::{ConfigError, ExtractError, ScrapeError, StoreError};
pub use export::{export_snapshot, Snapshot, SCHEMA_VERSION};
pub use record::{ListingRecord, Metadata};
pub use scrape::{scrape_page, ScrapeBatch, ScrapeOptions};
pub use sites::{AdapterProfile, Registry, SiteAdapter};
pub use store::{merge_batch, FileBackend, JobStore, KeyValueBackend, MemoryBackend, MergeStats};
