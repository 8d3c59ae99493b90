//! Error types for each layer of the pipeline

use std::io;

use thiserror::Error;

/// Failures that abort a whole scrape invocation.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no site adapter for '{0}'")]
    UnsupportedSite(String),
    #[error("invalid page url '{url}': {reason}")]
    InvalidPageUrl { url: String, reason: String },
    #[error("adapter '{source_name}' is invalid: {reason}")]
    InvalidProfile { source_name: String, reason: String },
    #[error("scrape cancelled")]
    Cancelled,
}

/// Failures confined to a single listing container.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("listing '{title}' has no link")]
    MissingLink { title: String },
    #[error("listing link '{href}' is not resolvable: {reason}")]
    BadLink { href: String, reason: String },
}

/// Failures of the persistence layer, surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("stored value under '{key}' is corrupt: {details}")]
    Corrupt { key: String, details: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("parsing config {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("$JOBSCRAPE_CONFIG points to missing file {0}")]
    MissingEnvPath(String),
}
