//! Scrape orchestration
//!
//! Turns one loaded results page into a batch of records. Pure with respect
//! to storage and network: the only input is the page HTML and its URL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::error::ScrapeError;
use crate::extractors::{extract_fields, DescriptionExpander, ExtractContext, StaticExpander};
use crate::record::ListingRecord;
use crate::sites::Registry;

/// Default bound on waiting for a truncated description to expand.
pub const DEFAULT_EXPANSION_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct ScrapeOptions {
    /// Upper bound on description expansion per container
    pub expansion_timeout: Duration,
    pub expander: Arc<dyn DescriptionExpander>,
    /// Fixed capture time; `None` uses the current time
    pub captured_at: Option<DateTime<Utc>>,
    /// Checked between containers
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            expansion_timeout: DEFAULT_EXPANSION_TIMEOUT,
            expander: Arc::new(StaticExpander),
            captured_at: None,
            cancel: None,
        }
    }
}

impl ScrapeOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Records from one page plus counts of what was left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeBatch {
    pub source: String,
    pub records: Vec<ListingRecord>,
    /// Containers without a title
    pub skipped: usize,
    /// Containers whose extraction failed
    pub failed: usize,
}

impl ScrapeBatch {
    pub fn containers(&self) -> usize {
        self.records.len() + self.skipped + self.failed
    }
}

/// Scrape every listing container on a page.
///
/// Fails only for page-level problems: no adapter for the host, an
/// unparseable page URL, or cancellation. Individual containers that fail
/// are logged and counted, and the remaining containers are still processed.
pub fn scrape_page(
    html: &str,
    page_url: &str,
    registry: &Registry,
    options: &ScrapeOptions,
) -> Result<ScrapeBatch, ScrapeError> {
    let page_url = Url::parse(page_url).map_err(|e| ScrapeError::InvalidPageUrl {
        url: page_url.to_string(),
        reason: e.to_string(),
    })?;
    let adapter = registry.resolve_url(&page_url)?;

    let timestamp = options
        .captured_at
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let ctx = ExtractContext {
        adapter,
        page_url: &page_url,
        metadata_keys: registry.metadata_keys(),
        timestamp: &timestamp,
        expander: &options.expander,
        expansion_timeout: options.expansion_timeout,
    };

    let document = Html::parse_document(html);
    let mut batch = ScrapeBatch {
        source: adapter.source().to_string(),
        ..ScrapeBatch::default()
    };

    for (index, container) in document.select(&adapter.container).enumerate() {
        if options.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }
        match extract_fields(container, &ctx) {
            Ok(Some(record)) => batch.records.push(record),
            Ok(None) => {
                debug!(index, source = %batch.source, "container without title skipped");
                batch.skipped += 1;
            }
            Err(e) => {
                warn!(index, source = %batch.source, error = %e, "failed to extract listing");
                batch.failed += 1;
            }
        }
    }

    debug!(
        source = %batch.source,
        records = batch.records.len(),
        skipped = batch.skipped,
        failed = batch.failed,
        "page scraped"
    );
    Ok(batch)
}
