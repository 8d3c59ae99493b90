//! Per-container field extraction
//!
//! Turns one listing container into a [`ListingRecord`] using the adapter's
//! selectors. Optional fields never fail: a selector that matches nothing
//! yields an empty string, an empty skill list, or `null` metadata. Only the
//! title and its link are mandatory.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use scraper::ElementRef;
use url::Url;

use super::css_extractor::{all_text, closest, element_text, text_or_default};
use super::expand::{expand_within, DescriptionExpander, ExpandRequest};
use crate::error::ExtractError;
use crate::identity::derive_id;
use crate::record::{ListingRecord, Metadata};
use crate::sites::{LinkRule, SiteAdapter};

/// Everything the extractor needs besides the container itself.
pub struct ExtractContext<'a> {
    pub adapter: &'a SiteAdapter,
    /// Base for resolving relative links
    pub page_url: &'a Url,
    /// Keys every record's metadata must carry
    pub metadata_keys: &'a BTreeSet<String>,
    pub timestamp: &'a str,
    pub expander: &'a Arc<dyn DescriptionExpander>,
    pub expansion_timeout: Duration,
}

/// Extract one record.
///
/// `Ok(None)` when the container has no title (ads, separators and other
/// non-job nodes caught by a broad container selector). `Err` when a title is
/// present but its link cannot be turned into an absolute URL.
pub fn extract_fields(
    container: ElementRef<'_>,
    ctx: &ExtractContext<'_>,
) -> Result<Option<ListingRecord>, ExtractError> {
    let adapter = ctx.adapter;

    let Some(title_el) = container.select(&adapter.title).next() else {
        return Ok(None);
    };
    let title = element_text(title_el);
    if title.is_empty() {
        return Ok(None);
    }

    let href = match adapter.profile.link {
        LinkRule::TitleHref => title_el.value().attr("href"),
        LinkRule::AncestorHref => closest(container, "a").and_then(|a| a.value().attr("href")),
    }
    .map(str::trim)
    .filter(|h| !h.is_empty())
    .ok_or_else(|| ExtractError::MissingLink { title: title.clone() })?;
    let url = resolve_link(ctx.page_url, href)?;

    let description = expanded_description(container, ctx)
        .unwrap_or_else(|| text_or_default(container, adapter.description.as_ref()));

    let skills = adapter
        .skills
        .as_ref()
        .map(|sel| all_text(container, sel))
        .unwrap_or_default();

    let mut metadata: Metadata = ctx.metadata_keys.iter().map(|k| (k.clone(), None)).collect();
    for (key, selector) in &adapter.metadata {
        metadata.insert(key.clone(), Some(text_or_default(container, Some(selector))));
    }

    Ok(Some(ListingRecord {
        id: derive_id(&url, adapter),
        source: adapter.source().to_string(),
        title,
        url,
        description,
        budget: text_or_default(container, adapter.budget.as_ref()),
        posted: text_or_default(container, adapter.posted.as_ref()),
        skills,
        metadata,
        timestamp: ctx.timestamp.to_string(),
    }))
}

fn expanded_description(container: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Option<String> {
    let control_sel = ctx.adapter.expand_control.as_ref()?;
    container.select(control_sel).next()?;
    let request = ExpandRequest {
        container_html: container.html(),
        control: ctx.adapter.profile.expand_control.clone()?,
    };
    expand_within(ctx.expander, request, ctx.expansion_timeout)
}

fn resolve_link(page_url: &Url, href: &str) -> Result<String, ExtractError> {
    let url = page_url.join(href).map_err(|e| ExtractError::BadLink {
        href: href.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(ExtractError::BadLink {
            href: href.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
