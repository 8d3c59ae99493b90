//! Site adapter registry
//!
//! Each supported job board is described by an [`AdapterProfile`]: plain data
//! naming the CSS selectors, link rule, identity pattern and metadata fields
//! for that site. Profiles are compiled once into a [`SiteAdapter`] and looked
//! up by page host. Supporting a new site means adding a profile; nothing in
//! the extractor, orchestrator or store branches on the site.

mod freelancer;
mod upwork;

use std::collections::BTreeSet;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::ScrapeError;
use crate::pagination::PageRule;

/// CSS selectors for the record fields, relative to one listing container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelectors {
    /// Matches every listing container on a results page
    pub container: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub posted: Option<String>,
    /// Matches each skill tag; all matches are collected in document order
    #[serde(default)]
    pub skills: Option<String>,
}

/// Where the listing's link lives relative to the title element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRule {
    /// `href` of the title element itself
    TitleHref,
    /// `href` of the nearest `<a>` enclosing the container
    AncestorHref,
}

/// Pulls a stable sub-token out of a listing URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRule {
    pub pattern: String,
    /// Capture group holding the identity
    #[serde(default = "default_group")]
    pub group: usize,
}

fn default_group() -> usize {
    1
}

/// Declarative description of one job board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterProfile {
    /// Tag written to `ListingRecord::source`
    pub source: String,
    /// Host names served by this adapter; subdomains match too
    pub hosts: Vec<String>,
    pub selectors: FieldSelectors,
    pub link: LinkRule,
    pub identity: IdentityRule,
    /// Metadata key -> selector
    #[serde(default)]
    pub metadata: Vec<(String, String)>,
    /// Control that reveals a truncated description
    #[serde(default)]
    pub expand_control: Option<String>,
    #[serde(default)]
    pub pagination: Option<PageRule>,
}

/// An [`AdapterProfile`] with its selectors and pattern compiled.
#[derive(Debug)]
pub struct SiteAdapter {
    pub profile: AdapterProfile,
    pub(crate) container: Selector,
    pub(crate) title: Selector,
    pub(crate) description: Option<Selector>,
    pub(crate) budget: Option<Selector>,
    pub(crate) posted: Option<Selector>,
    pub(crate) skills: Option<Selector>,
    pub(crate) metadata: Vec<(String, Selector)>,
    pub(crate) expand_control: Option<Selector>,
    pub(crate) identity: Regex,
}

impl SiteAdapter {
    pub fn compile(profile: AdapterProfile) -> Result<Self, ScrapeError> {
        let source = profile.source.clone();
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| ScrapeError::InvalidProfile {
                source_name: source.clone(),
                reason: format!("selector '{}': {}", css, e),
            })
        };
        let parse_opt = |css: &Option<String>| css.as_deref().map(parse).transpose();

        let sel = &profile.selectors;
        let container = parse(&sel.container)?;
        let title = parse(&sel.title)?;
        let description = parse_opt(&sel.description)?;
        let budget = parse_opt(&sel.budget)?;
        let posted = parse_opt(&sel.posted)?;
        let skills = parse_opt(&sel.skills)?;
        let expand_control = parse_opt(&profile.expand_control)?;

        let metadata = profile
            .metadata
            .iter()
            .map(|(key, css)| parse(css).map(|s| (key.clone(), s)))
            .collect::<Result<Vec<_>, _>>()?;

        let identity = Regex::new(&profile.identity.pattern).map_err(|e| {
            ScrapeError::InvalidProfile {
                source_name: source.clone(),
                reason: format!("identity pattern: {}", e),
            }
        })?;
        if profile.identity.group >= identity.captures_len() {
            return Err(ScrapeError::InvalidProfile {
                source_name: source,
                reason: format!(
                    "identity group {} out of range for '{}'",
                    profile.identity.group, profile.identity.pattern
                ),
            });
        }

        Ok(Self {
            profile,
            container,
            title,
            description,
            budget,
            posted,
            skills,
            metadata,
            expand_control,
            identity,
        })
    }

    pub fn source(&self) -> &str {
        &self.profile.source
    }

    /// Exact host or any subdomain of a declared host.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.profile.hosts.iter().any(|h| {
            let h = h.to_ascii_lowercase();
            host == h || host.ends_with(&format!(".{}", h))
        })
    }
}

/// Built-in profiles, in lookup order.
pub fn builtin_profiles() -> Vec<AdapterProfile> {
    vec![upwork::profile(), freelancer::profile()]
}

/// Lookup table from page host to adapter.
#[derive(Debug)]
pub struct Registry {
    adapters: Vec<SiteAdapter>,
    metadata_keys: BTreeSet<String>,
}

impl Registry {
    pub fn builtin() -> Result<Self, ScrapeError> {
        Self::with_profiles(builtin_profiles())
    }

    pub fn with_profiles(profiles: Vec<AdapterProfile>) -> Result<Self, ScrapeError> {
        let adapters = profiles
            .into_iter()
            .map(SiteAdapter::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let metadata_keys = adapters
            .iter()
            .flat_map(|a| a.profile.metadata.iter().map(|(k, _)| k.clone()))
            .collect();
        Ok(Self { adapters, metadata_keys })
    }

    /// Built-in profiles plus extra ones. An extra profile whose `source`
    /// equals a built-in replaces it.
    pub fn with_extra(extra: Vec<AdapterProfile>) -> Result<Self, ScrapeError> {
        let mut profiles = builtin_profiles();
        for p in extra {
            match profiles.iter_mut().find(|b| b.source == p.source) {
                Some(slot) => *slot = p,
                None => profiles.push(p),
            }
        }
        Self::with_profiles(profiles)
    }

    pub fn resolve(&self, host: &str) -> Result<&SiteAdapter, ScrapeError> {
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.matches_host(host))
            .ok_or_else(|| ScrapeError::UnsupportedSite(host.to_string()))?;
        debug!(host, source = adapter.source(), "resolved site adapter");
        Ok(adapter)
    }

    pub fn resolve_url(&self, page_url: &Url) -> Result<&SiteAdapter, ScrapeError> {
        let host = page_url
            .host_str()
            .ok_or_else(|| ScrapeError::UnsupportedSite(page_url.to_string()))?;
        self.resolve(host)
    }

    /// Union of every adapter's metadata keys; the shared record shape.
    pub fn metadata_keys(&self) -> &BTreeSet<String> {
        &self.metadata_keys
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.source())
    }
}
