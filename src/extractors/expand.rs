//! Best-effort reveal of truncated descriptions
//!
//! Some sites clip long descriptions behind a "read more" control. Before the
//! description field is read, the extractor hands the container's markup to a
//! [`DescriptionExpander`] running on a helper thread and waits for it at most
//! the expansion timeout. An expander that is late, hangs or panics leaves the
//! field with the text already present (possibly truncated). Expansion never
//! fails a record.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::css_extractor::element_text;

/// A truncated listing awaiting expansion. Owned, so it can cross threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandRequest {
    /// Outer HTML of the listing container
    pub container_html: String,
    /// Selector of the "read more" control inside the container
    pub control: String,
}

pub trait DescriptionExpander: Send + Sync {
    /// Full description text revealed by the request's control, if any.
    fn expand(&self, request: &ExpandRequest) -> Option<String>;
}

/// Reads the full text a static page snapshot already carries for the
/// control: a `data-full-text` attribute, or the element named by
/// `aria-controls` inside the container.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticExpander;

impl DescriptionExpander for StaticExpander {
    fn expand(&self, request: &ExpandRequest) -> Option<String> {
        let fragment = Html::parse_fragment(&request.container_html);
        let control_sel = Selector::parse(&request.control).ok()?;
        let control = fragment.select(&control_sel).next()?;

        let attrs = control.value();
        if let Some(full) = attrs.attr("data-full-text") {
            let full = full.trim();
            if !full.is_empty() {
                return Some(full.to_string());
            }
        }

        let target = attrs.attr("aria-controls")?;
        let selector = Selector::parse(&format!(r#"[id="{}"]"#, target.replace('"', ""))).ok()?;
        fragment
            .select(&selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
    }
}

/// Run `expander` on a helper thread and wait at most `timeout` for its
/// answer. A late answer is dropped together with its thread.
pub(crate) fn expand_within(
    expander: &Arc<dyn DescriptionExpander>,
    request: ExpandRequest,
    timeout: Duration,
) -> Option<String> {
    if timeout.is_zero() {
        return None;
    }

    let (sender, receiver) = mpsc::sync_channel(1);
    let expander = Arc::clone(expander);
    let spawned = thread::Builder::new()
        .name("jobscrape-expand".to_string())
        .spawn(move || {
            // the receiver is gone once the wait timed out
            let _ = sender.send(expander.expand(&request));
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not start description expansion");
        return None;
    }

    match receiver.recv_timeout(timeout) {
        Ok(text) => text.filter(|t| !t.trim().is_empty()),
        Err(RecvTimeoutError::Timeout) => {
            debug!(?timeout, "description expansion missed its deadline; using visible text");
            None
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!("description expander stopped without an answer");
            None
        }
    }
}
