//! Results-page navigation helpers
//!
//! Computes the current page number and the next/previous page URL for a
//! results page. Navigation itself belongs to the caller.

use serde::{Deserialize, Serialize};
use url::Url;

/// How a site encodes the page number in its URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageRule {
    /// `?<name>=<n>`
    QueryParam { name: String },
    /// `/<after>[/<category>][/<n>]`
    PathSegment { after: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Page number shown by `url`; 1 when none is encoded.
pub fn current_page(url: &Url, rule: &PageRule) -> u32 {
    match rule {
        PageRule::QueryParam { name } => url
            .query_pairs()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1),
        PageRule::PathSegment { after } => path_parts(url, after)
            .and_then(|(_, _, page)| page)
            .unwrap_or(1),
    }
}

/// URL of the adjacent page. Going back from page 1 stays on page 1.
pub fn page_url(url: &Url, rule: &PageRule, direction: Direction) -> Url {
    let current = current_page(url, rule);
    let target = match direction {
        Direction::Next => current.saturating_add(1),
        Direction::Previous => current.saturating_sub(1).max(1),
    };

    let mut out = url.clone();
    match rule {
        PageRule::QueryParam { name } => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != name)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            let mut pairs = out.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(name, &target.to_string());
        }
        PageRule::PathSegment { after } => {
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            match path_parts(url, after) {
                Some((anchor, category, _)) => {
                    let mut path: Vec<String> =
                        segments[..=anchor].iter().map(|s| s.to_string()).collect();
                    if let Some(category) = category {
                        path.push(category.to_string());
                    }
                    path.push(target.to_string());
                    out.set_path(&format!("/{}", path.join("/")));
                }
                None => {
                    let mut path: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
                    path.push(after.clone());
                    path.push(target.to_string());
                    out.set_path(&format!("/{}", path.join("/")));
                }
            }
        }
    }
    out
}

/// Splits the path around the anchor segment:
/// (anchor index, optional category, optional page number)
fn path_parts<'a>(url: &'a Url, after: &str) -> Option<(usize, Option<&'a str>, Option<u32>)> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let anchor = segments.iter().position(|s| *s == after)?;
    let rest = &segments[anchor + 1..];

    let (category, page) = match rest {
        [] => (None, None),
        [only] => match only.parse::<u32>() {
            Ok(n) => (None, Some(n)),
            Err(_) => (Some(*only), None),
        },
        [category, page, ..] => (Some(*category), page.parse::<u32>().ok()),
    };
    Some((anchor, category, page.filter(|&n| n > 0)))
}
