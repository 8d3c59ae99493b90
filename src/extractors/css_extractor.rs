//! CSS selector-based extraction scoped to one element
//!
//! Uses the scraper crate. All text is whitespace-trimmed and otherwise left
//! as the site wrote it.

use scraper::{ElementRef, Selector};

/// Trimmed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the first descendant of `scope` matching `selector`
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

/// Text of every descendant of `scope` matching `selector`, in document order
pub fn all_text(scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    scope.select(selector).map(element_text).collect()
}

/// Nearest element named `tag`, starting with `element` itself and walking up
pub fn closest<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    if element.value().name() == tag {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
}

/// Text of the first match, or an empty string when the selector is absent
/// or matches nothing
pub fn text_or_default(scope: ElementRef<'_>, selector: Option<&Selector>) -> String {
    selector
        .and_then(|sel| first_text(scope, sel))
        .unwrap_or_default()
}
