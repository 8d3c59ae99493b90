//! Listing identity derivation
//!
//! The identity is the capture the adapter's pattern pulls out of the
//! listing URL. When the pattern does not match, the full URL is the
//! identity: records then only collide on identical URLs, so a site that
//! changes its URL scheme degrades dedup granularity instead of failing.

use crate::sites::SiteAdapter;

pub fn derive_id(url: &str, adapter: &SiteAdapter) -> String {
    adapter
        .identity
        .captures(url)
        .and_then(|caps| caps.get(adapter.profile.identity.group))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::Registry;

    #[test]
    fn test_upwork_ciphertext() {
        let registry = Registry::builtin().unwrap();
        let upwork = registry.resolve("www.upwork.com").unwrap();

        let url = "https://www.upwork.com/jobs/Rust-backend-engineer_~021234abcd?referrer_url_path=%2Fnx%2Fsearch";
        assert_eq!(derive_id(url, upwork), "021234abcd");
    }

    #[test]
    fn test_freelancer_numeric_id() {
        let registry = Registry::builtin().unwrap();
        let freelancer = registry.resolve("www.freelancer.com").unwrap();

        let url = "https://www.freelancer.com/projects/php/website-39912345";
        assert_eq!(derive_id(url, freelancer), "39912345");
    }

    #[test]
    fn test_falls_back_to_full_url() {
        let registry = Registry::builtin().unwrap();
        let upwork = registry.resolve("upwork.com").unwrap();
        let freelancer = registry.resolve("freelancer.com").unwrap();

        let url = "https://www.upwork.com/jobs/no-tilde-here";
        assert_eq!(derive_id(url, upwork), url);

        // hyphenated slugs do not fit the pattern
        let url = "https://www.freelancer.com/projects/php/build-a-website-42";
        assert_eq!(derive_id(url, freelancer), url);
    }

    #[test]
    fn test_empty_capture_falls_back() {
        let registry = Registry::builtin().unwrap();
        let upwork = registry.resolve("upwork.com").unwrap();

        let url = "https://www.upwork.com/jobs/~";
        assert_eq!(derive_id(url, upwork), url);
    }
}
