//! Upwork job search results (`/nx/search/jobs`)

use super::{AdapterProfile, FieldSelectors, IdentityRule, LinkRule};
use crate::pagination::PageRule;

pub fn profile() -> AdapterProfile {
    AdapterProfile {
        source: "upwork.com".to_string(),
        hosts: vec!["upwork.com".to_string()],
        selectors: FieldSelectors {
            container: "article.job-tile".to_string(),
            title: "h2.job-tile-title a".to_string(),
            description: Some("p.mb-0.text-body-sm".to_string()),
            budget: Some(
                r#"[data-test="JobInfo"] [data-test="is-fixed-price"] strong:last-child"#
                    .to_string(),
            ),
            // "pubilshed" is how the site spells it
            posted: Some(r#"[data-test="job-pubilshed-date"] span:last-child"#.to_string()),
            skills: Some(".air3-token span".to_string()),
        },
        link: LinkRule::TitleHref,
        // Job URLs end in an opaque ciphertext: /jobs/Some-Title_~01abc...?referrer=
        identity: IdentityRule {
            pattern: r"~([^?]+)".to_string(),
            group: 1,
        },
        metadata: vec![
            (
                "location".to_string(),
                r#"[data-test="location"] .air3-badge-tagline"#.to_string(),
            ),
            (
                "experience".to_string(),
                r#"[data-test="experience-level"] strong"#.to_string(),
            ),
            (
                "proposals".to_string(),
                r#"[data-test="proposals-tier"] strong"#.to_string(),
            ),
        ],
        expand_control: None,
        pagination: Some(PageRule::QueryParam {
            name: "page".to_string(),
        }),
    }
}
