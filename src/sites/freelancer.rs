//! Freelancer.com project listings (`/jobs[/<category>][/<page>]`)

use super::{AdapterProfile, FieldSelectors, IdentityRule, LinkRule};
use crate::pagination::PageRule;

pub fn profile() -> AdapterProfile {
    AdapterProfile {
        source: "freelancer.com".to_string(),
        hosts: vec!["freelancer.com".to_string()],
        selectors: FieldSelectors {
            container: "fl-project-contest-card".to_string(),
            title: r#"fl-heading h2[data-size="mid"]"#.to_string(),
            description: Some(
                r#"fl-text[data-type="paragraph"][data-max-lines="3"] .NativeElement"#
                    .to_string(),
            ),
            budget: Some(".BudgetUpgradeWrapper-budget fl-text .NativeElement".to_string()),
            posted: Some("fl-relative-time fl-text span".to_string()),
            skills: Some(r#".SkillsWrapper[data-show-desktop="true"] fl-tag .Content"#.to_string()),
        },
        // The whole card is wrapped in the project link
        link: LinkRule::AncestorHref,
        // /projects/<category>/<slug>-<numeric id>
        identity: IdentityRule {
            pattern: r"projects/([^/]+)/([^/\-]+)-(\d+)".to_string(),
            group: 3,
        },
        metadata: vec![
            ("proposals".to_string(), ".BidEntryData .NativeElement".to_string()),
            ("averageBid".to_string(), ".AverageBid-amount .NativeElement".to_string()),
            ("clientRating".to_string(), ".ClientRating .ValueBlock".to_string()),
        ],
        expand_control: Some(".ReadMoreButton".to_string()),
        pagination: Some(PageRule::PathSegment {
            after: "jobs".to_string(),
        }),
    }
}
