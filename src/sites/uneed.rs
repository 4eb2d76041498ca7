//! Uneed: tool-launch listing whose entries are followed to detail pages

use crate::extract::{Candidate, Enrichment, FieldRule, PageRules, SiteProfile, Transform, Traversal};

pub(crate) fn profile() -> SiteProfile {
    let publisher = r#".publisher, [class*="publisher"], [class*="maker"]"#;
    let date = r#".launch-date, [class*="date"], time"#;

    SiteProfile {
        name: "uneed".to_string(),
        source: Some("uneed_best".to_string()),
        base_url: "https://www.uneed.best".to_string(),
        url_key: "tool_url".to_string(),
        query_key: None,
        description: Some("Daily tool launches and their makers".to_string()),
        traversal: Traversal::ListingDetail {
            link_contains: "/tool/".to_string(),
        },
        page: PageRules {
            containers: Vec::new(),
            fields: vec![
                FieldRule::new(
                    "tool_name",
                    vec![Candidate::text(r#"h1, .tool-name, [class*="title"]"#)],
                ),
                FieldRule::new(
                    "overview",
                    vec![Candidate::text(
                        r#".overview, .description, [class*="description"], p"#,
                    )],
                ),
                FieldRule::new(
                    "website",
                    vec![Candidate::attr(
                        r#"a[href*="http"]:not([href*="uneed.best"])"#,
                        "href",
                    )],
                ),
                FieldRule::new("publisher_name", vec![Candidate::text(publisher)]),
                FieldRule::new(
                    "publisher_link",
                    vec![Candidate::attr(
                        r#".publisher a[href], [class*="publisher"] a[href], [class*="maker"] a[href]"#,
                        "href",
                    )],
                )
                .with(Transform::AbsoluteUrl),
                FieldRule::new(
                    "launch_date",
                    vec![Candidate::attr(date, "datetime"), Candidate::text(date)],
                ),
                FieldRule::new(
                    "category",
                    vec![Candidate::text(
                        r#".category, [class*="category"], .tag, [class*="tag"]"#,
                    )],
                ),
                FieldRule::new(
                    "pricing",
                    vec![Candidate::text(r#".pricing, [class*="price"], [class*="pricing"]"#)],
                ),
            ],
            required: Vec::new(),
            enrichments: vec![
                Enrichment::SocialLinks {
                    field: "socials".to_string(),
                },
                Enrichment::TextFlag {
                    field: "for_sale".to_string(),
                    selector: Some(r#"[class*="for-sale"], [class*="forsale"]"#.to_string()),
                    needle: "for sale".to_string(),
                },
                Enrichment::DefinitionList { aliases: Vec::new() },
            ],
        },
    }
}
