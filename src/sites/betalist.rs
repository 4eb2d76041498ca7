//! BetaList: paginated startup listing with day headers between entries

use crate::extract::{Candidate, Enrichment, FieldRule, PageRules, SiteProfile, Transform, Traversal};

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        name: "betalist".to_string(),
        source: None,
        base_url: "https://betalist.com/".to_string(),
        url_key: "url".to_string(),
        query_key: None,
        description: Some("Discover and get early access to tomorrow's startups".to_string()),
        traversal: Traversal::Paginated {
            page_path: "startups/page/{page}".to_string(),
        },
        page: PageRules {
            containers: vec![r#"div.block[id^="startup-"]"#.to_string()],
            fields: vec![
                FieldRule::new("startup_id", vec![Candidate::own_attr("id")])
                    .with(Transform::StripPrefix("startup-".to_string())),
                FieldRule::new("title", vec![Candidate::text("a.font-medium")]),
                FieldRule::new(
                    "description",
                    vec![Candidate::text(r"a.text-gray-500, a.dark\:text-gray-400")],
                ),
                FieldRule::new(
                    "link",
                    vec![Candidate::attr("a.font-medium", "href"), Candidate::attr("a", "href")],
                )
                .with(Transform::AbsoluteUrl),
                FieldRule::new(
                    "logo",
                    vec![Candidate::attr("img", "src"), Candidate::attr("img", "srcset")],
                )
                .with(Transform::FirstToken)
                .with(Transform::AbsoluteUrl),
            ],
            required: vec!["title".to_string(), "link".to_string()],
            enrichments: vec![Enrichment::DateHeaders {
                header: "div.col-span-full.text-3xl".to_string(),
                field: "date_launched".to_string(),
            }],
        },
    }
}
