//! Generic listing template shared by the directory sites without bespoke rules

use crate::extract::{Candidate, FieldRule, PageRules, SiteProfile, Transform, Traversal};
use crate::url::site_name_from_url;

/// Home URL and description of every site crawled with the generic template
pub(crate) const GENERIC_SITES: &[(&str, &str)] = &[
    ("https://crunchbase.com", "Startup and company database with funding information"),
    ("https://startupstash.com/", "Curated directory of startup tools and resources"),
    ("https://growjo.com/", "Database of fastest-growing companies"),
    ("https://www.angellist.com/", "Platform for startups, angel investors, and job seekers"),
    ("https://www.infogreffe.fr/", "French business registry (Registre du Commerce et des Sociétés)"),
    ("https://opencorporates.com/", "Global database of companies"),
    ("https://www.sec.gov/edgar", "SEC EDGAR database for US public companies"),
    ("https://data.sec.gov/", "SEC structured data API"),
    ("https://www.f6s.com/", "Global startup community and accelerator database"),
    ("https://www.betapage.co/", "Discover and share new startups"),
    ("https://launched.io/", "Product launch platform"),
    ("https://magnitt.com/", "MENA startup and investment platform"),
    ("https://wamda.com/", "Platform supporting entrepreneurs in MENA region"),
    ("https://www.startupbahrain.com/", "Bahrain startup ecosystem platform"),
    ("https://arabnet.me/", "Digital and startup events in MENA"),
    ("https://wellfound.com/", "Startup jobs and recruiting (formerly AngelList Talent)"),
    ("https://www.ventureradar.com/", "Startup discovery and market intelligence"),
    ("https://techcrunch.com/startups/", "Startup news and articles"),
    ("https://airtable.com/", "Search for public shared Airtable bases with startup data"),
];

/// Builds the generic profile for every entry of [`GENERIC_SITES`]
///
/// Entries whose URL yields no site name are skipped.
pub(crate) fn profiles() -> Vec<SiteProfile> {
    let mut profiles: Vec<SiteProfile> = GENERIC_SITES
        .iter()
        .filter_map(|(url, description)| {
            let name = site_name_from_url(url)?;
            Some(profile(&name, url, description))
        })
        .collect();

    profiles.push(profile(
        "harmonic_ai",
        "https://harmonic.ai/companies",
        "Startup discovery and company data",
    ));
    profiles
}

/// Single-page listing: any company, startup or item block with a title or description
pub(crate) fn profile(name: &str, base_url: &str, description: &str) -> SiteProfile {
    SiteProfile {
        name: name.to_string(),
        source: None,
        base_url: base_url.to_string(),
        url_key: "url".to_string(),
        query_key: None,
        description: Some(description.to_string()),
        traversal: Traversal::Single,
        page: PageRules {
            containers: vec![
                r#"[class*="company"], [class*="startup"], [class*="item"]"#.to_string(),
            ],
            fields: vec![
                FieldRule::new(
                    "title",
                    vec![Candidate::text(r#"[class*="title"], h1, h2, h3"#)],
                ),
                FieldRule::new(
                    "description",
                    vec![Candidate::text(r#"[class*="description"], p"#)],
                ),
                FieldRule::new("link", vec![Candidate::attr("a", "href")])
                    .with(Transform::AbsoluteUrl),
            ],
            required: vec!["title".to_string(), "description".to_string()],
            enrichments: Vec::new(),
        },
    }
}
