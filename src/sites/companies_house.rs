//! UK Companies House: company search results and officer profile pages

use crate::extract::{
    Candidate, Enrichment, FieldRule, FollowRules, PageRules, SiteProfile, SubPage, Tally,
    TermAlias, Transform, Traversal,
};

const BASE_URL: &str = "https://find-and-update.company-information.service.gov.uk";
const SOURCE: &str = "companies_house_uk";

/// Company search, one search per company name
///
/// The first hit is followed to its company page and officer list; the
/// resulting record replaces the hits whenever the company page loads.
pub(crate) fn search_profile() -> SiteProfile {
    let name_link = "h3.heading-small a, a.govuk-link, h2 a";

    SiteProfile {
        name: "companies_house".to_string(),
        source: Some(SOURCE.to_string()),
        base_url: BASE_URL.to_string(),
        url_key: "search_url".to_string(),
        query_key: Some("search_query".to_string()),
        description: Some("UK companies registry".to_string()),
        traversal: Traversal::Search {
            url_template: format!("{}/search/companies?q={{query}}", BASE_URL),
            follow: Some(company_follow()),
        },
        page: PageRules {
            containers: vec!["ul#results li, li.type-company".to_string()],
            fields: vec![
                FieldRule::new("company_name", vec![Candidate::text(name_link)]),
                FieldRule::new("company_number", vec![Candidate::attr(name_link, "href")])
                    .with(Transform::LastPathSegment),
                FieldRule::new(
                    "company_status",
                    vec![Candidate::text(r#".company-status, [class*="status"]"#)],
                ),
                FieldRule::new(
                    "registered_address",
                    vec![Candidate::text(
                        r#".company-address, address, [class*="address"]"#,
                    )],
                ),
                FieldRule::new(
                    "incorporation_date",
                    vec![Candidate::text(
                        r#".company-incorporation-date, [class*="incorporation"]"#,
                    )],
                ),
                FieldRule::new("company_link", vec![Candidate::attr(name_link, "href")])
                    .with(Transform::AbsoluteUrl),
            ],
            required: vec!["company_name".to_string()],
            enrichments: Vec::new(),
        },
    }
}

fn company_follow() -> FollowRules {
    FollowRules {
        link_field: "company_link".to_string(),
        url_key: "company_url".to_string(),
        page: PageRules {
            containers: Vec::new(),
            fields: vec![
                FieldRule::new("company_number", vec![Candidate::page_url()])
                    .with(Transform::SegmentAfter("/company/".to_string())),
                FieldRule::new(
                    "company_name",
                    vec![Candidate::text("p.heading-xlarge, h1.heading-xlarge, #company-name, h1")],
                ),
            ],
            required: Vec::new(),
            enrichments: vec![Enrichment::DefinitionList {
                aliases: vec![
                    TermAlias::new(&["company", "status"], "company_status"),
                    TermAlias::new(&["company", "type"], "company_type"),
                    TermAlias::new(&["incorporated"], "incorporation_date"),
                    TermAlias::new(&["registered", "office"], "registered_address"),
                    TermAlias::new(&["nature", "business"], "nature_of_business"),
                    TermAlias::new(&["sic"], "nature_of_business"),
                    TermAlias::new(&["accounts"], "accounts_info"),
                    TermAlias::new(&["confirmation", "statement"], "confirmation_statement"),
                    TermAlias::new(&["previous", "name"], "previous_names"),
                ],
            }],
        },
        subpages: vec![SubPage {
            path: "officers".to_string(),
            enrichments: vec![officers_list()],
        }],
    }
}

/// Officers listed on a company's officers page
fn officers_list() -> Enrichment {
    let name_link = r#"a[href*="/officers/"], a.officer-name, h3 a, .heading-small a"#;

    Enrichment::Nested {
        field: "officers".to_string(),
        containers: vec![
            "div.appointment".to_string(),
            "#officer-list li, ul.appointments li".to_string(),
            r#"div[id*="officer"], div[class*="officer"]"#.to_string(),
            "table.appointments tbody tr, table tbody tr".to_string(),
        ],
        fields: vec![
            FieldRule::new(
                "officer_name",
                vec![
                    Candidate::text(name_link),
                    Candidate::text(".officer-name, h3, strong"),
                ],
            ),
            FieldRule::new("officer_link", vec![Candidate::attr(name_link, "href")])
                .with(Transform::AbsoluteUrl),
            FieldRule::new(
                "role",
                vec![Candidate::text(r#".role, .officer-role, [class*="role"], dd"#)],
            ),
            FieldRule::new(
                "appointed_on",
                vec![Candidate::text(r#"[class*="appointed"], [class*="appointment-date"]"#)],
            )
            .with(Transform::StripLabel("appointed on".to_string())),
            FieldRule::new("resigned_on", vec![Candidate::text(r#"[class*="resigned"]"#)])
                .with(Transform::StripLabel("resigned on".to_string())),
            FieldRule::new(
                "nationality",
                vec![Candidate::text(r#"[class*="nationality"]"#)],
            ),
            FieldRule::new(
                "occupation",
                vec![Candidate::text(r#"[class*="occupation"]"#)],
            ),
            FieldRule::new(
                "country_of_residence",
                vec![Candidate::text(r#"[class*="country-of-residence"]"#)],
            ),
            FieldRule::new(
                "address",
                vec![Candidate::text(r#"address, [class*="address"]"#)],
            ),
        ],
        count_field: Some("officer_count".to_string()),
        definition_lists: true,
        required: vec!["officer_name".to_string()],
        tally: None,
    }
}

/// Officer appointment pages, one URL per input line
pub(crate) fn officers_profile() -> SiteProfile {
    let company = r#"a[href*="/company/"]"#;

    SiteProfile {
        name: "companies_house_officers".to_string(),
        source: Some(SOURCE.to_string()),
        base_url: BASE_URL.to_string(),
        url_key: "profile_url".to_string(),
        query_key: None,
        description: Some("UK company officers and their appointments".to_string()),
        traversal: Traversal::UrlList,
        page: PageRules {
            containers: Vec::new(),
            fields: vec![
                FieldRule::new("officer_id", vec![Candidate::page_url()])
                    .with(Transform::SegmentAfter("/officers/".to_string())),
                FieldRule::new("officer_name", vec![Candidate::text("h1, .heading-xlarge")]),
                FieldRule::new(
                    "date_of_birth",
                    vec![Candidate::text(r#"[class*="date-of-birth"], [class*="born"]"#)],
                ),
                FieldRule::new(
                    "nationality",
                    vec![Candidate::text(r#"[class*="nationality"]"#)],
                ),
            ],
            required: Vec::new(),
            enrichments: vec![Enrichment::Nested {
                field: "appointments".to_string(),
                containers: vec![
                    "div.appointment, li.appointment, tr.appointment".to_string(),
                    "table tbody tr".to_string(),
                ],
                fields: vec![
                    FieldRule::new("company_name", vec![Candidate::text(company)]),
                    FieldRule::new("company_link", vec![Candidate::attr(company, "href")])
                        .with(Transform::AbsoluteUrl),
                    FieldRule::new("company_number", vec![Candidate::attr(company, "href")])
                        .with(Transform::SegmentAfter("/company/".to_string())),
                    FieldRule::new(
                        "role",
                        vec![Candidate::text(
                            r#"[class*="role"], td:nth-of-type(2), .appointment-role"#,
                        )],
                    ),
                    FieldRule::new(
                        "status",
                        vec![Candidate::text(r#"[class*="status"], .appointment-status"#)],
                    ),
                    FieldRule::new(
                        "appointed_on",
                        vec![Candidate::text(r#"[class*="appointed"], .appointed-on"#)],
                    )
                    .with(Transform::StripLabel("appointed on".to_string())),
                    FieldRule::new(
                        "resigned_on",
                        vec![Candidate::text(r#"[class*="resigned"], .resigned-on"#)],
                    )
                    .with(Transform::StripLabel("resigned on".to_string())),
                ],
                count_field: Some("appointment_count".to_string()),
                definition_lists: true,
                required: Vec::new(),
                tally: Some(Tally {
                    active_field: "active_appointments".to_string(),
                    ended_field: "resigned_appointments".to_string(),
                    status_key: "status".to_string(),
                    end_key: "resigned_on".to_string(),
                }),
            }],
        },
    }
}
