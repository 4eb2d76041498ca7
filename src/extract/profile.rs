//! Declarative site profile types
//!
//! A profile is a table describing how to walk one site and how to turn its
//! HTML into records. Built-in profiles live in `crate::sites`; additional
//! profiles can be declared in the TOML configuration under `[[site]]`.

use serde::{Deserialize, Serialize};

fn default_url_key() -> String {
    "url".to_string()
}

/// Declarative description of one scraped site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteProfile {
    /// Site identifier, used as the default `source` value and file-name prefix
    pub name: String,

    /// Value of the `source` field on every record (defaults to `name`)
    #[serde(default)]
    pub source: Option<String>,

    /// Home or listing URL used when no start URL is supplied
    pub base_url: String,

    /// Key that carries the fetched page URL on every record
    #[serde(default = "default_url_key")]
    pub url_key: String,

    /// Key that carries the search query on records from search crawls
    #[serde(default)]
    pub query_key: Option<String>,

    /// Free-form description of the site
    #[serde(default)]
    pub description: Option<String>,

    /// How pages of this site are walked
    #[serde(default)]
    pub traversal: Traversal,

    /// Extraction rules applied to every parsed page
    pub page: PageRules,
}

impl SiteProfile {
    /// Returns the value written to the `source` field
    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

/// How a crawl walks the pages of a site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Traversal {
    /// Fetch the start URL once and parse it
    #[default]
    Single,

    /// Walk pages 1..=max_pages; page N > 1 appends `page_path` to the start URL
    Paginated {
        #[serde(rename = "page-path")]
        page_path: String,
    },

    /// Harvest detail links from one listing page, then parse every detail page
    ListingDetail {
        #[serde(rename = "link-contains")]
        link_contains: String,
    },

    /// Run one search per input query; `url_template` contains `{query}`
    ///
    /// With `follow`, the first hit's detail page replaces the hits of that
    /// query whenever it can be fetched.
    Search {
        #[serde(rename = "url-template")]
        url_template: String,
        #[serde(default)]
        follow: Option<FollowRules>,
    },

    /// Treat every input line as a detail page URL
    UrlList,
}

impl Traversal {
    /// Returns true if this traversal is driven by an input list
    pub fn takes_inputs(&self) -> bool {
        matches!(self, Self::Search { .. } | Self::UrlList)
    }

    /// Short name used in logs and listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Paginated { .. } => "paginated",
            Self::ListingDetail { .. } => "listing-detail",
            Self::Search { .. } => "search",
            Self::UrlList => "url-list",
        }
    }
}

/// Detail page reached from the first search hit, plus pages below it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FollowRules {
    /// Hit field holding the detail page URL
    pub link_field: String,

    /// Key that carries the detail page URL on the detail record
    pub url_key: String,

    /// Rules for the detail page; the whole page becomes one record
    pub page: PageRules,

    #[serde(default)]
    pub subpages: Vec<SubPage>,
}

/// A page below a detail URL whose enrichments are merged into the detail record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubPage {
    /// Path appended to the detail URL (`officers` gives `<detail>/officers`)
    pub path: String,
    pub enrichments: Vec<Enrichment>,
}

/// Rules turning one fetched page into records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PageRules {
    /// Ordered container strategies; the first one matching anything wins.
    /// Empty means the whole document is a single container.
    #[serde(default)]
    pub containers: Vec<String>,

    /// Field extraction rules, applied in order
    #[serde(default)]
    pub fields: Vec<FieldRule>,

    /// A container becomes a record only if one of these fields is non-empty.
    /// Empty means every container is admitted.
    #[serde(default)]
    pub required: Vec<String>,

    /// Site-specific enrichments run after the plain fields
    #[serde(default)]
    pub enrichments: Vec<Enrichment>,
}

/// One record field and its fallback chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldRule {
    pub name: String,
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

impl FieldRule {
    pub fn new(name: &str, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.to_string(),
            candidates,
            transforms: Vec::new(),
        }
    }

    pub fn with(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }
}

/// One extraction strategy inside a fallback chain
///
/// - `selector` picks the first matching descendant of the container
///   (absent: the container itself)
/// - `attr` reads an attribute instead of the element text
/// - `page-url` reads the URL of the page being parsed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Candidate {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub page_url: bool,
}

impl Candidate {
    /// Text of the first element matching `selector`
    pub fn text(selector: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            ..Self::default()
        }
    }

    /// Attribute `attr` of the first element matching `selector`
    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            attr: Some(attr.to_string()),
            ..Self::default()
        }
    }

    /// Attribute `attr` of the container element itself
    pub fn own_attr(attr: &str) -> Self {
        Self {
            attr: Some(attr.to_string()),
            ..Self::default()
        }
    }

    /// The URL of the page being parsed
    pub fn page_url() -> Self {
        Self {
            page_url: true,
            ..Self::default()
        }
    }
}

/// Post-processing applied to a raw field value, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    /// Keep the first whitespace-separated token (srcset entries)
    FirstToken,
    /// Resolve against the page URL
    AbsoluteUrl,
    /// Keep the last non-empty path segment
    LastPathSegment,
    /// Keep the path segment directly following the marker
    SegmentAfter(String),
    /// Remove a literal prefix
    StripPrefix(String),
    /// Remove a leading label, ignoring case ("Appointed on 1 May 2020")
    StripLabel(String),
    /// Normalize a date to DD-MM-YYYY when recognized
    Date,
    Lowercase,
}

/// Site-specific logic expressed as a table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Enrichment {
    /// Date headers interleaved with containers: every container takes the
    /// date of the closest preceding header
    DateHeaders { header: String, field: String },

    /// `dt`/`dd` pairs become snake_case keys (never overriding a field);
    /// a term matching an alias is stored under the alias field instead
    DefinitionList {
        #[serde(default)]
        aliases: Vec<TermAlias>,
    },

    /// Links to known social networks, as a nested map network -> href
    SocialLinks { field: String },

    /// Text of `selector`, else boolean true when `needle` occurs in the markup
    TextFlag {
        field: String,
        #[serde(default)]
        selector: Option<String>,
        needle: String,
    },

    /// A nested list of objects extracted with their own container chain
    Nested {
        field: String,
        containers: Vec<String>,
        fields: Vec<FieldRule>,
        #[serde(default, rename = "count-field")]
        count_field: Option<String>,
        #[serde(default, rename = "definition-lists")]
        definition_lists: bool,
        /// Items missing all of these fields are skipped (empty: keep all)
        #[serde(default)]
        required: Vec<String>,
        #[serde(default)]
        tally: Option<Tally>,
    },
}

/// Maps a definition term onto a fixed field name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TermAlias {
    /// Every needle must occur in the lowercased term
    pub contains: Vec<String>,
    pub field: String,
}

impl TermAlias {
    pub fn new(contains: &[&str], field: &str) -> Self {
        Self {
            contains: contains.iter().map(|s| s.to_string()).collect(),
            field: field.to_string(),
        }
    }

    /// Returns true if every needle occurs in `term` (case-insensitive)
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.contains.iter().all(|needle| term.contains(&needle.to_lowercase()))
    }
}

/// Active/ended split of nested items
///
/// An item is active when its `status-key` reads "active" (any case) or
/// when it has no `end-key`; every other item counts as ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Tally {
    pub active_field: String,
    pub ended_field: String,
    pub status_key: String,
    pub end_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_defaults_to_name() {
        let profile = SiteProfile {
            name: "arabnet".to_string(),
            source: None,
            base_url: "https://arabnet.me/".to_string(),
            url_key: default_url_key(),
            query_key: None,
            description: None,
            traversal: Traversal::Single,
            page: PageRules::default(),
        };
        assert_eq!(profile.source(), "arabnet");
    }

    #[test]
    fn test_deserialize_profile_from_toml() {
        let content = r#"
name = "launchboard"
base-url = "https://launchboard.test/"
url-key = "tool_url"

[traversal]
kind = "listing-detail"
link-contains = "/tool/"

[page]
required = ["tool_name"]

[[page.fields]]
name = "tool_name"
candidates = [{ selector = "h1" }, { selector = "[class*=\"title\"]" }]

[[page.fields]]
name = "website"
candidates = [{ selector = "a.visit", attr = "href" }]
transforms = ["absolute-url"]

[[page.fields]]
name = "tool_id"
candidates = [{ page-url = true }]
transforms = [{ segment-after = "/tool/" }]

[[page.enrichments]]
kind = "social-links"
field = "socials"

[[page.enrichments]]
kind = "definition-list"
"#;

        let profile: SiteProfile = toml::from_str(content).unwrap();
        assert_eq!(profile.url_key, "tool_url");
        assert_eq!(
            profile.traversal,
            Traversal::ListingDetail {
                link_contains: "/tool/".to_string()
            }
        );
        assert_eq!(profile.page.fields.len(), 3);
        assert_eq!(profile.page.fields[1].transforms, vec![Transform::AbsoluteUrl]);
        assert!(profile.page.fields[2].candidates[0].page_url);
        assert_eq!(
            profile.page.fields[2].transforms,
            vec![Transform::SegmentAfter("/tool/".to_string())]
        );
        assert_eq!(profile.page.enrichments.len(), 2);
        assert_eq!(
            profile.page.enrichments[1],
            Enrichment::DefinitionList { aliases: vec![] }
        );
    }

    #[test]
    fn test_traversal_defaults_to_single() {
        let content = r#"
name = "plain"
base-url = "https://plain.test/"

[page]
containers = [".item"]
"#;
        let profile: SiteProfile = toml::from_str(content).unwrap();
        assert_eq!(profile.traversal, Traversal::Single);
        assert_eq!(profile.url_key, "url");
    }

    #[test]
    fn test_deserialize_search_with_follow() {
        let content = r#"
name = "registry"
base-url = "https://registry.test/"
query-key = "search_query"

[traversal]
kind = "search"
url-template = "https://registry.test/search?q={query}"

[traversal.follow]
link-field = "company_link"
url-key = "company_url"

[[traversal.follow.page.enrichments]]
kind = "definition-list"
aliases = [{ contains = ["nature", "business"], field = "nature_of_business" }]

[[traversal.follow.subpages]]
path = "officers"

[[traversal.follow.subpages.enrichments]]
kind = "nested"
field = "officers"
containers = ["div.appointment"]
fields = [{ name = "officer_name", candidates = [{ selector = "h3 a" }] }]
required = ["officer_name"]
tally = { active-field = "active", ended-field = "resigned", status-key = "status", end-key = "resigned_on" }

[page]
containers = ["li.result"]
"#;
        let profile: SiteProfile = toml::from_str(content).unwrap();
        let Traversal::Search { follow: Some(follow), .. } = &profile.traversal else {
            panic!("expected search with follow rules, got {:?}", profile.traversal);
        };
        assert_eq!(follow.link_field, "company_link");
        assert_eq!(follow.url_key, "company_url");
        assert_eq!(
            follow.page.enrichments[0],
            Enrichment::DefinitionList {
                aliases: vec![TermAlias::new(&["nature", "business"], "nature_of_business")]
            }
        );
        assert_eq!(follow.subpages[0].path, "officers");
        let Enrichment::Nested { required, tally, .. } = &follow.subpages[0].enrichments[0] else {
            panic!("expected nested enrichment");
        };
        assert_eq!(required, &vec!["officer_name".to_string()]);
        assert_eq!(tally.as_ref().map(|t| t.end_key.as_str()), Some("resigned_on"));
    }

    #[test]
    fn test_term_alias_needs_every_needle() {
        let alias = TermAlias::new(&["previous", "name"], "previous_names");
        assert!(alias.matches("Previous company names"));
        assert!(!alias.matches("Company name"));
    }
}
