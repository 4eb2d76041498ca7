//! Profile compilation
//!
//! Selectors are parsed once when a profile is loaded so that a typo in a
//! table surfaces as a configuration error instead of an empty crawl.

use crate::extract::profile::{
    Candidate, Enrichment, FieldRule, FollowRules, PageRules, SiteProfile, Tally, TermAlias,
    Transform, Traversal,
};
use crate::ConfigError;
use scraper::Selector;

/// A site profile with every selector parsed
#[derive(Debug)]
pub struct CompiledProfile {
    pub(crate) profile: SiteProfile,
    pub(crate) containers: Vec<Selector>,
    pub(crate) fields: Vec<CompiledField>,
    pub(crate) enrichments: Vec<CompiledEnrichment>,
    pub(crate) anchors: Selector,
    pub(crate) definition_lists: Selector,
    pub(crate) terms: Selector,
    pub(crate) definitions: Selector,
    pub(crate) follow: Option<Box<CompiledFollow>>,
}

/// Compiled follow-up rules of a search profile
#[derive(Debug)]
pub(crate) struct CompiledFollow {
    pub(crate) link_field: String,
    pub(crate) page: CompiledProfile,
    pub(crate) subpages: Vec<(String, CompiledProfile)>,
}

#[derive(Debug)]
pub(crate) struct CompiledField {
    pub(crate) name: String,
    pub(crate) candidates: Vec<CompiledCandidate>,
    pub(crate) transforms: Vec<Transform>,
}

#[derive(Debug)]
pub(crate) struct CompiledCandidate {
    pub(crate) selector: Option<Selector>,
    pub(crate) attr: Option<String>,
    pub(crate) page_url: bool,
}

#[derive(Debug)]
pub(crate) enum CompiledEnrichment {
    DateHeaders {
        header: Selector,
        field: String,
    },
    DefinitionList {
        aliases: Vec<TermAlias>,
    },
    SocialLinks {
        field: String,
    },
    TextFlag {
        field: String,
        selector: Option<Selector>,
        needle: String,
    },
    Nested {
        field: String,
        containers: Vec<Selector>,
        fields: Vec<CompiledField>,
        count_field: Option<String>,
        definition_lists: bool,
        required: Vec<String>,
        tally: Option<Tally>,
    },
}

impl CompiledProfile {
    /// Parses every selector of `profile`
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledProfile)` - All selectors are valid
    /// * `Err(ConfigError::InvalidSelector)` - The first selector that failed to parse
    pub fn compile(profile: SiteProfile) -> Result<Self, ConfigError> {
        let site = profile.name.clone();
        let parse = |selector: &str| parse_selector(&site, selector);

        let containers = profile
            .page
            .containers
            .iter()
            .map(|s| parse(s.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let fields = compile_fields(&site, &profile.page.fields)?;

        let enrichments = profile
            .page
            .enrichments
            .iter()
            .map(|e| compile_enrichment(&site, e))
            .collect::<Result<Vec<_>, _>>()?;

        let has_date_headers = enrichments
            .iter()
            .any(|e| matches!(e, CompiledEnrichment::DateHeaders { .. }));
        if has_date_headers && containers.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' uses date headers but declares no containers",
                site
            )));
        }

        Ok(Self {
            containers,
            fields,
            enrichments,
            anchors: parse("a[href]")?,
            definition_lists: parse("dl")?,
            terms: parse("dt")?,
            definitions: parse("dd")?,
            follow: compile_follow(&profile)?,
            profile,
        })
    }

    /// The profile this was compiled from
    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Site identifier
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

fn compile_enrichment(site: &str, enrichment: &Enrichment) -> Result<CompiledEnrichment, ConfigError> {
    let parse = |selector: &str| parse_selector(site, selector);

    Ok(match enrichment {
        Enrichment::DateHeaders { header, field } => CompiledEnrichment::DateHeaders {
            header: parse(header.as_str())?,
            field: field.clone(),
        },
        Enrichment::DefinitionList { aliases } => CompiledEnrichment::DefinitionList {
            aliases: aliases.clone(),
        },
        Enrichment::SocialLinks { field } => CompiledEnrichment::SocialLinks {
            field: field.clone(),
        },
        Enrichment::TextFlag {
            field,
            selector,
            needle,
        } => CompiledEnrichment::TextFlag {
            field: field.clone(),
            selector: selector.as_deref().map(parse).transpose()?,
            needle: needle.to_lowercase(),
        },
        Enrichment::Nested {
            field,
            containers,
            fields,
            count_field,
            definition_lists,
            required,
            tally,
        } => CompiledEnrichment::Nested {
            field: field.clone(),
            containers: containers
                .iter()
                .map(|s| parse(s.as_str()))
                .collect::<Result<Vec<_>, _>>()?,
            fields: compile_fields(site, fields)?,
            count_field: count_field.clone(),
            definition_lists: *definition_lists,
            required: required.clone(),
            tally: tally.clone(),
        },
    })
}

/// Compiles the detail page and sub-pages of a search profile as profiles of their own
fn compile_follow(profile: &SiteProfile) -> Result<Option<Box<CompiledFollow>>, ConfigError> {
    let Traversal::Search {
        follow: Some(follow),
        ..
    } = &profile.traversal
    else {
        return Ok(None);
    };
    let FollowRules {
        link_field,
        url_key,
        page,
        subpages,
    } = follow;

    let derived = |page: PageRules| SiteProfile {
        name: profile.name.clone(),
        source: profile.source.clone(),
        base_url: profile.base_url.clone(),
        url_key: url_key.clone(),
        query_key: profile.query_key.clone(),
        description: None,
        traversal: Traversal::Single,
        page,
    };

    let subpages = subpages
        .iter()
        .map(|sub| {
            let rules = PageRules {
                enrichments: sub.enrichments.clone(),
                ..PageRules::default()
            };
            Ok((sub.path.clone(), CompiledProfile::compile(derived(rules))?))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(Some(Box::new(CompiledFollow {
        link_field: link_field.clone(),
        page: CompiledProfile::compile(derived(page.clone()))?,
        subpages,
    })))
}

fn compile_fields(site: &str, fields: &[FieldRule]) -> Result<Vec<CompiledField>, ConfigError> {
    fields
        .iter()
        .map(|field| {
            if field.candidates.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Field '{}' in site '{}' has no candidates",
                    field.name, site
                )));
            }
            Ok(CompiledField {
                name: field.name.clone(),
                candidates: field
                    .candidates
                    .iter()
                    .map(|c| compile_candidate(site, c))
                    .collect::<Result<Vec<_>, _>>()?,
                transforms: field.transforms.clone(),
            })
        })
        .collect()
}

fn compile_candidate(site: &str, candidate: &Candidate) -> Result<CompiledCandidate, ConfigError> {
    Ok(CompiledCandidate {
        selector: candidate
            .selector
            .as_deref()
            .map(|s| parse_selector(site, s))
            .transpose()?,
        attr: candidate.attr.clone(),
        page_url: candidate.page_url,
    })
}

fn parse_selector(site: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        site: site.to_string(),
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::profile::{PageRules, Traversal};

    fn profile_with(page: PageRules) -> SiteProfile {
        SiteProfile {
            name: "testsite".to_string(),
            source: None,
            base_url: "https://site.test/".to_string(),
            url_key: "url".to_string(),
            query_key: None,
            description: None,
            traversal: Traversal::Single,
            page,
        }
    }

    #[test]
    fn test_compile_valid_profile() {
        let page = PageRules {
            containers: vec!["div.company".to_string()],
            fields: vec![FieldRule::new(
                "title",
                vec![Candidate::text("h2"), Candidate::text("[class*=\"title\"]")],
            )],
            required: vec!["title".to_string()],
            enrichments: vec![Enrichment::DefinitionList { aliases: vec![] }],
        };
        let compiled = CompiledProfile::compile(profile_with(page)).unwrap();
        assert_eq!(compiled.containers.len(), 1);
        assert_eq!(compiled.fields[0].candidates.len(), 2);
        assert_eq!(compiled.name(), "testsite");
    }

    #[test]
    fn test_invalid_container_selector() {
        let page = PageRules {
            containers: vec!["div[".to_string()],
            ..PageRules::default()
        };
        let err = CompiledProfile::compile(profile_with(page)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { .. }));
    }

    #[test]
    fn test_invalid_field_selector() {
        let page = PageRules {
            fields: vec![FieldRule::new("title", vec![Candidate::text(">>>")])],
            ..PageRules::default()
        };
        let err = CompiledProfile::compile(profile_with(page)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { .. }));
    }

    #[test]
    fn test_field_without_candidates_rejected() {
        let page = PageRules {
            fields: vec![FieldRule::new("title", vec![])],
            ..PageRules::default()
        };
        let err = CompiledProfile::compile(profile_with(page)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_date_headers_need_containers() {
        let page = PageRules {
            enrichments: vec![Enrichment::DateHeaders {
                header: "h2.day".to_string(),
                field: "date_launched".to_string(),
            }],
            ..PageRules::default()
        };
        let err = CompiledProfile::compile(profile_with(page)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_follow_rules_compiled() {
        let mut profile = profile_with(PageRules::default());
        profile.query_key = Some("search_query".to_string());
        profile.traversal = Traversal::Search {
            url_template: "https://site.test/search?q={query}".to_string(),
            follow: Some(FollowRules {
                link_field: "company_link".to_string(),
                url_key: "company_url".to_string(),
                page: PageRules {
                    fields: vec![FieldRule::new("company_name", vec![Candidate::text("h1")])],
                    ..PageRules::default()
                },
                subpages: vec![crate::extract::SubPage {
                    path: "officers".to_string(),
                    enrichments: vec![Enrichment::DefinitionList { aliases: vec![] }],
                }],
            }),
        };

        let compiled = CompiledProfile::compile(profile).unwrap();
        let follow = compiled.follow.as_ref().unwrap();
        assert_eq!(follow.link_field, "company_link");
        assert_eq!(follow.page.profile().url_key, "company_url");
        assert_eq!(follow.page.profile().query_key.as_deref(), Some("search_query"));
        assert_eq!(follow.subpages[0].0, "officers");
    }

    #[test]
    fn test_invalid_selector_in_follow_page() {
        let mut profile = profile_with(PageRules::default());
        profile.traversal = Traversal::Search {
            url_template: "https://site.test/search?q={query}".to_string(),
            follow: Some(FollowRules {
                link_field: "link".to_string(),
                url_key: "detail_url".to_string(),
                page: PageRules {
                    containers: vec!["div[".to_string()],
                    ..PageRules::default()
                },
                subpages: Vec::new(),
            }),
        };
        let err = CompiledProfile::compile(profile).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { .. }));
    }
}
