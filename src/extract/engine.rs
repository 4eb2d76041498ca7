//! Profile interpreter
//!
//! Turns one HTML document into records according to a compiled profile:
//!
//! 1. Pick containers with the first container strategy that matches anything
//! 2. For each container, evaluate every field's fallback chain; the first
//!    non-empty candidate wins
//! 3. Run enrichments (date headers, definition lists, social links, ...)
//! 4. Admit the record only if one of the required fields is present
//!
//! Extraction never fails halfway through a page: a candidate whose value
//! cannot be transformed is treated as empty.

use crate::extract::compile::{CompiledEnrichment, CompiledField, CompiledProfile};
use crate::extract::dates::normalize_date;
use crate::extract::profile::{Tally, TermAlias, Transform};
use crate::extract::record::Record;
use crate::url::{normalized_host, resolve_href, resolve_link};
use crate::ExtractResult;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use url::Url;

/// Host suffixes recognized as social networks, with the key they are stored under
const SOCIAL_NETWORKS: &[(&str, &str)] = &[
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("linkedin.com", "linkedin"),
    ("facebook.com", "facebook"),
    ("instagram.com", "instagram"),
    ("github.com", "github"),
    ("youtube.com", "youtube"),
];

/// Result of parsing one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Admitted records, in document order
    pub records: Vec<Record>,

    /// Number of containers found
    pub containers: usize,

    /// Containers dropped because no required field was present
    pub dropped: usize,
}

/// Per-page state shared by every container
struct PageContext<'a> {
    base: &'a Url,
    source_url: &'a str,
    query: Option<&'a str>,
    reference: DateTime<Local>,
    scraped_at: String,
}

impl<'a> PageContext<'a> {
    fn new(
        base: &'a Url,
        source_url: &'a str,
        query: Option<&'a str>,
        reference: DateTime<Local>,
    ) -> Self {
        Self {
            base,
            source_url,
            query,
            reference,
            scraped_at: reference
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl CompiledProfile {
    /// Parses a page into records, resolving relative dates against the wall clock
    ///
    /// # Example
    ///
    /// ```
    /// use sitecrawl::sites;
    ///
    /// let profile = sites::compiled("arabnet").unwrap();
    /// let html = r#"<div class="company"><h2 class="title">Acme</h2></div>"#;
    /// let records = profile.parse_page(html, "https://arabnet.me/");
    /// assert_eq!(records.len(), 1);
    /// assert_eq!(records[0].get_str("source"), Some("arabnet"));
    /// ```
    pub fn parse_page(&self, html: &str, source_url: &str) -> Vec<Record> {
        self.extract_page(html, source_url, None, Local::now()).records
    }

    /// Parses a page into records with an explicit reference time
    ///
    /// The reference time is used for `scraped_at` and for resolving
    /// relative dates such as "Yesterday".
    pub fn parse_page_at(
        &self,
        html: &str,
        source_url: &str,
        reference: DateTime<Local>,
    ) -> Vec<Record> {
        self.extract_page(html, source_url, None, reference).records
    }

    /// Parses a search result page; records carry the query under the profile's query key
    pub fn parse_search_page(&self, html: &str, source_url: &str, query: &str) -> Vec<Record> {
        self.extract_page(html, source_url, Some(query), Local::now())
            .records
    }

    /// Parses a detail page into at most one record
    pub fn parse_detail(&self, html: &str, source_url: &str) -> Option<Record> {
        self.parse_page(html, source_url).into_iter().next()
    }

    /// Collects unique links containing `pattern`, resolved against the page URL
    ///
    /// Links are returned in document order with duplicates removed.
    pub fn detail_links(&self, html: &str, source_url: &str, pattern: &str) -> Vec<String> {
        let base = match Url::parse(source_url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Cannot parse listing URL {}: {}", source_url, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();
        for element in document.select(&self.anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(link) = resolve_link(href, &base) {
                if link.contains(pattern) && !links.contains(&link) {
                    links.push(link);
                }
            }
        }

        tracing::info!("Found {} detail links on {}", links.len(), source_url);
        links
    }

    /// Detail page URL of the first hit when the profile follows search hits
    pub fn follow_link(&self, hits: &[Record]) -> Option<String> {
        let follow = self.follow.as_ref()?;
        hits.first()?
            .get_str(&follow.link_field)
            .map(str::to_string)
    }

    /// Paths of the pages fetched below a followed detail page, in order
    pub fn follow_subpages(&self) -> Vec<String> {
        self.follow
            .as_ref()
            .map(|f| f.subpages.iter().map(|(path, _)| path.clone()).collect())
            .unwrap_or_default()
    }

    /// Parses a followed detail page into one record tagged with the query
    pub fn parse_followed(
        &self,
        html: &str,
        source_url: &str,
        query: &str,
        reference: DateTime<Local>,
    ) -> Option<Record> {
        let follow = self.follow.as_ref()?;
        follow
            .page
            .extract_page(html, source_url, Some(query), reference)
            .records
            .into_iter()
            .next()
    }

    /// Runs the enrichments of sub-page `index` over `html` and adds the
    /// results to `record` without overriding existing keys
    pub fn merge_subpage(
        &self,
        index: usize,
        html: &str,
        source_url: &str,
        reference: DateTime<Local>,
        record: &mut Record,
    ) {
        let Some((path, subpage)) = self.follow.as_ref().and_then(|f| f.subpages.get(index)) else {
            return;
        };
        let base = match Url::parse(source_url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Cannot parse {} page URL {}: {}", path, source_url, e);
                return;
            }
        };

        let document = Html::parse_document(html);
        let ctx = PageContext::new(&base, source_url, None, reference);
        let extra = subpage.extract_fields(document.root_element(), None, &ctx);
        tracing::debug!("Merging {} fields from {}", extra.len(), source_url);
        merge_absent(record, extra);
    }

    /// Parses a page and reports how many containers were admitted or dropped
    pub fn extract_page(
        &self,
        html: &str,
        source_url: &str,
        query: Option<&str>,
        reference: DateTime<Local>,
    ) -> ParsedPage {
        let base = match Url::parse(source_url) {
            Ok(base) => base,
            Err(e) => {
                tracing::error!("Cannot parse page URL {}: {}", source_url, e);
                return ParsedPage::default();
            }
        };

        let document = Html::parse_document(html);
        let ctx = PageContext::new(&base, source_url, query, reference);

        let (strategy, containers) = self.select_containers(&document);
        let header_dates = self.header_dates(&document, strategy, &ctx);

        let mut page = ParsedPage {
            containers: containers.len(),
            ..ParsedPage::default()
        };

        for (index, container) in containers.into_iter().enumerate() {
            let header_date = header_dates.get(index).cloned().flatten();
            match self.extract_container(container, header_date, &ctx) {
                Some(record) => {
                    tracing::debug!(
                        "Extracted record from {} ({} fields)",
                        source_url,
                        record.len()
                    );
                    page.records.push(record);
                }
                None => page.dropped += 1,
            }
        }

        tracing::info!(
            "Parsed {} records from {} ({} containers, {} dropped)",
            page.records.len(),
            source_url,
            page.containers,
            page.dropped
        );
        page
    }

    /// Picks containers with the first strategy matching at least one element
    ///
    /// Without container strategies the document root is the single container.
    fn select_containers<'d>(
        &self,
        document: &'d Html,
    ) -> (Option<&Selector>, Vec<ElementRef<'d>>) {
        let root = document.root_element();
        if self.containers.is_empty() {
            return (None, vec![root]);
        }

        for selector in &self.containers {
            let found: Vec<ElementRef<'d>> = root.select(selector).collect();
            if !found.is_empty() {
                return (Some(selector), found);
            }
        }

        tracing::debug!("No container strategy matched for {}", self.name());
        (None, Vec::new())
    }

    /// Computes the header date of every container, indexed by container position
    ///
    /// The document is walked in order: a header sets the current date (or
    /// clears it if unparseable) and every following container takes it until
    /// the next header.
    fn header_dates(
        &self,
        document: &Html,
        strategy: Option<&Selector>,
        ctx: &PageContext<'_>,
    ) -> Vec<Option<String>> {
        let Some(container_selector) = strategy else {
            return Vec::new();
        };
        let Some(header) = self.enrichments.iter().find_map(|e| match e {
            CompiledEnrichment::DateHeaders { header, .. } => Some(header),
            _ => None,
        }) else {
            return Vec::new();
        };

        let today = ctx.reference.date_naive();
        let mut current: Option<String> = None;
        let mut dates = Vec::new();

        for node in document.root_element().descendants().skip(1) {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            if header.matches(&element) {
                let text = element_text(element);
                current = normalize_date(&text, today);
                tracing::debug!("Found date header: {} -> {:?}", text, current);
            } else if container_selector.matches(&element) {
                dates.push(current.clone());
            }
        }

        dates
    }

    fn extract_container(
        &self,
        container: ElementRef<'_>,
        header_date: Option<String>,
        ctx: &PageContext<'_>,
    ) -> Option<Record> {
        let profile = &self.profile;
        let extracted = self.extract_fields(container, header_date, ctx);

        let admitted = profile.page.required.is_empty()
            || profile
                .page
                .required
                .iter()
                .any(|name| extracted.contains_key(name));
        if !admitted {
            return None;
        }

        let mut record = Record::new();
        record.insert_text("source", profile.source());
        if let (Some(key), Some(query)) = (&profile.query_key, ctx.query) {
            record.insert_text(key, query);
        }
        record.insert_text(&profile.url_key, ctx.source_url);
        record.insert_text("scraped_at", &ctx.scraped_at);

        merge_absent(&mut record, extracted);
        Some(record)
    }

    /// Evaluates the fields and enrichments of one container
    fn extract_fields(
        &self,
        container: ElementRef<'_>,
        header_date: Option<String>,
        ctx: &PageContext<'_>,
    ) -> Record {
        let mut extracted = Record::new();
        for field in &self.fields {
            if let Some(value) = evaluate_field(field, container, ctx) {
                extracted.insert_text(&field.name, &value);
            }
        }

        for enrichment in &self.enrichments {
            match enrichment {
                CompiledEnrichment::DateHeaders { field, .. } => {
                    if let Some(date) = &header_date {
                        extracted.insert_text(field, date);
                    }
                }
                CompiledEnrichment::DefinitionList { aliases } => {
                    self.definition_pairs(container, aliases, &mut extracted);
                }
                CompiledEnrichment::SocialLinks { field } => {
                    let socials = self.social_links(container);
                    extracted.insert_value(field, Value::Object(socials));
                }
                CompiledEnrichment::TextFlag {
                    field,
                    selector,
                    needle,
                } => {
                    let text = selector
                        .as_ref()
                        .and_then(|s| container.select(s).next())
                        .map(element_text)
                        .filter(|t| !t.is_empty());
                    match text {
                        Some(text) => {
                            extracted.insert_text(field, &text);
                        }
                        None if container.html().to_lowercase().contains(needle.as_str()) => {
                            extracted.insert_value(field, Value::Bool(true));
                        }
                        None => {}
                    }
                }
                CompiledEnrichment::Nested {
                    field,
                    containers,
                    fields,
                    count_field,
                    definition_lists,
                    required,
                    tally,
                } => {
                    let items = self.nested_items(
                        container,
                        containers,
                        fields,
                        *definition_lists,
                        required,
                        ctx,
                    );
                    let count = items.len();
                    let counts = tally.as_ref().map(|tally| tally_items(&items, tally));
                    if extracted.insert_value(field, Value::Array(items)) {
                        if let Some(count_field) = count_field {
                            extracted.insert_value(count_field, Value::from(count));
                        }
                        if let (Some(tally), Some((active, ended))) = (tally, counts) {
                            extracted.insert_value(&tally.active_field, Value::from(active));
                            extracted.insert_value(&tally.ended_field, Value::from(ended));
                        }
                    }
                }
            }
        }
        extracted
    }

    /// Adds `dt`/`dd` pairs under `scope` without overriding existing keys
    ///
    /// The first alias matching a term names the key; other terms are
    /// turned into snake_case.
    fn definition_pairs(&self, scope: ElementRef<'_>, aliases: &[TermAlias], record: &mut Record) {
        for list in scope.select(&self.definition_lists) {
            let terms = list.select(&self.terms).map(element_text);
            let definitions = list.select(&self.definitions).map(element_text);
            for (term, definition) in terms.zip(definitions) {
                let key = match aliases.iter().find(|alias| alias.matches(&term)) {
                    Some(alias) => alias.field.clone(),
                    None => definition_key(&term),
                };
                if !key.is_empty() {
                    record.insert_text_if_absent(&key, &definition);
                }
            }
        }
    }

    fn social_links(&self, scope: ElementRef<'_>) -> Map<String, Value> {
        let mut socials = Map::new();
        for anchor in scope.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(url) = Url::parse(href.trim()) else {
                continue;
            };
            let Some(host) = normalized_host(&url) else {
                continue;
            };
            for (suffix, network) in SOCIAL_NETWORKS {
                if host == *suffix || host.ends_with(&format!(".{}", suffix)) {
                    socials.insert(network.to_string(), Value::String(href.trim().to_string()));
                    break;
                }
            }
        }
        socials
    }

    fn nested_items(
        &self,
        scope: ElementRef<'_>,
        containers: &[Selector],
        fields: &[CompiledField],
        definition_lists: bool,
        required: &[String],
        ctx: &PageContext<'_>,
    ) -> Vec<Value> {
        let elements: Vec<ElementRef<'_>> = containers
            .iter()
            .map(|selector| scope.select(selector).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default();

        let mut items = Vec::new();
        for element in elements {
            let mut item = Record::new();
            for field in fields {
                if let Some(value) = evaluate_field(field, element, ctx) {
                    item.insert_text(&field.name, &value);
                }
            }
            if definition_lists {
                self.definition_pairs(element, &[], &mut item);
            }
            let admitted = required.is_empty() || required.iter().any(|k| item.contains_key(k));
            if admitted && !item.is_empty() {
                items.push(Value::from(item));
            }
        }
        items
    }
}

/// Copies every entry of `extra` whose key is not in `record` yet
fn merge_absent(record: &mut Record, extra: Record) {
    for (key, value) in extra.into_map() {
        if !record.contains_key(&key) {
            record.insert_value(&key, value);
        }
    }
}

/// Counts active and ended items
fn tally_items(items: &[Value], tally: &Tally) -> (usize, usize) {
    let active = items
        .iter()
        .filter(|item| {
            let status = item.get(&tally.status_key).and_then(Value::as_str);
            status.is_some_and(|s| s.trim().eq_ignore_ascii_case("active"))
                || item.get(&tally.end_key).is_none()
        })
        .count();
    (active, items.len() - active)
}

/// Evaluates a field's fallback chain; the first non-empty candidate wins
///
/// A candidate whose transforms fail (an href that cannot be resolved) counts
/// as empty and the chain moves on.
fn evaluate_field(
    field: &CompiledField,
    scope: ElementRef<'_>,
    ctx: &PageContext<'_>,
) -> Option<String> {
    for candidate in &field.candidates {
        let raw = if candidate.page_url {
            Some(ctx.source_url.to_string())
        } else {
            let target = match &candidate.selector {
                Some(selector) => scope.select(selector).next(),
                None => Some(scope),
            };
            target.and_then(|element| match &candidate.attr {
                Some(attr) => element.value().attr(attr).map(str::to_string),
                None => Some(element_text(element)),
            })
        };

        let Some(raw) = raw.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()) else {
            continue;
        };

        match apply_transforms(&field.name, raw, &field.transforms, ctx) {
            Ok(Some(value)) if !value.is_empty() => return Some(value),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping candidate for '{}': {}", field.name, e),
        }
    }
    None
}

fn apply_transforms(
    field: &str,
    mut value: String,
    transforms: &[Transform],
    ctx: &PageContext<'_>,
) -> ExtractResult<Option<String>> {
    for transform in transforms {
        value = match transform {
            Transform::FirstToken => match value.split_whitespace().next() {
                Some(token) => token.to_string(),
                None => return Ok(None),
            },
            Transform::AbsoluteUrl => resolve_href(ctx.base, &value)?.to_string(),
            Transform::LastPathSegment => {
                let path = value.split(['?', '#']).next().unwrap_or_default();
                match path.split('/').filter(|s| !s.is_empty()).last() {
                    Some(segment) => segment.to_string(),
                    None => return Ok(None),
                }
            }
            Transform::SegmentAfter(marker) => {
                let Some((_, rest)) = value.split_once(marker.as_str()) else {
                    return Ok(None);
                };
                match rest.split(['/', '?', '#']).next() {
                    Some(segment) if !segment.is_empty() => segment.to_string(),
                    _ => return Ok(None),
                }
            }
            Transform::StripPrefix(prefix) => {
                value.strip_prefix(prefix.as_str()).unwrap_or(&value).to_string()
            }
            Transform::StripLabel(label) => strip_label(&value, label),
            Transform::Date => match normalize_date(&value, ctx.reference.date_naive()) {
                Some(date) => date,
                None => {
                    tracing::debug!("Keeping unrecognized date for '{}': {}", field, value);
                    value
                }
            },
            Transform::Lowercase => value.to_lowercase(),
        };
    }

    Ok(Some(value.trim().to_string()))
}

/// Collapses an element's text nodes into single-spaced text
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes a leading label such as "Appointed on", ignoring case
fn strip_label(value: &str, label: &str) -> String {
    let trimmed = value.trim_start();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => {
            trimmed[label.len()..].trim_start_matches([':', ' ']).to_string()
        }
        _ => value.to_string(),
    }
}

/// Turns a definition term into a snake_case key
fn definition_key(term: &str) -> String {
    term.trim()
        .trim_end_matches(':')
        .to_lowercase()
        .replace([' ', '-'], "_")
}
