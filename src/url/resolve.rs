use crate::{ExtractError, ExtractResult};
use url::Url;

/// Resolves an href against the URL of the page it was found on
///
/// Absolute hrefs are returned as-is (after parsing); relative hrefs are
/// joined onto `base`. Surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use sitecrawl::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://site.test/a/").unwrap();
/// let resolved = resolve_href(&base, "/x/y").unwrap();
/// assert_eq!(resolved.as_str(), "https://site.test/x/y");
/// ```
pub fn resolve_href(base: &Url, href: &str) -> ExtractResult<Url> {
    base.join(href.trim()).map_err(|source| ExtractError::Link {
        href: href.to_string(),
        base: base.to_string(),
        source,
    })
}

/// Resolves a link href to an absolute URL if it points at a followable page
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
