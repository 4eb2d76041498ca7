//! URL templates for paginated and search-driven crawls, and sub-page paths

use url::form_urlencoded;

/// Placeholder replaced by the page number in a pagination path
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Placeholder replaced by the encoded query in a search URL template
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Builds the URL of page `page` of a paginated listing
///
/// Page 1 is always the start URL itself; later pages append `page_path`
/// (with `{page}` substituted) to the start URL without its trailing slash.
///
/// # Examples
///
/// ```
/// use sitecrawl::url::page_url;
///
/// assert_eq!(page_url("https://betalist.com/", "startups/page/{page}", 1), "https://betalist.com/");
/// assert_eq!(
///     page_url("https://betalist.com/", "startups/page/{page}", 3),
///     "https://betalist.com/startups/page/3"
/// );
/// ```
pub fn page_url(start_url: &str, page_path: &str, page: u32) -> String {
    if page <= 1 {
        return start_url.to_string();
    }

    let path = page_path
        .trim_start_matches('/')
        .replace(PAGE_PLACEHOLDER, &page.to_string());
    format!("{}/{}", start_url.trim_end_matches('/'), path)
}

/// Builds a search URL by substituting the form-encoded query into the template
pub fn search_url(template: &str, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    template.replace(QUERY_PLACEHOLDER, &encoded)
}

/// Appends a sub-page path to a detail page URL (`/company/1` + `officers`)
pub fn subpage_url(detail_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        detail_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
