use url::Url;

/// Lowercased host of `url` without a leading `www.`
///
/// ```
/// use url::Url;
/// use sitecrawl::url::normalized_host;
///
/// let url = Url::parse("https://WWW.GitHub.com/acme").unwrap();
/// assert_eq!(normalized_host(&url), Some("github.com".to_string()));
/// ```
pub fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    })
}

/// Derives a short site identifier from a site's home URL
///
/// The identifier is the first label of the host (without `www.`), with a few
/// path-based special cases for sites that live below a larger domain:
///
/// | URL | Name |
/// |-----|------|
/// | `https://www.f6s.com/` | `f6s` |
/// | `https://www.sec.gov/edgar` | `sec_edgar` |
/// | `https://data.sec.gov/` | `sec_data` |
/// | `https://techcrunch.com/startups/` | `techcrunch_startups` |
/// | `https://www.gov.uk/government/organisations/companies-house` | `companies_house` |
///
/// Returns None if the URL cannot be parsed or has no host.
pub fn site_name_from_url(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    let host = normalized_host(&url)?;
    let path = url.path();

    let name = if path.contains("edgar") {
        "sec_edgar".to_string()
    } else if path.contains("companies-house") {
        "companies_house".to_string()
    } else if host == "data.sec.gov" {
        "sec_data".to_string()
    } else {
        let label = host.split('.').next()?;
        if path.contains("startups") {
            format!("{}_startups", label)
        } else {
            label.to_string()
        }
    };

    Some(name.replace(['-', '.'], "_"))
}
