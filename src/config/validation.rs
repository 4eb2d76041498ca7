use crate::config::types::{Config, CrawlJob, FetchConfig, OutputConfig, UserAgentConfig};
use crate::extract::{CompiledProfile, SiteProfile, Traversal};
use crate::sites::SiteRegistry;
use crate::url::{PAGE_PLACEHOLDER, QUERY_PLACEHOLDER};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    for site in &config.sites {
        validate_site_profile(site)?;
    }

    let registry = SiteRegistry::with_custom(&config.sites);
    validate_crawl_jobs(&config.crawls, &registry)
}

/// Validates crawl jobs, whether read from the configuration or built from flags
pub fn validate_crawl_jobs(jobs: &[CrawlJob], registry: &SiteRegistry) -> Result<(), ConfigError> {
    jobs.iter().try_for_each(|job| validate_crawl_job(job, registry))
}

/// Validates fetch loop configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 600 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 600, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.rate_limit_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "rate-limit-ms must be <= 60000, got {}",
            config.rate_limit_ms
        )));
    }

    Ok(())
}

/// Validates request header values
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("value", &config.value),
        ("accept", &config.accept),
        ("accept-language", &config.accept_language),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "user-agent {} cannot be empty",
                name
            )));
        }
        if value.chars().any(char::is_control) {
            return Err(ConfigError::Validation(format!(
                "user-agent {} contains control characters",
                name
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a site profile declared in the configuration
pub fn validate_site_profile(profile: &SiteProfile) -> Result<(), ConfigError> {
    validate_site_name(&profile.name)?;
    validate_http_url(&profile.base_url, "base-url")?;

    if profile.url_key.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' has an empty url-key",
            profile.name
        )));
    }

    match &profile.traversal {
        Traversal::Paginated { page_path } if !page_path.contains(PAGE_PLACEHOLDER) => {
            return Err(ConfigError::Validation(format!(
                "Site '{}' page-path must contain {}",
                profile.name, PAGE_PLACEHOLDER
            )));
        }
        Traversal::Search {
            url_template,
            follow,
        } => {
            if !url_template.contains(QUERY_PLACEHOLDER) {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' url-template must contain {}",
                    profile.name, QUERY_PLACEHOLDER
                )));
            }
            validate_http_url(&url_template.replace(QUERY_PLACEHOLDER, "q"), "url-template")?;

            if let Some(follow) = follow {
                if follow.link_field.trim().is_empty() || follow.url_key.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "Site '{}' follow rules need a link-field and a url-key",
                        profile.name
                    )));
                }
                if follow.subpages.iter().any(|sub| sub.path.trim_matches('/').is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "Site '{}' has a follow sub-page with an empty path",
                        profile.name
                    )));
                }
            }
        }
        Traversal::ListingDetail { link_contains } if link_contains.is_empty() => {
            return Err(ConfigError::Validation(format!(
                "Site '{}' link-contains cannot be empty",
                profile.name
            )));
        }
        _ => {}
    }

    CompiledProfile::compile(profile.clone())?;
    Ok(())
}

/// Validates a crawl job against the known site profiles
fn validate_crawl_job(job: &CrawlJob, registry: &SiteRegistry) -> Result<(), ConfigError> {
    if registry.get(&job.site).is_none() {
        return Err(ConfigError::Validation(format!(
            "Crawl job references unknown site '{}'",
            job.site
        )));
    }

    if let Some(start_url) = &job.start_url {
        validate_http_url(start_url, "start-url")?;
    }

    if job.max_pages == Some(0) {
        return Err(ConfigError::Validation(format!(
            "max-pages for site '{}' must be >= 1",
            job.site
        )));
    }

    if let Some(links_from) = &job.links_from {
        if links_from.field.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "links-from field for site '{}' cannot be empty",
                job.site
            )));
        }
    }

    Ok(())
}

/// Site names become file-name prefixes: alphanumeric, '_' and '-' only
fn validate_site_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "Site name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Site name must contain only alphanumeric characters, '_' and '-', got '{}'",
            name
        )));
    }

    Ok(())
}

fn validate_http_url(value: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    Ok(())
}
