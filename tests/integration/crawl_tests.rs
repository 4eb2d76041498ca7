//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! crawl sessions against them: fetch, extract, accumulate and export.

use sitecrawl::config::{Config, CrawlJob, FetchConfig, LinksFrom, OutputConfig, UserAgentConfig};
use sitecrawl::crawler::{run_job, Crawler};
use sitecrawl::extract::{CompiledProfile, SiteProfile, Traversal};
use sitecrawl::output::read_json;
use sitecrawl::sites::{self, SiteRegistry};
use sitecrawl::ScrapeError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetch settings short enough for tests
fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        rate_limit_ms: 5,
        max_retries: 1,
        timeout_secs: 5,
        backoff_base_ms: 5,
    }
}

/// Looks up a built-in profile and points it at the mock server
fn profile_for(name: &str, base_url: &str) -> SiteProfile {
    let mut profile = sites::find(name).expect("built-in profile");
    profile.base_url = base_url.to_string();
    profile
}

fn create_crawler(profile: SiteProfile, output_dir: &Path) -> Crawler {
    let compiled = CompiledProfile::compile(profile).expect("profile compiles");
    Crawler::new(
        compiled,
        test_fetch_config(),
        UserAgentConfig::default(),
        output_dir.to_path_buf(),
    )
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

fn betalist_page(header: &str, entries: &[(u32, &str)]) -> String {
    let mut body = format!(
        r#"<html><body><div class="grid"><div class="col-span-full text-3xl">{}</div>"#,
        header
    );
    for (id, title) in entries {
        body.push_str(&format!(
            r#"<div class="block" id="startup-{id}">
                 <a class="font-medium" href="/startups/{id}">{title}</a>
                 <a class="text-gray-500" href="/startups/{id}">About {title}</a>
               </div>"#
        ));
    }
    body.push_str("</div></body></html>");
    body
}

#[tokio::test]
async fn test_paginated_crawl_stops_at_first_failed_page() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&betalist_page(
            "November 17, 2025",
            &[(1, "SubWatch"), (2, "Quill")],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/startups/page/2"))
        .respond_with(html(&betalist_page("16 November 2025", &[(3, "Lumen")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/startups/page/3"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Never reached: the crawl stops at the 404 on page 3
    Mock::given(method("GET"))
        .and(path("/startups/page/4"))
        .respond_with(html(&betalist_page("15 November 2025", &[(4, "Late")])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut crawler = create_crawler(profile_for("betalist", &base_url), temp_dir.path());
    crawler.start().expect("session starts");
    let added = crawler
        .crawl(None, Some(5))
        .await
        .expect("crawl succeeds")
        .len();
    crawler.shutdown();

    assert_eq!(added, 3);
    let records = crawler.records();
    let titles: Vec<_> = records.iter().filter_map(|r| r.get_str("title")).collect();
    assert_eq!(titles, vec!["SubWatch", "Quill", "Lumen"]);

    assert_eq!(records[0].get_str("source"), Some("betalist"));
    assert_eq!(records[0].get_str("url"), Some(base_url.as_str()));
    assert_eq!(records[0].get_str("date_launched"), Some("17-11-2025"));
    assert_eq!(records[0].get_str("startup_id"), Some("1"));
    assert_eq!(
        records[1].get_str("link"),
        Some(format!("{}/startups/2", mock_server.uri()).as_str())
    );
    assert_eq!(records[2].get_str("date_launched"), Some("16-11-2025"));
    assert!(records.iter().all(|r| r.contains_key("scraped_at")));

    let stats = crawler.statistics();
    assert_eq!(stats.pages_parsed, 2);
    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.records, 3);
    assert_eq!(stats.fetch.requests, 3);
}

#[tokio::test]
async fn test_listing_detail_crawl_skips_failed_details() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/tool/toolio">Toolio</a>
                <a href="/tool/broken">Broken</a>
                <a href="/tool/quill">Quill</a>
                <a href="/tool/toolio">Toolio again</a>
                <a href="/blog/launch-week">Blog</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tool/toolio"))
        .respond_with(html(
            r#"<html><body>
                <h1>Toolio</h1>
                <div class="overview">Ship docs faster.</div>
                <a href="https://toolio.app">Visit</a>
                <span class="price-label">Freemium</span>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tool/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tool/quill"))
        .respond_with(html(
            r#"<html><body>
                <h1>Quill</h1>
                <p>Write with AI.</p>
                <span class="for-sale-badge">This tool is for sale</span>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut crawler = create_crawler(profile_for("uneed", &base_url), temp_dir.path());
    crawler.start().expect("session starts");
    crawler.crawl(None, None).await.expect("crawl succeeds");
    crawler.shutdown();

    let records = crawler.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].get_str("source"), Some("uneed_best"));
    assert_eq!(
        records[0].get_str("tool_url"),
        Some(format!("{}/tool/toolio", base_url).as_str())
    );
    assert_eq!(records[0].get_str("tool_name"), Some("Toolio"));
    assert_eq!(records[0].get_str("website"), Some("https://toolio.app"));
    assert_eq!(records[0].get_str("pricing"), Some("Freemium"));

    assert_eq!(records[1].get_str("tool_name"), Some("Quill"));
    assert_eq!(records[1].get_str("overview"), Some("Write with AI."));
    assert_eq!(records[1].get_str("for_sale"), Some("This tool is for sale"));

    let stats = crawler.statistics();
    assert_eq!(stats.pages_parsed, 3);
    assert_eq!(stats.pages_failed, 1);
}

#[tokio::test]
async fn test_search_crawl_tags_records_with_query() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/search/companies"))
        .and(query_param("q", "acme widgets"))
        .respond_with(html(
            r#"<html><body><ul id="results">
                <li class="type-company">
                  <h3 class="heading-small"><a href="/company/01234567">ACME WIDGETS LIMITED</a></h3>
                  <p class="company-status">Active</p>
                  <p class="company-address">1 High Street, London</p>
                </li>
                <li class="pagination-item"><span>Next</span></li>
            </ul></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/companies"))
        .and(query_param("q", "nobody"))
        .respond_with(html(r#"<html><body><ul id="results"></ul></body></html>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut profile = profile_for("companies_house", &base_url);
    profile.traversal = Traversal::Search {
        url_template: format!("{}/search/companies?q={{query}}", base_url),
        follow: None,
    };

    let mut crawler = create_crawler(profile, temp_dir.path());
    crawler.start().expect("session starts");
    let inputs = vec!["acme widgets".to_string(), "nobody".to_string()];
    crawler.crawl_inputs(&inputs).await.expect("crawl succeeds");
    crawler.shutdown();

    let records = crawler.records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.get_str("source"), Some("companies_house_uk"));
    assert_eq!(record.get_str("search_query"), Some("acme widgets"));
    assert_eq!(record.get_str("company_name"), Some("ACME WIDGETS LIMITED"));
    assert_eq!(record.get_str("company_number"), Some("01234567"));
    assert_eq!(record.get_str("company_status"), Some("Active"));
    assert_eq!(
        record.get_str("company_link"),
        Some(format!("{}/company/01234567", base_url).as_str())
    );

    let keys: Vec<_> = record.keys().take(4).map(String::as_str).collect();
    assert_eq!(keys, vec!["source", "search_query", "search_url", "scraped_at"]);
}

/// Points a built-in search profile's URL template at the mock server
fn search_at(mut profile: SiteProfile, base_url: &str) -> SiteProfile {
    if let Traversal::Search { url_template, .. } = &mut profile.traversal {
        *url_template = format!("{}/search/companies?q={{query}}", base_url);
    }
    profile
}

#[tokio::test]
async fn test_company_search_then_officer_profiles() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/search/companies"))
        .and(query_param("q", "acme"))
        .respond_with(html(
            r#"<ul id="results"><li class="type-company">
                 <h3 class="heading-small"><a href="/company/01234567">ACME WIDGETS LIMITED</a></h3>
               </li></ul>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/company/01234567"))
        .respond_with(html(
            r#"<p class="heading-xlarge">ACME WIDGETS LIMITED</p>
               <dl><dt>Company status</dt><dd>Active</dd>
                   <dt>Company type</dt><dd>Private limited Company</dd></dl>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/company/01234567/officers"))
        .respond_with(html(
            r#"<div class="appointment">
                 <h3><a href="/officers/abc123/appointments">SMITH, Jane</a></h3>
                 <span class="officer-role">Director</span>
               </div>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/officers/abc123/appointments"))
        .respond_with(html(
            r#"<h1 class="heading-xlarge">Jane SMITH</h1>
               <div class="appointment">
                 <h2><a href="/company/01234567">ACME WIDGETS LIMITED (01234567)</a></h2>
                 <p class="status">Active</p>
               </div>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        fetch: test_fetch_config(),
        output: OutputConfig {
            directory: temp_dir.path().to_path_buf(),
            csv: false,
            debug_html: false,
        },
        ..Config::default()
    };
    let registry = SiteRegistry::with_custom(&[search_at(
        profile_for("companies_house", &base_url),
        &base_url,
    )]);

    let search_job = CrawlJob {
        inputs: vec!["acme".to_string()],
        ..CrawlJob::new("companies_house")
    };
    let stats = run_job(&config, &registry, &search_job)
        .await
        .expect("search job succeeds");
    assert_eq!(stats.records, 1);
    assert_eq!(stats.fetch.requests, 3);

    let export = stats.exported[0].clone();
    let companies = read_json(&export).expect("JSON reads back");
    let company = &companies[0];
    assert_eq!(company.get_str("search_query"), Some("acme"));
    assert_eq!(
        company.get_str("company_url"),
        Some(format!("{}/company/01234567", base_url).as_str())
    );
    assert_eq!(company.get_str("company_number"), Some("01234567"));
    assert_eq!(company.get_str("company_type"), Some("Private limited Company"));
    assert_eq!(company.get("officer_count"), Some(&serde_json::json!(1)));

    let officers_job = CrawlJob {
        links_from: Some(LinksFrom {
            file: export,
            field: "officers.officer_link".to_string(),
        }),
        ..CrawlJob::new("companies_house_officers")
    };
    let stats = run_job(&config, &registry, &officers_job)
        .await
        .expect("officers job succeeds");
    assert_eq!(stats.records, 1);

    let officers = read_json(&stats.exported[0]).expect("JSON reads back");
    assert_eq!(officers[0].get_str("officer_id"), Some("abc123"));
    assert_eq!(officers[0].get_str("officer_name"), Some("Jane SMITH"));
    assert_eq!(officers[0].get("appointment_count"), Some(&serde_json::json!(1)));
    assert_eq!(officers[0].get("active_appointments"), Some(&serde_json::json!(1)));
    assert_eq!(officers[0].get("resigned_appointments"), Some(&serde_json::json!(0)));
}

#[tokio::test]
async fn test_search_site_needs_inputs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut crawler = create_crawler(
        profile_for("companies_house", "http://127.0.0.1:9"),
        temp_dir.path(),
    );

    crawler.start().expect("session starts");
    let needs_inputs = matches!(
        crawler.crawl(None, None).await,
        Err(ScrapeError::UnsupportedTraversal { .. })
    );
    crawler.shutdown();

    assert!(needs_inputs);
}

#[tokio::test]
async fn test_crawl_before_start_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut crawler = create_crawler(
        profile_for("betalist", "http://127.0.0.1:9/"),
        temp_dir.path(),
    );

    let result = crawler.crawl(None, Some(1)).await;
    assert!(matches!(result, Err(ScrapeError::SessionNotStarted)));
}

#[tokio::test]
async fn test_run_job_exports_json_and_csv() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&betalist_page(
            "November 17, 2025",
            &[(1, "SubWatch"), (2, "Quill, Inc")],
        )))
        .mount(&mock_server)
        .await;

    let config = Config {
        fetch: test_fetch_config(),
        output: OutputConfig {
            directory: temp_dir.path().to_path_buf(),
            csv: true,
            debug_html: false,
        },
        ..Config::default()
    };

    let registry = SiteRegistry::with_custom(&[profile_for("betalist", &base_url)]);
    let job = CrawlJob {
        max_pages: Some(1),
        ..CrawlJob::new("betalist")
    };

    let stats = run_job(&config, &registry, &job)
        .await
        .expect("job succeeds");

    assert_eq!(stats.records, 2);
    assert_eq!(stats.exported.len(), 2);

    let json_path = stats
        .exported
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .expect("JSON file exported");
    assert!(json_path.starts_with(temp_dir.path().join("betalist")));
    let records = read_json(json_path).expect("JSON reads back");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get_str("title"), Some("Quill, Inc"));

    let csv_path = stats
        .exported
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "csv"))
        .expect("CSV file exported");
    let csv = std::fs::read_to_string(csv_path).expect("CSV readable");
    let mut lines = csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("source,url,scraped_at"));
    assert!(header.contains("title"));
    assert_eq!(lines.count(), 2);
    assert!(csv.contains("\"Quill, Inc\""));
}

#[tokio::test]
async fn test_run_job_with_unknown_site() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config {
        output: OutputConfig {
            directory: temp_dir.path().to_path_buf(),
            ..OutputConfig::default()
        },
        ..Config::default()
    };

    let registry = SiteRegistry::builtin();
    let result = run_job(&config, &registry, &CrawlJob::new("nowhere")).await;

    assert!(matches!(result, Err(ScrapeError::UnknownSite(name)) if name == "nowhere"));
}
