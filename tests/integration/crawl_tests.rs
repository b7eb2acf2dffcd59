//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end with the HTTP renderer: render, extract, store,
//! enqueue, then export.

use page_harvest::config::{Config, CrawlSession, RendererKind};
use page_harvest::crawler::{Coordinator, HttpRenderer};
use page_harvest::output::{export_dataset, CrawlReport, DEFAULT_EXCLUDED_FIELDS};
use page_harvest::storage::{DatasetStore, SessionStatus, SqliteDataset};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for the given crawl budget
fn create_test_config(max_requests: u32, concurrency: usize, storage_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawl.max_requests = max_requests;
    config.crawl.concurrency = concurrency;
    config.crawl.request_timeout_secs = 1;
    config.renderer.kind = RendererKind::Http;
    config.renderer.user_agent = "TestHarvester/1.0".to_string();
    config.output.storage_dir = storage_dir.to_string_lossy().into_owned();
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Runs a complete crawl against `seed` and returns the report and the dataset
async fn crawl(config: &Config, seed: &str) -> (CrawlReport, Arc<SqliteDataset>, CrawlSession) {
    let session = CrawlSession::from_config(config, seed).expect("valid session");
    let dataset =
        Arc::new(SqliteDataset::new(&config.output.dataset_path()).expect("dataset opens"));
    let renderer = Arc::new(HttpRenderer::new(&config.renderer.user_agent).unwrap());

    let coordinator = Coordinator::new(session.clone(), renderer, dataset.clone());
    let report = coordinator.run().await.expect("crawl runs");
    (report, dataset, session)
}

/// Same server, different hostname: out of scope for a 127.0.0.1 seed
fn cross_host(server: &MockServer, route: &str) -> String {
    let port = url::Url::parse(&server.uri()).unwrap().port().unwrap();
    format!("http://localhost:{}{}", port, route)
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<html><head><title>Home</title>
            <meta name="description" content="The home page"></head><body>
            <p> Welcome </p>
            <a href="/page1">Page 1</a>
            <a href="/page2#section">Page 2</a>
            <a href="{}">Elsewhere</a>
            <img src="/logo.png" alt="Logo" width="64" height="32">
            </body></html>"#,
            cross_host(&mock_server, "/cross")
        ),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>
        <p>One</p><a href="/">Home</a><a href="/page2">Page 2</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body><p>Two</p></body></html>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/cross", "<p>never</p>", 0).await;

    let config = create_test_config(50, 3, dir.path());
    let (report, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(session.name, "127_0_0_1");
    assert_eq!(report.admitted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.skipped, 0);
    assert!(report.deferred.is_empty());
    assert_eq!(dataset.count(&session.name).unwrap(), 3);

    let records = dataset.read_all(&session.name).unwrap();
    let home = records
        .iter()
        .find(|r| r.title == "Home")
        .expect("home page recorded");
    assert_eq!(home.meta_description, "The home page");
    assert_eq!(home.paragraphs, vec!["Welcome"]);
    assert_eq!(home.links.len(), 3);
    assert!(home.links[1].href.ends_with("/page2#section"));
    assert_eq!(home.images.len(), 1);
    assert_eq!(home.images[0].alt, "Logo");
    assert_eq!((home.images[0].width, home.images[0].height), (64, 32));

    let stored = dataset.get_session(&session.name).unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.config_hash, session.fingerprint());

    // Export mirrors the dataset minus excluded fields
    let export_path = export_dataset(
        &*dataset,
        &session.name,
        &config.output.exclude_fields,
        &config.output.export_dir(),
    )
    .unwrap();
    assert_eq!(export_path, dir.path().join("exports").join("127_0_0_1.json"));

    let exported: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(exported.len(), records.len());
    for (item, record) in exported.iter().zip(&records) {
        assert_eq!(item, &serde_json::to_value(record).unwrap());
        let keys: Vec<_> = item.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["url", "title", "metaDescription", "paragraphs", "links", "images"]
        );
    }
}

#[tokio::test]
async fn test_single_request_budget_defers_same_host_links() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<html><head><title>Seed</title></head><body>
            <a href="/a">A</a><a href="/b">B</a><a href="{}">Cross</a>
            </body></html>"#,
            cross_host(&mock_server, "/c")
        ),
        1,
    )
    .await;
    mount_page(&mock_server, "/a", "<p>a</p>", 0).await;
    mount_page(&mock_server, "/b", "<p>b</p>", 0).await;
    mount_page(&mock_server, "/c", "<p>c</p>", 0).await;

    let config = create_test_config(1, 4, dir.path());
    let (report, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(dataset.count(&session.name).unwrap(), 1);
    assert_eq!(report.admitted, 1);
    assert_eq!(report.succeeded, 1);

    let base = mock_server.uri();
    assert_eq!(
        report.deferred,
        vec![format!("{}/a", base), format!("{}/b", base)]
    );
    assert!(!report.deferred.iter().any(|u| u.contains("localhost")));
}

#[tokio::test]
async fn test_missing_meta_description_is_empty() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>No meta</title></head><body><a href="/next">Next</a></body></html>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/next",
        r#"<html><head><title>Next</title><meta name="description" content="Has one"></head></html>"#,
        1,
    )
    .await;

    let config = create_test_config(10, 1, dir.path());
    let (report, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.succeeded, 2);
    let records = dataset.read_all(&session.name).unwrap();
    assert_eq!(records[0].title, "No meta");
    assert_eq!(records[0].meta_description, "");
    assert_eq!(records[1].meta_description, "Has one");
}

#[tokio::test]
async fn test_slow_page_tried_twice_then_skipped() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/slow">Slow</a><a href="/fast">Fast</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("<p>late</p>").set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/fast", "<title>Fast</title>", 1).await;

    let config = create_test_config(10, 2, dir.path());
    let (report, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    let urls: Vec<_> = dataset
        .read_all(&session.name)
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert!(!urls.iter().any(|u| u.ends_with("/slow")));
}

#[tokio::test]
async fn test_server_error_retried_once() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/broken">Broken</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(10, 1, dir.path());
    let (report, _, _) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_non_html_content_skipped_without_retry() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/report.pdf">Report</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(10, 1, dir.path());
    let (report, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.skipped, 1);
    assert_eq!(dataset.count(&session.name).unwrap(), 1);
}

#[tokio::test]
async fn test_redirect_records_final_url() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/old">Old</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new", "<title>New</title>", 1).await;

    let config = create_test_config(10, 1, dir.path());
    let (_, dataset, session) = crawl(&config, &mock_server.uri()).await;

    let records = dataset.read_all(&session.name).unwrap();
    let moved = records.iter().find(|r| r.title == "New").unwrap();
    assert_eq!(moved.url, format!("{}/new", mock_server.uri()));
}

#[tokio::test]
async fn test_zero_budget_exports_empty_array() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(html_page("<p>unused</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(0, 2, dir.path());
    let (report, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.admitted, 0);
    assert_eq!(dataset.count(&session.name).unwrap(), 0);

    let path = export_dataset(
        &*dataset,
        &session.name,
        DEFAULT_EXCLUDED_FIELDS,
        &config.output.export_dir(),
    )
    .unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
}

#[tokio::test]
async fn test_recrawl_replaces_previous_dataset() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "/", "<title>Home</title>", 2).await;

    let config = create_test_config(10, 1, dir.path());
    crawl(&config, &mock_server.uri()).await;
    let (_, dataset, session) = crawl(&config, &mock_server.uri()).await;

    assert_eq!(dataset.count(&session.name).unwrap(), 1);
}
