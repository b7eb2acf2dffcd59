//! Integration tests for crawl scheduling
//!
//! These run the coordinator against a scripted in-process renderer so lane
//! interleaving can be exercised without a network: deduplication under
//! concurrency, the request budget, and the timeout retry policy.

use async_trait::async_trait;
use page_harvest::config::{Config, CrawlSession};
use page_harvest::crawler::{Coordinator, RenderError, RenderedDocument, Renderer, MAX_ATTEMPTS};
use page_harvest::output::StopReason;
use page_harvest::storage::{DatasetStore, SessionStatus, SqliteDataset};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const SEED: &str = "https://site.test/";

/// Serves generated pages; paths in `hangs` never finish loading and paths
/// in `crashes` panic
struct ScriptedRenderer {
    pages: HashMap<String, String>,
    hangs: HashSet<String>,
    crashes: HashSet<String>,
    calls: Mutex<Vec<String>>,
    latency: Duration,
}

impl ScriptedRenderer {
    fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            hangs: HashSet::new(),
            crashes: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            latency: Duration::from_millis(2),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, url: &Url, _timeout: Duration) -> Result<RenderedDocument, RenderError> {
        self.calls.lock().unwrap().push(url.path().to_string());

        if self.crashes.contains(url.path()) {
            panic!("renderer crashed on {}", url);
        }
        if self.hangs.contains(url.path()) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::time::sleep(self.latency).await;

        match self.pages.get(url.path()) {
            Some(html) => Ok(RenderedDocument {
                final_url: url.clone(),
                title: None,
                html: html.clone(),
                image_sizes: None,
            }),
            None => Err(RenderError::Navigation(format!("404 for {}", url))),
        }
    }
}

/// `count` pages where every page links to every other page
fn dense_site(count: usize) -> HashMap<String, String> {
    let paths: Vec<String> = std::iter::once("/".to_string())
        .chain((1..count).map(|i| format!("/p{}", i)))
        .collect();

    paths
        .iter()
        .map(|page| {
            let links: String = paths
                .iter()
                .map(|target| format!(r#"<a href="{}">{}</a>"#, target, target))
                .collect();
            let html = format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                page, links
            );
            (page.clone(), html)
        })
        .collect()
}

fn session(max_requests: u32, concurrency: usize) -> CrawlSession {
    let mut config = Config::default();
    config.crawl.max_requests = max_requests;
    config.crawl.concurrency = concurrency;
    CrawlSession::from_config(&config, SEED).unwrap()
}

#[tokio::test]
async fn test_no_duplicate_renders_under_concurrency() {
    let renderer = Arc::new(ScriptedRenderer::new(dense_site(40)));
    let dataset = Arc::new(SqliteDataset::new_in_memory().unwrap());
    let session = session(100, 8);

    let report = Coordinator::new(session.clone(), renderer.clone(), dataset.clone())
        .run()
        .await
        .unwrap();

    let calls = renderer.calls();
    let unique: HashSet<_> = calls.iter().collect();
    assert_eq!(calls.len(), 40);
    assert_eq!(unique.len(), 40);

    assert_eq!(report.admitted, 40);
    assert_eq!(report.succeeded, 40);
    assert_eq!(report.stop_reason, StopReason::Drained);
    assert_eq!(dataset.count(&session.name).unwrap(), 40);
}

#[tokio::test]
async fn test_budget_never_exceeded() {
    let renderer = Arc::new(ScriptedRenderer::new(dense_site(60)));
    let dataset = Arc::new(SqliteDataset::new_in_memory().unwrap());
    let session = session(15, 8);

    let report = Coordinator::new(session.clone(), renderer.clone(), dataset.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.calls().len(), 15);
    assert_eq!(report.admitted, 15);
    assert_eq!(report.records, 15);
    assert_eq!(report.deferred.len(), 45);
    assert!(!report.deferred.contains(&SEED.to_string()));
}

#[tokio::test]
async fn test_hanging_page_rendered_exactly_twice() {
    let mut site = dense_site(3);
    site.remove("/p2");
    let mut renderer = ScriptedRenderer::new(site);
    renderer.hangs.insert("/p2".to_string());
    let renderer = Arc::new(renderer);

    let dataset = Arc::new(SqliteDataset::new_in_memory().unwrap());
    let mut session = session(10, 2);
    session.request_timeout = Duration::from_millis(200);

    let report = Coordinator::new(session, renderer.clone(), dataset)
        .run()
        .await
        .unwrap();

    let hung = renderer.calls().iter().filter(|p| *p == "/p2").count();
    assert_eq!(hung, MAX_ATTEMPTS as usize);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_missing_page_skipped_after_retry() {
    let mut site = dense_site(2);
    site.insert(
        "/".to_string(),
        r#"<a href="/p1">one</a><a href="/gone">gone</a>"#.to_string(),
    );
    let renderer = Arc::new(ScriptedRenderer::new(site));
    let dataset = Arc::new(SqliteDataset::new_in_memory().unwrap());

    let report = Coordinator::new(session(10, 1), renderer.clone(), dataset)
        .run()
        .await
        .unwrap();

    let gone = renderer.calls().iter().filter(|p| *p == "/gone").count();
    assert_eq!(gone, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_crashing_renderer_does_not_stall_other_lanes() {
    let mut site = dense_site(6);
    site.remove("/p3");
    let mut renderer = ScriptedRenderer::new(site);
    renderer.crashes.insert("/p3".to_string());
    let renderer = Arc::new(renderer);

    let dataset = Arc::new(SqliteDataset::new_in_memory().unwrap());
    let session = session(10, 2);

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        Coordinator::new(session.clone(), renderer.clone(), dataset.clone()).run(),
    )
    .await
    .expect("crawl terminates")
    .unwrap();

    assert_eq!(report.failed_lanes, 1);
    assert_eq!(report.succeeded, 5);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.unprocessed, 0);

    let stored = dataset.get_session(&session.name).unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Failed);
}
