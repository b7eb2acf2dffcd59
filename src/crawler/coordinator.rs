//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs the crawl itself:
//! - Opening the dataset session and admitting the seed
//! - Running a fixed number of lanes against the shared frontier
//! - Rendering, extracting and persisting each page, with one retry
//! - Feeding in-scope links back into the frontier
//! - Stopping on drain, wall-clock cap or an external stop signal

use crate::config::CrawlSession;
use crate::crawler::extractor::extract;
use crate::crawler::frontier::{AdmitOutcome, CrawlRequest, Frontier};
use crate::crawler::renderer::{RenderError, RenderedDocument, Renderer};
use crate::output::{CrawlReport, StopReason};
use crate::state::RequestOutcome;
use crate::storage::{DatasetStore, PageRecord, SessionInfo, SessionStatus};
use crate::url::{normalize_parsed, ScopeFilter};
use crate::HarvestError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Render attempts per URL: the first try plus one retry
pub const MAX_ATTEMPTS: u32 = 2;

/// Progress is logged every this many completed requests
const PROGRESS_INTERVAL: usize = 10;

/// Stops a running crawl from outside (e.g. on Ctrl-C)
///
/// Lanes finish the request they are working on, then exit.
#[derive(Clone)]
pub struct ShutdownHandle {
    frontier: Arc<Frontier>,
    interrupted: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        if !self.interrupted.swap(true, Ordering::SeqCst) {
            info!("Stop requested, letting in-flight pages finish");
        }
        self.frontier.stop();
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    session: CrawlSession,
    frontier: Arc<Frontier>,
    renderer: Arc<dyn Renderer>,
    dataset: Arc<dyn DatasetStore>,
    interrupted: Arc<AtomicBool>,
}

/// State shared by every lane
struct LaneContext {
    session_name: String,
    request_timeout: Duration,
    scope: ScopeFilter,
    frontier: Arc<Frontier>,
    renderer: Arc<dyn Renderer>,
    dataset: Arc<dyn DatasetStore>,
    completed: AtomicUsize,
    started: Instant,
}

impl Coordinator {
    /// Creates a coordinator for one crawl session
    ///
    /// # Arguments
    ///
    /// * `session` - Effective crawl settings
    /// * `renderer` - Rendering backend shared by all lanes
    /// * `dataset` - Store receiving one record per successful page
    pub fn new(
        session: CrawlSession,
        renderer: Arc<dyn Renderer>,
        dataset: Arc<dyn DatasetStore>,
    ) -> Self {
        let frontier = Arc::new(Frontier::new(session.max_requests as usize));
        Self {
            session,
            frontier,
            renderer,
            dataset,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            frontier: Arc::clone(&self.frontier),
            interrupted: Arc::clone(&self.interrupted),
        }
    }

    /// Runs the crawl to completion
    ///
    /// Per-page failures never abort the crawl; they are logged and the URL
    /// is counted as skipped. Only dataset session bookkeeping errors are
    /// returned.
    pub async fn run(self) -> Result<CrawlReport, HarvestError> {
        let session = &self.session;
        info!(
            "Starting crawl of {} (max {} requests, {} lanes)",
            session.seed_url, session.max_requests, session.concurrency
        );
        if let Some(host) = session.scope().host() {
            debug!("Links outside {} are ignored", host);
        }

        self.dataset.begin_session(&SessionInfo {
            name: session.name.clone(),
            seed_url: session.seed_url.to_string(),
            config_hash: session.fingerprint(),
        })?;

        if self.frontier.try_admit(session.seed_url.clone(), None) == AdmitOutcome::BudgetExhausted
        {
            info!("Request budget is 0, nothing to crawl");
        }

        let time_limit_hit = Arc::new(AtomicBool::new(false));
        let cap_task = session.max_duration.map(|cap| {
            let frontier = Arc::clone(&self.frontier);
            let time_limit_hit = Arc::clone(&time_limit_hit);
            tokio::spawn(async move {
                tokio::time::sleep(cap).await;
                warn!("Time limit of {:?} reached, stopping crawl", cap);
                time_limit_hit.store(true, Ordering::SeqCst);
                frontier.stop();
            })
        });

        let ctx = Arc::new(LaneContext {
            session_name: session.name.clone(),
            request_timeout: session.request_timeout,
            scope: session.scope(),
            frontier: Arc::clone(&self.frontier),
            renderer: Arc::clone(&self.renderer),
            dataset: Arc::clone(&self.dataset),
            completed: AtomicUsize::new(0),
            started: Instant::now(),
        });

        let mut lanes = JoinSet::new();
        for lane in 0..session.concurrency {
            lanes.spawn(run_lane(Arc::clone(&ctx), lane));
        }
        let mut failed_lanes = 0;
        while let Some(joined) = lanes.join_next().await {
            if let Err(e) = joined {
                error!("Crawl lane terminated abnormally: {}", e);
                failed_lanes += 1;
            }
        }

        if let Some(task) = cap_task {
            task.abort();
        }
        self.renderer.shutdown().await;

        let stop_reason = if self.interrupted.load(Ordering::SeqCst) {
            StopReason::Interrupted
        } else if time_limit_hit.load(Ordering::SeqCst) {
            StopReason::TimeLimit
        } else {
            StopReason::Drained
        };
        let status = match stop_reason {
            _ if failed_lanes > 0 => SessionStatus::Failed,
            StopReason::Interrupted => SessionStatus::Interrupted,
            _ => SessionStatus::Completed,
        };
        self.dataset.finish_session(&session.name, status)?;

        let snapshot = self.frontier.snapshot();
        let report = CrawlReport {
            session: session.name.clone(),
            seed_url: session.seed_url.to_string(),
            admitted: snapshot.admitted,
            succeeded: snapshot.succeeded,
            skipped: snapshot.skipped,
            unprocessed: snapshot.pending,
            deferred: self
                .frontier
                .deferred()
                .into_iter()
                .map(String::from)
                .collect(),
            records: self.dataset.count(&session.name)?,
            failed_lanes,
            elapsed: ctx.started.elapsed(),
            stop_reason,
        };

        info!(
            "Crawl finished: {} succeeded, {} skipped, {} deferred in {:?}",
            report.succeeded,
            report.skipped,
            report.deferred.len(),
            report.elapsed
        );
        Ok(report)
    }
}

/// A request taken from the frontier and not yet marked done
///
/// Dropped without `finish` (the lane panicked or was cancelled), it marks the
/// request skipped so lanes waiting in `take_next` are released.
struct InFlight<'a> {
    frontier: &'a Frontier,
    request: Option<CrawlRequest>,
}

impl<'a> InFlight<'a> {
    fn new(frontier: &'a Frontier, request: CrawlRequest) -> Self {
        Self {
            frontier,
            request: Some(request),
        }
    }

    fn finish(mut self, outcome: &RequestOutcome) {
        if let Some(request) = self.request.take() {
            self.frontier.mark_done(request, outcome);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            error!("Lane stopped while processing {}", request.url);
            self.frontier.mark_done(
                request,
                &RequestOutcome::Skipped {
                    reason: "lane stopped before finishing".to_string(),
                },
            );
        }
    }
}

async fn run_lane(ctx: Arc<LaneContext>, lane: usize) {
    trace!("Lane {} started", lane);

    while let Some(request) = ctx.frontier.take_next().await {
        let mut in_flight = InFlight::new(&ctx.frontier, request);
        let Some(request) = in_flight.request.as_mut() else {
            continue;
        };
        debug!("Lane {} processing {}", lane, request.url);

        let outcome = ctx.process(request).await;
        if let RequestOutcome::Skipped { reason } = &outcome {
            warn!("Skipping {}: {}", request.url, reason);
        }
        in_flight.finish(&outcome);

        let done = ctx.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if done % PROGRESS_INTERVAL == 0 {
            let snapshot = ctx.frontier.snapshot();
            let rate = done as f64 / ctx.started.elapsed().as_secs_f64().max(f64::EPSILON);
            info!(
                "Progress: {} done ({} ok, {} skipped), {} pending, {}/{} admitted, {:.2}/s",
                done,
                snapshot.succeeded,
                snapshot.skipped,
                snapshot.pending,
                snapshot.admitted,
                ctx.frontier.max_requests(),
                rate
            );
        }
    }

    trace!("Lane {} finished", lane);
}

impl LaneContext {
    /// Render, extract, persist, then enqueue links; in that order
    async fn process(&self, request: &mut CrawlRequest) -> RequestOutcome {
        let document = match self.render_with_retry(request).await {
            Ok(document) => document,
            Err(e) => {
                return RequestOutcome::Skipped {
                    reason: format!("{} after {} attempt(s)", e, request.attempts),
                }
            }
        };

        let record = extract(&document);
        info!("Title of {} is '{}'", record.url, record.title);

        if let Err(e) = self.dataset.append(&self.session_name, &record) {
            error!("Failed to store record for {}: {}", request.url, e);
            return RequestOutcome::Skipped {
                reason: format!("storage failure: {}", e),
            };
        }

        self.enqueue_links(&record, &request.url);
        RequestOutcome::Succeeded
    }

    async fn render_with_retry(
        &self,
        request: &mut CrawlRequest,
    ) -> Result<RenderedDocument, RenderError> {
        loop {
            request.attempts += 1;

            let result = match tokio::time::timeout(
                self.request_timeout,
                self.renderer.render(&request.url, self.request_timeout),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(RenderError::Timeout(self.request_timeout)),
            };

            match result {
                Ok(document) => return Ok(document),
                Err(e) if e.is_retryable() && request.attempts < MAX_ATTEMPTS => {
                    debug!(
                        "Attempt {} for {} failed ({}), retrying",
                        request.attempts, request.url, e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn enqueue_links(&self, record: &PageRecord, parent: &Url) {
        let mut admitted = 0;

        for link in &record.links {
            let candidate = match Url::parse(&link.href) {
                Ok(url) => url,
                Err(_) => {
                    trace!("Ignoring unparsable link {:?}", link.href);
                    continue;
                }
            };

            if !self.scope.allows(&candidate) {
                trace!("Out of scope: {}", candidate);
                continue;
            }

            let normalized = match normalize_parsed(candidate) {
                Ok(url) => url,
                Err(e) => {
                    trace!("Ignoring link {}: {}", link.href, e);
                    continue;
                }
            };

            if self.frontier.try_admit(normalized, Some(parent)).admitted() {
                admitted += 1;
            }
        }

        debug!(
            "{}: {} links, {} newly admitted",
            parent,
            record.links.len(),
            admitted
        );
    }
}
