//! Frontier and dedup store shared by every crawl lane
//!
//! This module handles:
//! - The FIFO queue of pending requests
//! - The set of every URL ever admitted (admission happens at most once per URL)
//! - The global request budget
//! - Parking idle lanes until work appears or the crawl drains

use crate::state::{RequestOutcome, RequestState};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::trace;
use url::Url;

/// A URL admitted to the crawl
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Normalized absolute URL; this is the request's identity
    pub url: Url,

    /// Page the link was found on, `None` for the seed
    pub discovered_from: Option<Url>,

    pub state: RequestState,

    /// Render attempts made so far
    pub attempts: u32,
}

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// New URL, queued as pending
    Admitted,
    /// Already admitted earlier in this crawl
    Duplicate,
    /// The request budget is spent
    BudgetExhausted,
}

impl AdmitOutcome {
    pub fn admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierSnapshot {
    pub admitted: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub deferred: usize,
}

impl FrontierSnapshot {
    /// Requests that reached a terminal state
    pub fn completed(&self) -> usize {
        self.succeeded + self.skipped
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
    deferred: Vec<Url>,
    deferred_seen: HashSet<String>,
    admitted: usize,
    in_flight: usize,
    succeeded: usize,
    skipped: usize,
    stopped: bool,
}

/// Frontier of pending work plus the dedup set
///
/// Every check-and-insert happens under one lock, so two lanes discovering
/// the same link at the same time admit it exactly once, and
/// `pending + in_flight + completed` never exceeds the budget.
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    max_requests: usize,
    changed: Notify,
}

impl Frontier {
    /// Creates an empty frontier that admits at most `max_requests` URLs
    pub fn new(max_requests: usize) -> Self {
        Self {
            inner: Mutex::new(FrontierInner::default()),
            max_requests,
            changed: Notify::new(),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers a normalized URL to the frontier
    ///
    /// Callers apply the scope filter first. A new URL refused because the
    /// budget is spent is remembered as deferred; it is never dispatched.
    pub fn try_admit(&self, url: Url, discovered_from: Option<&Url>) -> AdmitOutcome {
        let outcome = {
            let mut inner = self.lock();
            let key = url.as_str().to_string();

            if inner.seen.contains(&key) {
                AdmitOutcome::Duplicate
            } else if inner.admitted >= self.max_requests {
                if inner.deferred_seen.insert(key) {
                    inner.deferred.push(url.clone());
                }
                AdmitOutcome::BudgetExhausted
            } else {
                inner.seen.insert(key);
                inner.admitted += 1;
                inner.queue.push_back(CrawlRequest {
                    url: url.clone(),
                    discovered_from: discovered_from.cloned(),
                    state: RequestState::Pending,
                    attempts: 0,
                });
                AdmitOutcome::Admitted
            }
        };

        trace!("try_admit {} -> {:?}", url, outcome);
        if outcome.admitted() {
            self.changed.notify_waiters();
        }
        outcome
    }

    /// Takes the next pending request and marks it in flight
    ///
    /// Waits while the queue is empty but other requests are in flight,
    /// since those may still discover links. Returns `None` once the queue
    /// is empty with nothing in flight, or after `stop`.
    pub async fn take_next(&self) -> Option<CrawlRequest> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if inner.stopped {
                    return None;
                }
                if let Some(mut request) = inner.queue.pop_front() {
                    request.state = RequestState::InFlight;
                    inner.in_flight += 1;
                    return Some(request);
                }
                if inner.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Moves an in-flight request to its terminal state and wakes idle lanes
    pub fn mark_done(&self, mut request: CrawlRequest, outcome: &RequestOutcome) -> RequestState {
        let next = outcome.state();
        debug_assert!(
            request.state.can_transition_to(next),
            "illegal transition {} -> {}",
            request.state,
            next
        );
        request.state = next;

        {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            match next {
                RequestState::Succeeded => inner.succeeded += 1,
                _ => inner.skipped += 1,
            }
        }

        self.changed.notify_waiters();
        request.state
    }

    /// Stops handing out work; requests already in flight still finish
    pub fn stop(&self) {
        self.lock().stopped = true;
        self.changed.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// URLs refused because the budget was spent, in discovery order
    pub fn deferred(&self) -> Vec<Url> {
        self.lock().deferred.clone()
    }

    pub fn snapshot(&self) -> FrontierSnapshot {
        let inner = self.lock();
        FrontierSnapshot {
            admitted: inner.admitted,
            pending: inner.queue.len(),
            in_flight: inner.in_flight,
            succeeded: inner.succeeded,
            skipped: inner.skipped,
            deferred: inner.deferred.len(),
        }
    }
}
