//! Crawl report gathered by the coordinator
//!
//! This module provides the end-of-crawl counters and prints them in a
//! readable form.

use std::fmt;
use std::time::Duration;

/// Why the crawl loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Nothing left to process
    Drained,
    /// The wall-clock cap was reached
    TimeLimit,
    /// Stopped from outside (Ctrl-C)
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drained => f.write_str("frontier exhausted"),
            Self::TimeLimit => f.write_str("time limit reached"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Counters for one finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Dataset session name
    pub session: String,

    pub seed_url: String,

    /// URLs admitted to the frontier (never more than the budget)
    pub admitted: usize,

    /// Pages recorded in the dataset
    pub succeeded: usize,

    /// Pages given up on after rendering or storage failures
    pub skipped: usize,

    /// Admitted URLs still pending when the crawl stopped
    pub unprocessed: usize,

    /// In-scope URLs refused because the budget was spent
    pub deferred: Vec<String>,

    /// Records in the dataset at the end of the crawl
    pub records: u64,

    /// Lanes that ended abnormally (a panic inside rendering or extraction)
    pub failed_lanes: usize,

    pub elapsed: Duration,

    pub stop_reason: StopReason,
}

impl CrawlReport {
    /// Share of finished requests that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        let finished = self.succeeded + self.skipped;
        if finished == 0 {
            0.0
        } else {
            self.succeeded as f64 / finished as f64 * 100.0
        }
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Seed URL: {}", report.seed_url);
    println!("  Dataset: {}", report.session);
    println!("  Stopped: {}", report.stop_reason);
    println!("  Duration: {:.1}s", report.elapsed.as_secs_f64());
    println!();

    println!("Requests:");
    println!("  Admitted: {}", report.admitted);
    println!("  Succeeded: {}", report.succeeded);
    println!("  Skipped: {}", report.skipped);
    if report.unprocessed > 0 {
        println!("  Not processed: {}", report.unprocessed);
    }
    println!("  Records stored: {}", report.records);
    if report.failed_lanes > 0 {
        println!("  Failed lanes: {}", report.failed_lanes);
    }
    println!();

    if !report.deferred.is_empty() {
        println!(
            "Deferred (request limit reached) ({}):",
            report.deferred.len()
        );
        for url in report.deferred.iter().take(20) {
            println!("  - {}", url);
        }
        if report.deferred.len() > 20 {
            println!("  ... and {} more", report.deferred.len() - 20);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        report.success_rate(),
        report.succeeded,
        report.succeeded + report.skipped
    );
}
