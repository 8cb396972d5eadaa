//! Metrics recorder for share crawls
//!
//! Records listing traffic and crawl outcomes through the `metrics` facade.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!(
        "fileshare_pages_fetched_total",
        "Total number of listing pages fetched"
    );
    describe_counter!(
        "fileshare_entries_listed_total",
        "Total number of directory and file entries returned by listings"
    );
    describe_counter!(
        "fileshare_fetch_failures_total",
        "Total number of listing requests that failed for good"
    );
    describe_counter!(
        "fileshare_fetch_retries_total",
        "Total number of listing requests retried after a transient failure"
    );
    describe_counter!(
        "fileshare_crawls_failed_total",
        "Total number of share crawls that failed"
    );
    describe_histogram!(
        "fileshare_crawl_duration_seconds",
        "Wall-clock duration of a full share crawl"
    );
    describe_histogram!(
        "fileshare_crawl_paths",
        "Number of paths enumerated by a full share crawl"
    );
}

// ============== Listing ==============

/// Record one successfully parsed page
pub fn record_page_fetched(entries: usize) {
    counter!("fileshare_pages_fetched_total").increment(1);
    counter!("fileshare_entries_listed_total").increment(entries as u64);
}

pub fn record_fetch_retry() {
    counter!("fileshare_fetch_retries_total").increment(1);
}

pub fn record_fetch_failure() {
    counter!("fileshare_fetch_failures_total").increment(1);
}

// ============== Crawls ==============

pub fn record_crawl_complete(account: &str, duration: Duration, paths: usize) {
    histogram!("fileshare_crawl_duration_seconds", "account" => account.to_string())
        .record(duration.as_secs_f64());
    histogram!("fileshare_crawl_paths", "account" => account.to_string()).record(paths as f64);
}

pub fn record_crawl_failed(account: &str) {
    counter!("fileshare_crawls_failed_total", "account" => account.to_string()).increment(1);
}

/// Times one crawl and records the outcome
pub struct CrawlTimer {
    account: String,
    start_time: Instant,
}

impl CrawlTimer {
    pub fn start(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Record success and hand back the elapsed time
    pub fn complete(self, paths: usize) -> Duration {
        let duration = self.start_time.elapsed();
        record_crawl_complete(&self.account, duration, paths);
        duration
    }

    pub fn fail(self) {
        record_crawl_failed(&self.account);
    }
}
