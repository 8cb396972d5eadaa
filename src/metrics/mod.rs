//! Metrics for share crawls
//!
//! Key metrics recorded:
//! - Listing pages fetched and entries returned
//! - Retries and permanent fetch failures
//! - Crawl duration and size per account
//!
//! No exporter is installed here; an embedding application that installs a
//! `metrics` recorder picks these up.

pub mod recorder;

pub use recorder::{
    init_metrics, record_crawl_complete, record_crawl_failed, record_fetch_failure,
    record_fetch_retry, record_page_fetched, CrawlTimer,
};
