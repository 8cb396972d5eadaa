//! Enumerate every path of two remote file shares and report the paths the
//! destination needs added or removed to match the source.

pub mod config;
pub mod crawl;
pub mod diff;
pub mod listing;
pub mod metrics;

pub use config::{AccountCredentials, CrawlConfig, Target};
pub use crawl::{CrawlError, CrawlResult, PathSet, TreeEnumerator, TreeWalker};
pub use diff::{DiffEngine, DiffResult};
pub use listing::{PageFetcher, RequestSigner, ShareClient};
