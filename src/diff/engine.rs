use crate::crawl::{CrawlResult, PathSet};
use crate::diff::types::DiffResult;

/// Set difference between a source and a destination tree
pub struct DiffEngine;

impl DiffEngine {
    pub fn diff(source: &CrawlResult, dest: &CrawlResult) -> DiffResult {
        Self::diff_paths(&source.paths, &dest.paths)
    }

    /// `to_add = source - dest`, `to_remove = dest - source`
    pub fn diff_paths(source: &PathSet, dest: &PathSet) -> DiffResult {
        DiffResult {
            to_add: source.difference(dest).cloned().collect(),
            to_remove: dest.difference(source).cloned().collect(),
        }
    }
}
