use std::collections::HashSet;
use std::time::Duration;

/// Root-relative paths. Top-level directories are `/name`, files are the
/// full path under their parent.
pub type PathSet = HashSet<String>;

/// Every path of one share at one point in time
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub account: String,
    pub share: String,
    pub paths: PathSet,
    /// Wall-clock time of the crawl, for reporting only
    pub elapsed: Duration,
}

impl CrawlResult {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Result of the root listing, split the way the enumerator uses it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootListing {
    /// Top-level directory names in listing order, without the leading `/`
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl RootListing {
    /// Root entries as paths: directories as `/name`, files bare
    pub fn into_paths(self) -> PathSet {
        self.directories
            .into_iter()
            .map(|name| format!("/{}", name))
            .chain(self.files)
            .collect()
    }
}
