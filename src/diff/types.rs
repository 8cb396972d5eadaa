use crate::crawl::PathSet;

/// Paths to add to and remove from the destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// In the source, missing from the destination
    pub to_add: PathSet,
    /// In the destination, gone from the source
    pub to_remove: PathSet,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn sorted_additions(&self) -> Vec<&str> {
        sorted(&self.to_add)
    }

    pub fn sorted_removals(&self) -> Vec<&str> {
        sorted(&self.to_remove)
    }
}

fn sorted(paths: &PathSet) -> Vec<&str> {
    let mut out: Vec<&str> = paths.iter().map(String::as_str).collect();
    out.sort_unstable();
    out
}
