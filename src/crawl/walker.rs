use crate::crawl::error::{CrawlError, Result};
use crate::crawl::types::{PathSet, RootListing};
use crate::listing::{ListingError, ListingPage, PageSource};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;

/// Recursively lists one directory subtree through a single [`PageSource`].
///
/// Pages are requested one at a time; the walker owns its accumulated
/// [`PathSet`] and needs no synchronization.
pub struct TreeWalker<'a, S: PageSource> {
    source: &'a S,
    max_depth: usize,
}

impl<'a, S: PageSource> TreeWalker<'a, S> {
    pub fn new(source: &'a S, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Enumerate `directory_path`.
    ///
    /// The root (empty path) is listed without descending: directories come
    /// back as `/name` and files as their bare name. Any other directory is
    /// walked fully and yields `<directory>/<file>` for every file below it.
    pub async fn walk(&self, directory_path: &str) -> Result<PathSet> {
        if directory_path.is_empty() {
            return Ok(self.list_root().await?.into_paths());
        }
        self.walk_subtree(directory_path.to_string(), 1).await
    }

    /// All root pages, directories and files kept in listing order
    pub async fn list_root(&self) -> Result<RootListing> {
        let mut listing = RootListing::default();
        let mut seen_dirs = HashSet::new();
        let mut seen_files = HashSet::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self.fetch("", marker.as_deref()).await?;

            for name in page.directories {
                if seen_dirs.insert(name.clone()) {
                    listing.directories.push(name);
                }
            }
            for name in page.files {
                if seen_files.insert(name.clone()) {
                    listing.files.push(name);
                }
            }

            marker = continuation("", marker.as_deref(), page.next_marker)?;
            if marker.is_none() {
                break;
            }
        }

        Ok(listing)
    }

    fn walk_subtree(&self, directory: String, depth: usize) -> BoxFuture<'_, Result<PathSet>> {
        async move {
            if depth > self.max_depth {
                return Err(CrawlError::DepthExceeded {
                    directory,
                    max_depth: self.max_depth,
                });
            }

            let mut paths = PathSet::new();
            // Each subdirectory is descended once even if a later page repeats it
            let mut descended = HashSet::new();
            let mut marker: Option<String> = None;

            loop {
                let page = self.fetch(&directory, marker.as_deref()).await?;

                for file in &page.files {
                    paths.insert(format!("{}/{}", directory, file));
                }

                for name in page.directories {
                    if !descended.insert(name.clone()) {
                        continue;
                    }
                    let child = format!("{}/{}", directory, name);
                    paths.extend(self.walk_subtree(child, depth + 1).await?);
                }

                marker = continuation(&directory, marker.as_deref(), page.next_marker)?;
                if marker.is_none() {
                    break;
                }
            }

            tracing::trace!(directory = %directory, paths = paths.len(), "Walked directory");
            Ok(paths)
        }
        .boxed()
    }

    async fn fetch(&self, directory: &str, marker: Option<&str>) -> Result<ListingPage> {
        self.source
            .fetch_page(directory, marker)
            .await
            .map_err(|source| CrawlError::Listing {
                directory: directory.to_string(),
                source,
            })
    }
}

/// Marker for the next page. A provider answering with the marker it was
/// just given would page forever, so that is a malformed listing.
fn continuation(
    directory: &str,
    sent: Option<&str>,
    next: Option<String>,
) -> Result<Option<String>> {
    match (sent, next) {
        (Some(sent), Some(next)) if sent == next => Err(CrawlError::Listing {
            directory: directory.to_string(),
            source: ListingError::Parse(format!("continuation marker {:?} repeated", next)),
        }),
        (_, next) => Ok(next),
    }
}
