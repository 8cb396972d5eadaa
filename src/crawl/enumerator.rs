use crate::config::CrawlConfig;
use crate::crawl::error::{CrawlError, Result};
use crate::crawl::types::{CrawlResult, PathSet};
use crate::crawl::walker::TreeWalker;
use crate::listing::SessionFactory;
use crate::metrics::CrawlTimer;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Outcome of one worker: its paths, or the top-level directory it failed on
type WorkerOutput = std::result::Result<PathSet, (String, CrawlError)>;

/// Crawls a whole share: one root listing, then the top-level directories
/// split into chunks walked in parallel, each chunk on its own session.
pub struct TreeEnumerator<F: SessionFactory> {
    factory: Arc<F>,
    config: CrawlConfig,
}

impl<F: SessionFactory> TreeEnumerator<F> {
    pub fn new(factory: F, config: CrawlConfig) -> Self {
        Self {
            factory: Arc::new(factory),
            config,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub async fn enumerate(&self) -> Result<CrawlResult> {
        let (account, share) = self.factory.describe();
        let timer = CrawlTimer::start(account.clone());
        tracing::info!(
            account = %account,
            share = %share,
            workers = self.config.workers,
            "Starting share crawl"
        );

        match self.enumerate_paths().await {
            Ok(paths) => {
                let elapsed = timer.complete(paths.len());
                tracing::info!(
                    account = %account,
                    share = %share,
                    paths = paths.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Share crawl complete"
                );
                Ok(CrawlResult {
                    account,
                    share,
                    paths,
                    elapsed,
                })
            }
            Err(e) => {
                timer.fail();
                tracing::warn!(account = %account, share = %share, "Share crawl failed: {}", e);
                Err(e)
            }
        }
    }

    async fn enumerate_paths(&self) -> Result<PathSet> {
        let root = {
            let session = self.factory.open_session().map_err(CrawlError::Session)?;
            TreeWalker::new(&session, self.config.max_depth)
                .list_root()
                .await?
        };
        tracing::debug!(
            directories = root.directories.len(),
            files = root.files.len(),
            "Listed share root"
        );

        let chunks = partition(&root.directories, self.config.workers);
        let chunk_results = self.run_chunks(chunks).await?;

        // Union is order independent, so completion order does not matter
        let paths = chunk_results
            .into_iter()
            .fold(root.into_paths(), |mut acc, chunk| {
                acc.extend(chunk);
                acc
            });

        Ok(paths)
    }

    /// Run every chunk with at most `workers` in flight. The first failure
    /// aborts the rest and fails the whole enumeration.
    async fn run_chunks(&self, chunks: Vec<Vec<String>>) -> Result<Vec<PathSet>> {
        let limit = self.config.workers.max(1);
        let mut pending = chunks.into_iter();
        let mut running: JoinSet<WorkerOutput> = JoinSet::new();
        let mut results = Vec::new();

        loop {
            while running.len() < limit {
                let Some(chunk) = pending.next() else { break };
                let factory = Arc::clone(&self.factory);
                let max_depth = self.config.max_depth;
                running.spawn(walk_chunk(factory, max_depth, chunk));
            }

            match running.join_next().await {
                None => break,
                Some(Ok(Ok(paths))) => results.push(paths),
                Some(Ok(Err((directory, source)))) => {
                    running.abort_all();
                    tracing::warn!("Worker for {} failed, abandoning crawl: {}", directory, source);
                    return Err(CrawlError::PartialEnumeration {
                        directory,
                        source: Box::new(source),
                    });
                }
                Some(Err(join_err)) => {
                    running.abort_all();
                    return Err(CrawlError::WorkerPanicked(join_err.to_string()));
                }
            }
        }

        Ok(results)
    }
}

/// One worker: own session, top-level directories walked in order
async fn walk_chunk<F: SessionFactory>(
    factory: Arc<F>,
    max_depth: usize,
    chunk: Vec<String>,
) -> WorkerOutput {
    let first = chunk
        .first()
        .map(|name| format!("/{}", name))
        .unwrap_or_default();
    let session = factory
        .open_session()
        .map_err(|e| (first, CrawlError::Session(e)))?;
    let walker = TreeWalker::new(&session, max_depth);

    let mut paths = PathSet::new();
    for name in chunk {
        let directory = format!("/{}", name);
        match walker.walk(&directory).await {
            Ok(found) => paths.extend(found),
            Err(e) => return Err((directory, e)),
        }
    }

    Ok(paths)
}

/// Contiguous chunks of `chunk_size` items, order preserved, last one
/// possibly shorter. A zero size is treated as one.
pub fn partition<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
