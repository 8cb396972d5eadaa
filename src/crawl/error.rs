use crate::listing::ListingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Listing {directory:?} failed: {source}")]
    Listing {
        directory: String,
        #[source]
        source: ListingError,
    },

    #[error("Directory {directory} is nested deeper than the limit of {max_depth}")]
    DepthExceeded { directory: String, max_depth: usize },

    #[error("Enumeration incomplete: worker for {directory} failed: {source}")]
    PartialEnumeration {
        directory: String,
        #[source]
        source: Box<CrawlError>,
    },

    #[error("Could not open listing session: {0}")]
    Session(#[source] ListingError),

    #[error("Crawl worker panicked: {0}")]
    WorkerPanicked(String),
}

impl CrawlError {
    /// The listing failure at the bottom of this error, if any
    pub fn listing_error(&self) -> Option<&ListingError> {
        match self {
            CrawlError::Listing { source, .. } | CrawlError::Session(source) => Some(source),
            CrawlError::PartialEnumeration { source, .. } => source.listing_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
