//! Signed, paginated directory listing against the file service REST API.

pub mod error;
pub mod fetcher;
pub mod parser;
pub mod signer;
pub mod types;

pub use error::{ListingError, ListingResult};
pub use fetcher::{PageFetcher, ShareClient};
pub use parser::parse_listing;
pub use signer::{format_http_date, RequestSigner, SignedHeaders};
pub use types::{ListingPage, ListingRequest, PageSource, SessionFactory};
