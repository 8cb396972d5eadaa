//! Share enumeration: recursive directory walks fanned out over workers.

pub mod enumerator;
pub mod error;
pub mod types;
pub mod walker;


pub use enumerator::{partition, TreeEnumerator};
pub use error::{CrawlError, Result};
pub use types::{CrawlResult, PathSet, RootListing};
pub use walker::TreeWalker;
