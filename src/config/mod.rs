pub mod error;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    AccountCredentials, CrawlConfig, Target, API_VERSION, DEFAULT_ENDPOINT_SUFFIX,
    DEFAULT_MAX_DEPTH,
};
