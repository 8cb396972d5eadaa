use crate::config::error::{ConfigError, ConfigResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::time::Duration;

/// API version sent in `x-ms-version` and folded into every signature.
pub const API_VERSION: &str = "2021-06-08";

pub const DEFAULT_ENDPOINT_SUFFIX: &str = "file.core.windows.net";
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Which side of the comparison a set of credentials belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Source,
    Destination,
}

impl Target {
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Target::Source => "src_",
            Target::Destination => "dest_",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Source => write!(f, "source"),
            Target::Destination => write!(f, "destination"),
        }
    }
}

/// Credentials for one share. Immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub account_name: String,
    /// Base64-encoded shared key
    pub access_key: String,
    pub share_name: String,
}

impl AccountCredentials {
    pub fn new(
        account_name: impl Into<String>,
        access_key: impl Into<String>,
        share_name: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            access_key: access_key.into(),
            share_name: share_name.into(),
        }
    }

    /// Read `<prefix>account_name`, `<prefix>access_key` and `<prefix>fileshare`
    /// from the process environment.
    pub fn from_env(target: Target) -> ConfigResult<Self> {
        Self::from_lookup(target, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(target: Target, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = target.env_prefix();
        let required = |suffix: &str| -> ConfigResult<String> {
            let name = format!("{}{}", prefix, suffix);
            match lookup(&name) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => Err(ConfigError::MissingVariable(name)),
            }
        };

        let credentials = Self {
            account_name: required("account_name")?,
            access_key: required("access_key")?,
            share_name: required("fileshare")?,
        };
        credentials.decoded_key()?;

        Ok(credentials)
    }

    /// Decode the shared key. Malformed key material is a configuration error.
    pub fn decoded_key(&self) -> ConfigResult<Vec<u8>> {
        STANDARD
            .decode(self.access_key.as_bytes())
            .map_err(|e| ConfigError::InvalidKey {
                account: self.account_name.clone(),
                reason: e.to_string(),
            })
    }

    /// `https://<account>.<suffix>`
    pub fn service_url(&self, endpoint_suffix: &str) -> String {
        format!("https://{}.{}", self.account_name, endpoint_suffix)
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("account_name", &self.account_name)
            .field("access_key", &"<redacted>")
            .field("share_name", &self.share_name)
            .finish()
    }
}

/// Crawl tuning shared read-only by every worker
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Top-level directories per chunk, and the number of chunks in flight
    pub workers: usize,
    pub max_depth: usize,
    /// Extra attempts per page on transient failures. 0 disables retry.
    pub max_retries: u32,
    pub endpoint_suffix: String,
    pub request_timeout: Option<Duration>,
    pub api_version: String,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            max_depth: DEFAULT_MAX_DEPTH,
            max_retries: 0,
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            request_timeout: None,
            api_version: API_VERSION.to_string(),
            user_agent: format!("fileshare-diff/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workers) = parse_var::<usize, _>(&lookup, "FILESHARE_DIFF_WORKERS")? {
            config.workers = workers.max(1);
        }
        if let Some(depth) = parse_var::<usize, _>(&lookup, "FILESHARE_DIFF_MAX_DEPTH")? {
            config.max_depth = depth;
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, "FILESHARE_DIFF_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "FILESHARE_DIFF_TIMEOUT_SECS")? {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(suffix) = lookup("FILESHARE_DIFF_ENDPOINT_SUFFIX") {
            if !suffix.trim().is_empty() {
                config.endpoint_suffix = suffix.trim().to_string();
            }
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
    }
}
