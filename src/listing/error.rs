use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Authentication rejected (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed listing response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid access key: {0}")]
    InvalidKey(String),
}

impl ListingError {
    /// Failures worth another attempt when retry is enabled.
    /// Auth and parse failures repeat identically, so they never qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            ListingError::Transport(_) => true,
            ListingError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ListingError {
    fn from(err: reqwest::Error) -> Self {
        ListingError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for ListingError {
    fn from(err: url::ParseError) -> Self {
        ListingError::InvalidUrl(err.to_string())
    }
}

impl From<quick_xml::Error> for ListingError {
    fn from(err: quick_xml::Error) -> Self {
        ListingError::Parse(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ListingError {
    fn from(err: crate::config::ConfigError) -> Self {
        ListingError::InvalidKey(err.to_string())
    }
}

pub type ListingResult<T> = Result<T, ListingError>;
