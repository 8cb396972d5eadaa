use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Access key for account {account} is not valid base64: {reason}")]
    InvalidKey { account: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
