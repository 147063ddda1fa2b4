//! Common error types for rankbot

use thiserror::Error;

/// Common result type for rankbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the rankbot crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tier file could not be parsed as TOML
    #[error("Tier file parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tier table violates its ordering or uniqueness rules
    #[error("Invalid tier table: {0}")]
    InvalidTierTable(String),
}
