//! Common error types for Melody

use thiserror::Error;

/// Common result type for Melody operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the Melody crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
