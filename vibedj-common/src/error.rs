//! Common error types for Vibe DJ

use thiserror::Error;

/// Common result type for Vibe DJ operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Vibe DJ crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
