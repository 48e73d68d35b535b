//! Common error types for the map services

use thiserror::Error;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Unreadable, malformed or out-of-range settings
    #[error("Configuration error: {0}")]
    Config(String),
}
