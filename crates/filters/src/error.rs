//! Error types for label derivation

use thiserror::Error;

/// Label errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for label operations
pub type Result<T> = std::result::Result<T, Error>;
