//! Error types for preprocessing and dataset assembly

use thiserror::Error;

/// Core dataset errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(#[from] ecgprep_formats::Error),

    #[error("Label error: {0}")]
    Label(#[from] ecgprep_filters::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index {index} out of range for dataset of {len} records")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
