//! Core preprocessing for ECG training data
//!
//! This crate turns raw ECG records into fixed-length, per-channel
//! standardized tensors, splits the labelled catalog into training and
//! validation sets, and serves samples to a training loop.

pub mod config;
pub mod dataset;
pub mod error;
pub mod preprocess;
pub mod split;

pub use config::DatasetConfig;
pub use dataset::{EcgDataset, Sample};
pub use error::{Error, Result};
pub use preprocess::preprocess_signal;
pub use split::Split;
