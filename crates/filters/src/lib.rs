//! Label derivation for ECG diagnostic reports
//!
//! Turns the free-text statements of machine measurement tables into binary
//! abnormality labels.

pub mod error;
pub mod label;

pub use error::{Error, Result};
pub use label::{Label, LabelConfig, LabelDeriver, LabelStats, DEFAULT_KEYWORDS};
