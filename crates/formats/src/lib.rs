//! File format readers for ECG datasets
//!
//! This crate reads the CSV record catalog and machine measurement tables
//! (plain or gzip-compressed) and WFDB records (`.hea` header plus signal
//! files) into in-memory arrays.

pub mod catalog;
pub mod error;
pub mod header;
pub mod measurements;
pub mod reader;
pub mod record;
pub mod signal;
pub mod table;

pub use catalog::{limit_subjects, load_catalog, CatalogEntry, DEFAULT_REMOTE_PREFIX};
pub use error::{Error, Result};
pub use header::Header;
pub use measurements::{load_measurements, MeasurementRow, Measurements, DEFAULT_REPORT_PREFIX};
pub use reader::{read_header, read_record};
pub use record::EcgRecord;
pub use signal::SampleFormat;
