//! Dataset configuration

use crate::{Error, Result};
use ecgprep_filters::LabelConfig;
use ecgprep_formats::DEFAULT_REMOTE_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Samples per channel handed to the model (10 s at 500 Hz)
pub const DEFAULT_TARGET_LENGTH: usize = 5000;
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;
pub const DEFAULT_SEED: u64 = 42;

/// Everything needed to assemble a train or validation split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Record catalog CSV (`path`, optional `subject_id`/`study_id`)
    #[serde(default = "default_record_list")]
    pub record_list: PathBuf,
    /// Machine measurement CSV carrying the report columns
    #[serde(default = "default_measurements")]
    pub measurements: PathBuf,
    /// Local database root that catalog paths are relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Remote database root, used only to name record headers
    #[serde(default = "default_remote_prefix")]
    pub remote_prefix: String,
    #[serde(default = "default_target_length")]
    pub target_length: usize,
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// Shuffle seed; train and validation splits must share it
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_subjects: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records_per_subject: Option<usize>,
    #[serde(default)]
    pub labels: LabelConfig,
}

fn default_record_list() -> PathBuf {
    PathBuf::from("data/record_list.csv")
}

fn default_measurements() -> PathBuf {
    PathBuf::from("data/machine_measurements.csv")
}

fn default_remote_prefix() -> String {
    DEFAULT_REMOTE_PREFIX.to_string()
}

fn default_target_length() -> usize {
    DEFAULT_TARGET_LENGTH
}

fn default_train_ratio() -> f64 {
    DEFAULT_TRAIN_RATIO
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            record_list: default_record_list(),
            measurements: default_measurements(),
            data_dir: None,
            remote_prefix: default_remote_prefix(),
            target_length: DEFAULT_TARGET_LENGTH,
            train_ratio: DEFAULT_TRAIN_RATIO,
            shuffle: true,
            seed: DEFAULT_SEED,
            max_subjects: None,
            max_records_per_subject: None,
            labels: LabelConfig::default(),
        }
    }
}

impl DatasetConfig {
    /// Check numeric settings before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.target_length == 0 {
            return Err(Error::InvalidConfig(
                "target_length must be greater than 0".to_string(),
            ));
        }
        crate::split::check_ratio(self.train_ratio)?;
        if self.max_subjects == Some(0) || self.max_records_per_subject == Some(0) {
            return Err(Error::InvalidConfig(
                "subject limits must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
