//! Configuration file support for dataset preparation

use anyhow::{Context, Result};
use clap::Args;
use ecgprep_core::DatasetConfig;
use std::path::{Path, PathBuf};

/// Load a dataset configuration from a file (YAML or TOML)
pub fn load(path: &Path) -> Result<DatasetConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    match extension {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
        "toml" => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
        _ => Err(anyhow::anyhow!(
            "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
            extension
        )),
    }
}

/// Save a dataset configuration to a file
pub fn save(config: &DatasetConfig, path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    let content = match extension {
        "yaml" | "yml" => serde_yaml::to_string(config)?,
        "toml" => toml::to_string_pretty(config)?,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
                extension
            ))
        }
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Command-line overrides applied on top of the config file
#[derive(Args, Debug, Default, Clone)]
pub struct DatasetArgs {
    /// Dataset config file (YAML or TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Record catalog CSV
    #[arg(long, global = true)]
    pub record_list: Option<PathBuf>,

    /// Machine measurement CSV
    #[arg(long, global = true)]
    pub measurements: Option<PathBuf>,

    /// Local database root that record paths are relative to
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Samples per channel after truncation or padding
    #[arg(long, global = true)]
    pub target_length: Option<usize>,

    /// Fraction of records used for training (0.0-1.0)
    #[arg(long, global = true)]
    pub train_ratio: Option<f64>,

    /// Shuffle seed
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Keep catalog order instead of shuffling before the split
    #[arg(long, global = true)]
    pub no_shuffle: bool,

    /// Keep only the first N subjects of the catalog
    #[arg(long, global = true)]
    pub max_subjects: Option<usize>,

    /// Keep at most N records per subject
    #[arg(long, global = true)]
    pub max_records_per_subject: Option<usize>,
}

impl DatasetArgs {
    /// Resolve the effective configuration: file (or defaults) plus overrides
    pub fn resolve(&self) -> Result<DatasetConfig> {
        let mut config = match &self.config {
            Some(path) => load(path)?,
            None => DatasetConfig::default(),
        };

        if let Some(path) = &self.record_list {
            config.record_list = path.clone();
        }
        if let Some(path) = &self.measurements {
            config.measurements = path.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(n) = self.target_length {
            config.target_length = n;
        }
        if let Some(ratio) = self.train_ratio {
            config.train_ratio = ratio;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.no_shuffle {
            config.shuffle = false;
        }
        if self.max_subjects.is_some() {
            config.max_subjects = self.max_subjects;
        }
        if self.max_records_per_subject.is_some() {
            config.max_records_per_subject = self.max_records_per_subject;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_and_load_yaml() {
        let config = DatasetConfig {
            data_dir: Some(PathBuf::from("/data/mimic-iv-ecg")),
            max_subjects: Some(100),
            max_records_per_subject: Some(10),
            ..Default::default()
        };

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("yaml");

        save(&config, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(config, loaded);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_and_load_toml() {
        let config = DatasetConfig::default();

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("toml");

        save(&config, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(config, loaded);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("yml");
        std::fs::write(&path, "target_length: 2500\nlabels:\n  keywords: [afib]\n").unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.target_length, 2500);
        assert_eq!(loaded.train_ratio, 0.8);
        assert_eq!(loaded.labels.keywords, vec!["afib"]);
        assert_eq!(loaded.labels.column_prefix, "report_");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unsupported_format() {
        let config = DatasetConfig::default();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("json");

        assert!(save(&config, &path).is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let args = DatasetArgs {
            data_dir: Some(PathBuf::from("/tmp/ecg")),
            target_length: Some(1000),
            no_shuffle: true,
            max_subjects: Some(5),
            ..Default::default()
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/ecg")));
        assert_eq!(config.target_length, 1000);
        assert!(!config.shuffle);
        assert_eq!(config.max_subjects, Some(5));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = DatasetArgs {
            train_ratio: Some(2.0),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
