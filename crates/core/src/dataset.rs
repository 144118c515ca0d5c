//! ECG dataset assembly
//!
//! Pairs catalog entries with labels derived from the measurement table,
//! selects the train or validation side, and reads plus preprocesses
//! records on demand.

use crate::config::DatasetConfig;
use crate::preprocess::{preprocess_signal, to_channel_major};
use crate::split::{select, Split};
use crate::{Error, Result};
use ecgprep_filters::{Label, LabelDeriver, LabelStats};
use ecgprep_formats::{limit_subjects, load_catalog, load_measurements, read_record};
use ecgprep_formats::{CatalogEntry, Measurements};
use ndarray::Array2;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One model input: a `(channel, time)` tensor and its label
#[derive(Debug, Clone)]
pub struct Sample {
    /// Catalog path of the record
    pub path: String,
    pub label: Label,
    pub signal: Array2<f32>,
}

/// Attach a label to every catalog entry
///
/// Entries are joined on `study_id` when both tables carry it for every row,
/// and by catalog row position otherwise. Entries without a label are dropped.
/// A study listed twice in the measurements keeps its first label.
pub fn pair_labels(
    entries: Vec<CatalogEntry>,
    measurements: &Measurements,
    labels: &[Label],
) -> Vec<(CatalogEntry, Label)> {
    let by_study = measurements.has_study_ids()
        && !entries.is_empty()
        && entries.iter().all(|e| e.study_id.is_some());

    let total = entries.len();
    let paired: Vec<(CatalogEntry, Label)> = if by_study {
        debug!("Joining catalog and measurements on study_id");
        let mut index: HashMap<&str, Label> = HashMap::with_capacity(measurements.rows.len());
        for (row, &label) in measurements.rows.iter().zip(labels) {
            let Some(id) = row.study_id.as_deref() else {
                continue;
            };
            if index.contains_key(id) {
                warn!("Duplicate measurements for study {}, keeping the first", id);
            } else {
                index.insert(id, label);
            }
        }

        entries
            .into_iter()
            .filter_map(|entry| {
                let label = entry.study_id.as_deref().and_then(|id| index.get(id).copied());
                match label {
                    Some(label) => Some((entry, label)),
                    None => {
                        warn!("No measurements for study {:?}", entry.study_id);
                        None
                    }
                }
            })
            .collect()
    } else {
        debug!("Pairing catalog and measurements by row position");
        entries
            .into_iter()
            .filter_map(|entry| match labels.get(entry.row) {
                Some(&label) => Some((entry, label)),
                None => {
                    warn!("No measurement row for catalog row {}", entry.row);
                    None
                }
            })
            .collect()
    };

    if paired.len() < total {
        warn!("{} of {} records have no label", total - paired.len(), total);
    }
    paired
}

/// One split of labelled ECG records
#[derive(Debug, Clone)]
pub struct EcgDataset {
    config: DatasetConfig,
    split: Split,
    entries: Vec<CatalogEntry>,
    labels: Vec<Label>,
}

impl EcgDataset {
    /// Load the catalog and measurements named in `config` and keep one split
    pub fn new(config: DatasetConfig, split: Split) -> Result<Self> {
        config.validate()?;

        let catalog = load_catalog(&config.record_list)?;
        let measurements = load_measurements(&config.measurements, &config.labels.column_prefix)?;
        Self::from_tables(config, split, catalog, &measurements)
    }

    /// Build a split from tables that are already in memory
    pub fn from_tables(
        config: DatasetConfig,
        split: Split,
        catalog: Vec<CatalogEntry>,
        measurements: &Measurements,
    ) -> Result<Self> {
        config.validate()?;

        let deriver = LabelDeriver::new(&config.labels)?;
        let rows: Vec<Vec<String>> = measurements.rows.iter().map(|r| r.reports.clone()).collect();
        let all_labels = deriver.label_all(&rows);

        let stats = LabelStats::from_labels(&all_labels);
        info!(
            "Derived {} labels ({} abnormal, {:.1}%)",
            stats.total,
            stats.abnormal,
            stats.abnormal_rate()
        );

        let catalog = limit_subjects(
            catalog,
            config.max_subjects,
            config.max_records_per_subject,
        );
        let pairs = pair_labels(catalog, measurements, &all_labels);

        let seed = config.shuffle.then_some(config.seed);
        let selected = select(pairs, config.train_ratio, split, seed)?;
        info!("Using {} {} records", selected.len(), split);

        let (entries, labels) = selected.into_iter().unzip();
        Ok(Self {
            config,
            split,
            entries,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Catalog entries of this split, in sample order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label_stats(&self) -> LabelStats {
        LabelStats::from_labels(&self.labels)
    }

    /// Remote header names of this split's records
    pub fn remote_header_urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.remote_header_url(&self.config.remote_prefix))
            .collect()
    }

    /// Read and preprocess the record at `index` of this split
    pub fn get(&self, index: usize) -> Result<Sample> {
        let entry = self.entries.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;

        let base = entry.local_record(self.config.data_dir.as_deref());
        let record = read_record(&base)?;
        let signal = preprocess_signal(record.signal.view(), self.config.target_length)?;

        Ok(Sample {
            path: entry.path.clone(),
            label: self.labels[index],
            signal: to_channel_major(signal),
        })
    }

    /// Samples in split order, read lazily
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
