//! Record catalog loading
//!
//! The catalog is a CSV listing one ECG record per row. The `path` column
//! holds the record base path relative to the database root (no extension);
//! `subject_id` and `study_id` are picked up when present.

use crate::table::Table;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default remote prefix of the MIMIC-IV-ECG database on PhysioNet
pub const DEFAULT_REMOTE_PREFIX: &str = "https://physionet.org/files/mimic-iv-ecg/1.0/";

/// One row of the record catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Record base path relative to the database root
    pub path: String,
    pub subject_id: Option<String>,
    pub study_id: Option<String>,
    /// Zero-based row in the catalog file
    pub row: usize,
}

impl CatalogEntry {
    /// Name of the record header under a remote database prefix
    pub fn remote_header_url(&self, prefix: &str) -> String {
        format!("{}{}.hea", prefix, self.path)
    }

    /// Local record base path (without extension) under `data_dir`
    pub fn local_record(&self, data_dir: Option<&Path>) -> PathBuf {
        match data_dir {
            Some(dir) => dir.join(&self.path),
            None => PathBuf::from(&self.path),
        }
    }
}

/// Load the record catalog from a CSV (or `.csv.gz`) file
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogEntry>> {
    let path = path.as_ref();
    info!("Loading record catalog: {:?}", path);

    let table = Table::load(path)?;
    let entries = catalog_from_table(&table)?;

    info!("Catalog lists {} records", entries.len());
    Ok(entries)
}

/// Build catalog entries from an already loaded table
pub fn catalog_from_table(table: &Table) -> Result<Vec<CatalogEntry>> {
    let path_col = table.require_column("path")?;
    let subject_col = table.column_index("subject_id");
    let study_col = table.column_index("study_id");

    let optional = |row: &csv::StringRecord, col: Option<usize>| {
        col.and_then(|c| row.get(c))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut entries = Vec::with_capacity(table.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let record_path = row.get(path_col).map(str::trim).unwrap_or("");
        if record_path.is_empty() {
            warn!("Skipping catalog row {}: empty path", row_idx);
            continue;
        }

        entries.push(CatalogEntry {
            path: record_path.to_string(),
            subject_id: optional(row, subject_col),
            study_id: optional(row, study_col),
            row: row_idx,
        });
    }

    Ok(entries)
}

/// Restrict a catalog to its first `max_subjects` subjects and at most
/// `max_records_per_subject` records per subject, preserving catalog order.
///
/// Entries without a subject id count as a subject of their own.
pub fn limit_subjects(
    entries: Vec<CatalogEntry>,
    max_subjects: Option<usize>,
    max_records_per_subject: Option<usize>,
) -> Vec<CatalogEntry> {
    if max_subjects.is_none() && max_records_per_subject.is_none() {
        return entries;
    }

    let before = entries.len();
    let mut per_subject: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::new();

    for entry in entries {
        let key = entry
            .subject_id
            .clone()
            .unwrap_or_else(|| format!("row:{}", entry.row));

        let seen = per_subject.contains_key(&key);
        if !seen {
            if let Some(max) = max_subjects {
                if per_subject.len() >= max {
                    continue;
                }
            }
        }

        let count = per_subject.entry(key).or_insert(0);
        if let Some(max) = max_records_per_subject {
            if *count >= max {
                continue;
            }
        }
        *count += 1;
        kept.push(entry);
    }

    info!(
        "Subject limits kept {} of {} records ({} subjects)",
        kept.len(),
        before,
        per_subject.len()
    );
    kept
}
