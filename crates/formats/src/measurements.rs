//! Machine measurement table loading
//!
//! Each row carries the free-text diagnostic statements produced by the ECG
//! cart in columns named `report_0`, `report_1`, ... Only those report
//! columns and the optional `study_id` are kept.

use crate::table::Table;
use crate::Result;
use std::path::Path;
use tracing::{info, warn};

/// Default prefix of the free-text report columns
pub const DEFAULT_REPORT_PREFIX: &str = "report_";

/// Report fields of one measurement row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRow {
    pub study_id: Option<String>,
    /// Report cells in column order; missing cells are empty strings
    pub reports: Vec<String>,
}

/// Measurement table restricted to its report columns
#[derive(Debug, Clone)]
pub struct Measurements {
    /// Names of the detected report columns, in file order
    pub report_columns: Vec<String>,
    pub rows: Vec<MeasurementRow>,
}

impl Measurements {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rows carry a study id usable for joining with the catalog
    pub fn has_study_ids(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.study_id.is_some())
    }
}

/// Load the measurement table, keeping the columns whose header starts with `prefix`
pub fn load_measurements<P: AsRef<Path>>(path: P, prefix: &str) -> Result<Measurements> {
    let path = path.as_ref();
    info!("Loading measurements: {:?}", path);

    let table = Table::load(path)?;
    Ok(measurements_from_table(&table, prefix))
}

/// Extract report columns from an already loaded table
pub fn measurements_from_table(table: &Table, prefix: &str) -> Measurements {
    let report_idx = table.columns_with_prefix(prefix);
    let report_columns: Vec<String> = report_idx
        .iter()
        .map(|&i| table.headers[i].clone())
        .collect();

    if report_columns.is_empty() {
        warn!("No report columns with prefix {:?} found", prefix);
    } else {
        info!("Report columns: {:?}", report_columns);
    }

    let study_col = table.column_index("study_id");

    let rows = table
        .rows
        .iter()
        .map(|row| MeasurementRow {
            study_id: study_col
                .and_then(|c| row.get(c))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            reports: report_idx
                .iter()
                .map(|&i| row.get(i).unwrap_or("").to_string())
                .collect(),
        })
        .collect();

    Measurements {
        report_columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_measurements() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "subject_id,study_id,report_0,report_1,rr_interval").unwrap();
        writeln!(temp_file, "1,100,Sinus rhythm,Normal ECG,800").unwrap();
        writeln!(temp_file, "1,101,Sinus tachycardia,,600").unwrap();
        temp_file.flush().unwrap();

        let m = load_measurements(temp_file.path(), DEFAULT_REPORT_PREFIX).unwrap();
        assert_eq!(m.report_columns, vec!["report_0", "report_1"]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.rows[0].reports, vec!["Sinus rhythm", "Normal ECG"]);
        assert_eq!(m.rows[1].reports, vec!["Sinus tachycardia", ""]);
        assert_eq!(m.rows[1].study_id.as_deref(), Some("101"));
        assert!(m.has_study_ids());
    }

    #[test]
    fn test_measurements_without_study_id() {
        let data = "report_0\nAbnormal ECG\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let table = Table::from_reader(&mut reader).unwrap();

        let m = measurements_from_table(&table, DEFAULT_REPORT_PREFIX);
        assert_eq!(m.len(), 1);
        assert!(!m.has_study_ids());
    }

    #[test]
    fn test_custom_prefix() {
        let data = "stmt_a,report_0\nx,y\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let table = Table::from_reader(&mut reader).unwrap();

        let m = measurements_from_table(&table, "stmt_");
        assert_eq!(m.report_columns, vec!["stmt_a"]);
        assert_eq!(m.rows[0].reports, vec!["x"]);
    }
}
