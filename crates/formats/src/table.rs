//! CSV table loading
//!
//! Catalog and measurement files are plain CSV, or gzip-compressed CSV as
//! distributed by PhysioNet. Both are opened through [`open_table`].

use crate::{Error, Result};
use csv::StringRecord;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Buffer size used when reading table files
const BUFFER_SIZE: usize = 64 * 1024;

/// Open a CSV file, auto-detecting gzip compression from the extension
pub fn open_table<P: AsRef<Path>>(path: P) -> Result<csv::Reader<Box<dyn Read>>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let reader: Box<dyn Read> = match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => {
            debug!("Opening gzip-compressed CSV file: {:?}", path);
            Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file)))
        }
        _ => {
            debug!("Opening plain CSV file: {:?}", path);
            Box::new(BufReader::with_capacity(BUFFER_SIZE, file))
        }
    };

    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader))
}

/// An in-memory CSV table
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl Table {
    /// Read a whole table from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = open_table(path)?;
        Self::from_reader(&mut reader)
    }

    /// Read a whole table from an already opened CSV reader
    pub fn from_reader<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    /// Index of the named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the named column, or a `MissingColumn` error
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Indices of every column whose header starts with `prefix`, in file order
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with(prefix))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
