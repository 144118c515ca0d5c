//! Abnormality labels from free-text diagnostic reports
//!
//! A record is labelled abnormal (1) when any of its report fields contains
//! one of a fixed set of keywords, compared case-insensitively as plain
//! substrings. Columns are scanned in order and the first match wins.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keywords that mark a report as abnormal
pub const DEFAULT_KEYWORDS: [&str; 5] = ["abnormal", "consider", "infarct", "ischemia", "mi"];

/// Label deriver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Prefix selecting the report columns of the measurement table
    #[serde(default = "default_column_prefix")]
    pub column_prefix: String,
    /// Keywords matched as case-insensitive substrings
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_column_prefix() -> String {
    "report_".to_string()
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            column_prefix: default_column_prefix(),
            keywords: default_keywords(),
        }
    }
}

/// Binary label: 0 = normal, 1 = abnormal
pub type Label = u8;

/// Where a positive label came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch<'a> {
    /// Position of the matching column among the report columns
    pub column: usize,
    pub keyword: &'a str,
}

/// Keyword matcher over report columns
#[derive(Debug, Clone)]
pub struct LabelDeriver {
    keywords: Vec<String>,
}

impl LabelDeriver {
    /// Create a deriver; keywords are lowercased once here
    pub fn new(config: &LabelConfig) -> Result<Self> {
        if config.keywords.is_empty() {
            return Err(Error::InvalidConfig("keyword list is empty".to_string()));
        }
        if config.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "keywords must not be blank".to_string(),
            ));
        }

        Ok(Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First report column containing a keyword, if any
    pub fn find_match<S: AsRef<str>>(&self, reports: &[S]) -> Option<KeywordMatch<'_>> {
        for (column, report) in reports.iter().enumerate() {
            let text = report.as_ref().to_lowercase();
            if let Some(keyword) = self.keywords.iter().find(|k| text.contains(k.as_str())) {
                return Some(KeywordMatch {
                    column,
                    keyword: keyword.as_str(),
                });
            }
        }
        None
    }

    /// Whether any report column contains a keyword
    pub fn is_abnormal<S: AsRef<str>>(&self, reports: &[S]) -> bool {
        self.find_match(reports).is_some()
    }

    /// Label one row of report columns
    pub fn label<S: AsRef<str>>(&self, reports: &[S]) -> Label {
        match self.find_match(reports) {
            Some(m) => {
                debug!("Matched keyword {:?} in report column {}", m.keyword, m.column);
                1
            }
            None => 0,
        }
    }

    /// Label every row, in order
    pub fn label_all(&self, rows: &[Vec<String>]) -> Vec<Label> {
        rows.iter().map(|r| self.label(r)).collect()
    }
}

/// Counts of positive and negative labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelStats {
    pub total: usize,
    pub abnormal: usize,
    pub normal: usize,
}

impl LabelStats {
    pub fn from_labels(labels: &[Label]) -> Self {
        let abnormal = labels.iter().filter(|&&l| l == 1).count();
        Self {
            total: labels.len(),
            abnormal,
            normal: labels.len() - abnormal,
        }
    }

    /// Share of abnormal labels as a percentage
    pub fn abnormal_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.abnormal as f64 / self.total as f64) * 100.0
        }
    }
}
