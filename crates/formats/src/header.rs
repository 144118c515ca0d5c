//! WFDB header (`.hea`) parsing
//!
//! A header holds one record line followed by one line per signal:
//!
//! ```text
//! 40689238 12 500 5000
//! 40689238.dat 16 200/mV 16 0 -9 -9 0 I
//! ```
//!
//! Lines starting with `#` are comments. Only single-segment records are
//! supported.

use crate::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Sampling frequency assumed when the record line omits it
pub const DEFAULT_FS: f64 = 250.0;
/// ADC gain assumed when a signal line omits it or gives zero
pub const DEFAULT_GAIN: f64 = 200.0;
pub const DEFAULT_UNITS: &str = "mV";

static FORMAT_REGEX: OnceLock<Regex> = OnceLock::new();
static GAIN_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_format_regex() -> &'static Regex {
    // fmt[xsamples][:skew][+offset]
    FORMAT_REGEX.get_or_init(|| {
        Regex::new(r"^(\d+)(?:x(\d+))?(?::(\d+))?(?:\+(\d+))?$")
            .expect("Failed to compile format regex")
    })
}

fn get_gain_regex() -> &'static Regex {
    // gain[(baseline)][/units]
    GAIN_REGEX.get_or_init(|| {
        Regex::new(r"^([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)(?:\(([-+]?\d+)\))?(?:/(\S+))?$")
            .expect("Failed to compile gain regex")
    })
}

/// Parsed record line
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInfo {
    pub name: String,
    pub n_signals: usize,
    pub fs: f64,
    /// Samples per signal, when the header states it
    pub n_samples: Option<usize>,
}

/// Parsed signal line
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub file_name: String,
    pub format: u16,
    pub samples_per_frame: u32,
    pub skew: u32,
    pub byte_offset: u64,
    pub gain: f64,
    pub baseline: i32,
    pub units: String,
    pub adc_resolution: Option<u32>,
    pub adc_zero: i32,
    pub initial_value: Option<i32>,
    pub checksum: Option<i32>,
    pub block_size: Option<u32>,
    pub description: String,
}

impl SignalSpec {
    /// Convert a digital sample to physical units
    pub fn to_physical(&self, digital: i32) -> f64 {
        (digital as f64 - self.baseline as f64) / self.gain
    }
}

/// A complete single-segment header
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub record: RecordInfo,
    pub signals: Vec<SignalSpec>,
    /// Free-text `#` comment lines, without the leading `#`
    pub comments: Vec<String>,
}

impl Header {
    /// Parse header text
    pub fn parse(text: &str) -> Result<Self> {
        let mut comments = Vec::new();
        let mut lines = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(comment) = trimmed.strip_prefix('#') {
                comments.push(comment.trim().to_string());
            } else if !trimmed.is_empty() {
                lines.push(trimmed);
            }
        }

        let (record_line, signal_lines) = lines
            .split_first()
            .ok_or_else(|| Error::InvalidHeader("empty header".to_string()))?;

        let record = parse_record_line(record_line)?;

        if signal_lines.len() < record.n_signals {
            return Err(Error::InvalidHeader(format!(
                "record {} declares {} signals but has {} signal lines",
                record.name,
                record.n_signals,
                signal_lines.len()
            )));
        }

        let signals = signal_lines[..record.n_signals]
            .iter()
            .enumerate()
            .map(|(i, line)| parse_signal_line(line, i))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            record,
            signals,
            comments,
        })
    }
}

fn parse_record_line(line: &str) -> Result<RecordInfo> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(Error::InvalidHeader(format!("record line too short: {:?}", line)));
    }

    let name = fields[0];
    if name.contains('/') {
        return Err(Error::UnsupportedFormat(format!(
            "multi-segment record: {}",
            name
        )));
    }

    let n_signals = fields[1]
        .parse::<usize>()
        .map_err(|e| Error::InvalidHeader(format!("invalid signal count {:?}: {}", fields[1], e)))?;

    // fs[/counter_freq[(base_counter)]]
    let fs = match fields.get(2) {
        Some(spec) => {
            let fs_text = spec.split(['/', '(']).next().unwrap_or(*spec);
            let fs = fs_text.parse::<f64>().map_err(|e| {
                Error::InvalidHeader(format!("invalid sampling frequency {:?}: {}", spec, e))
            })?;
            if fs > 0.0 {
                fs
            } else {
                DEFAULT_FS
            }
        }
        None => DEFAULT_FS,
    };

    let n_samples = match fields.get(3) {
        Some(spec) => Some(spec.parse::<usize>().map_err(|e| {
            Error::InvalidHeader(format!("invalid sample count {:?}: {}", spec, e))
        })?),
        None => None,
    };

    Ok(RecordInfo {
        name: name.to_string(),
        n_signals,
        fs,
        n_samples,
    })
}

fn parse_int<T: std::str::FromStr>(field: Option<&&str>, what: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    field
        .map(|f| {
            f.parse::<T>()
                .map_err(|e| Error::InvalidHeader(format!("invalid {} {:?}: {}", what, f, e)))
        })
        .transpose()
}

fn parse_signal_line(line: &str, index: usize) -> Result<SignalSpec> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(Error::InvalidHeader(format!("signal line too short: {:?}", line)));
    }

    let format_caps = get_format_regex()
        .captures(fields[1])
        .ok_or_else(|| Error::InvalidHeader(format!("invalid format field {:?}", fields[1])))?;
    let capture_num = |i: usize| -> Result<Option<u64>> {
        format_caps
            .get(i)
            .map(|m| {
                m.as_str().parse::<u64>().map_err(|e| {
                    Error::InvalidHeader(format!("invalid format field {:?}: {}", fields[1], e))
                })
            })
            .transpose()
    };
    let format = capture_num(1)?.unwrap_or(0) as u16;
    let samples_per_frame = capture_num(2)?.unwrap_or(1) as u32;
    let skew = capture_num(3)?.unwrap_or(0) as u32;
    let byte_offset = capture_num(4)?.unwrap_or(0);

    let adc_resolution = parse_int::<u32>(fields.get(3), "ADC resolution")?;
    let adc_zero = parse_int::<i32>(fields.get(4), "ADC zero")?.unwrap_or(0);
    let initial_value = parse_int::<i32>(fields.get(5), "initial value")?;
    let checksum = parse_int::<i32>(fields.get(6), "checksum")?;
    let block_size = parse_int::<u32>(fields.get(7), "block size")?;

    let (gain, baseline, units) = match fields.get(2) {
        Some(spec) => {
            let caps = get_gain_regex()
                .captures(spec)
                .ok_or_else(|| Error::InvalidHeader(format!("invalid gain field {:?}", spec)))?;
            let gain = caps[1]
                .parse::<f64>()
                .map_err(|e| Error::InvalidHeader(format!("invalid gain {:?}: {}", spec, e)))?;
            let baseline = match caps.get(2) {
                Some(m) => m.as_str().parse::<i32>().map_err(|e| {
                    Error::InvalidHeader(format!("invalid baseline {:?}: {}", spec, e))
                })?,
                None => adc_zero,
            };
            let units = caps
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| DEFAULT_UNITS.to_string());
            (gain, baseline, units)
        }
        None => (DEFAULT_GAIN, adc_zero, DEFAULT_UNITS.to_string()),
    };
    let gain = if gain == 0.0 { DEFAULT_GAIN } else { gain };

    let description = if fields.len() > 8 {
        fields[8..].join(" ")
    } else {
        format!("signal {}", index)
    };

    Ok(SignalSpec {
        file_name: fields[0].to_string(),
        format,
        samples_per_frame,
        skew,
        byte_offset,
        gain,
        baseline,
        units,
        adc_resolution,
        adc_zero,
        initial_value,
        checksum,
        block_size,
        description,
    })
}
