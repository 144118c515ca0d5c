//! In-memory ECG record

use ndarray::Array2;

/// One ECG acquisition: all channels in physical units
#[derive(Debug, Clone)]
pub struct EcgRecord {
    pub name: String,
    /// Sampling frequency in Hz
    pub fs: f64,
    /// Channel descriptions (lead names), one per column of `signal`
    pub channels: Vec<String>,
    /// Physical units, one per channel
    pub units: Vec<String>,
    /// Samples in `(time, channel)` layout; missing samples are NaN
    pub signal: Array2<f64>,
}

impl EcgRecord {
    /// Number of samples per channel
    pub fn n_samples(&self) -> usize {
        self.signal.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.signal.ncols()
    }

    /// Record duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.fs
    }

    /// Number of non-finite samples across all channels
    pub fn missing_samples(&self) -> usize {
        self.signal.iter().filter(|v| !v.is_finite()).count()
    }
}
