//! Signal normalization
//!
//! Every record goes through the same three steps before it reaches the
//! model: non-finite values are replaced, the time axis is cut or
//! zero-padded to a fixed length, and each channel is z-scored.

use crate::{Error, Result};
use ndarray::{s, Array2, ArrayView2, Axis};
use serde::Serialize;

/// Replace NaN and infinities with 0
pub fn remove_nan(mut signal: Array2<f64>) -> Array2<f64> {
    signal.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });
    signal
}

/// Keep the first `target_length` rows, or append zero rows up to it
pub fn truncate_or_pad(signal: Array2<f64>, target_length: usize) -> Array2<f64> {
    let (rows, cols) = signal.dim();

    if rows > target_length {
        signal.slice(s![..target_length, ..]).to_owned()
    } else if rows < target_length {
        let mut padded = Array2::<f64>::zeros((target_length, cols));
        padded.slice_mut(s![..rows, ..]).assign(&signal);
        padded
    } else {
        signal
    }
}

/// Z-score each column; a zero standard deviation is treated as 1
pub fn zscore_normalize(mut signal: Array2<f64>) -> Array2<f64> {
    for mut column in signal.axis_iter_mut(Axis(1)) {
        let mean = column.mean().unwrap_or(0.0);
        let std = column.std(0.0);
        let std = if std == 0.0 { 1.0 } else { std };
        column.mapv_inplace(|v| (v - mean) / std);
    }
    signal
}

/// Full preprocessing: `(time, channel)` in, `(target_length, channel)` f32 out
pub fn preprocess_signal(signal: ArrayView2<'_, f64>, target_length: usize) -> Result<Array2<f32>> {
    if target_length == 0 {
        return Err(Error::InvalidConfig(
            "target_length must be greater than 0".to_string(),
        ));
    }

    let signal = remove_nan(signal.to_owned());
    let signal = truncate_or_pad(signal, target_length);
    let signal = zscore_normalize(signal);
    Ok(signal.mapv(|v| v as f32))
}

/// Transpose `(time, channel)` into the `(channel, time)` layout the model expects
pub fn to_channel_major(signal: Array2<f32>) -> Array2<f32> {
    signal.reversed_axes().as_standard_layout().into_owned()
}

/// Per-channel summary statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Non-finite samples in the channel
    pub missing: usize,
}

/// Summarise each column of a `(time, channel)` signal, ignoring non-finite samples
pub fn channel_stats(signal: ArrayView2<'_, f64>) -> Vec<ChannelStats> {
    signal
        .axis_iter(Axis(1))
        .map(|column| {
            let finite: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
            let missing = column.len() - finite.len();
            if finite.is_empty() {
                return ChannelStats {
                    mean: 0.0,
                    std: 0.0,
                    min: 0.0,
                    max: 0.0,
                    missing,
                };
            }

            let n = finite.len() as f64;
            let mean = finite.iter().sum::<f64>() / n;
            let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            ChannelStats {
                mean,
                std: var.sqrt(),
                min: finite.iter().copied().fold(f64::INFINITY, f64::min),
                max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                missing,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    const EPS: f64 = 1e-5;

    fn column_std(signal: &Array2<f32>, col: usize) -> f64 {
        let c: Array1<f64> = signal.column(col).mapv(|v| v as f64);
        c.std(0.0)
    }

    fn column_mean(signal: &Array2<f32>, col: usize) -> f64 {
        signal.column(col).mapv(|v| v as f64).mean().unwrap()
    }

    #[test]
    fn test_remove_nan() {
        let signal = array![[f64::NAN, 1.0], [f64::INFINITY, f64::NEG_INFINITY]];
        let cleaned = remove_nan(signal);
        assert_eq!(cleaned, array![[0.0, 1.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_infinities_keep_output_finite() {
        let signal = array![[f64::INFINITY], [f64::INFINITY], [1.0], [2.0]];
        let out = preprocess_signal(signal.view(), 4).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
        assert!((column_std(&out, 0) - 1.0).abs() < EPS);

        let signal = array![[f64::NEG_INFINITY, 4.0], [0.0, 4.0], [1.0, 4.0], [2.0, 4.0]];
        let out = preprocess_signal(signal.view(), 4).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
        assert!((column_std(&out, 0) - 1.0).abs() < EPS);
        assert!(column_mean(&out, 0).abs() < EPS);
        assert_eq!(out.column(1).to_vec(), vec![0.0; 4]);
    }

    #[test]
    fn test_truncate() {
        let signal = Array2::from_shape_fn((10, 2), |(t, c)| (t * 2 + c) as f64);
        let out = truncate_or_pad(signal, 4);
        assert_eq!(out.dim(), (4, 2));
        assert_eq!(out[[3, 1]], 7.0);
    }

    #[test]
    fn test_pad_with_zero_rows() {
        let signal = array![[1.0, 2.0], [3.0, 4.0]];
        let out = truncate_or_pad(signal, 4);
        assert_eq!(out, array![[1.0, 2.0], [3.0, 4.0], [0.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_exact_length_unchanged() {
        let signal = array![[1.0], [2.0]];
        assert_eq!(truncate_or_pad(signal.clone(), 2), signal);
    }

    #[test]
    fn test_output_length_is_always_target() {
        for rows in [0, 1, 499, 500, 501, 5000, 7500] {
            let signal = Array2::from_shape_fn((rows, 12), |(t, c)| ((t + c) as f64).sin());
            let out = preprocess_signal(signal.view(), 500).unwrap();
            assert_eq!(out.dim(), (500, 12), "input rows {}", rows);
        }
    }

    #[test]
    fn test_unit_std_for_varying_channels() {
        let signal = Array2::from_shape_fn((800, 3), |(t, c)| {
            (t as f64 * 0.05 * (c + 1) as f64).sin() * 3.0 + c as f64
        });
        let out = preprocess_signal(signal.view(), 1000).unwrap();

        for c in 0..3 {
            assert!((column_std(&out, c) - 1.0).abs() < EPS, "channel {}", c);
            assert!(column_mean(&out, c).abs() < EPS, "channel {}", c);
        }
    }

    #[test]
    fn test_zero_variance_channel_is_only_shifted() {
        let signal = array![[3.0, 1.0], [3.0, -1.0], [3.0, 1.0], [3.0, -1.0]];
        let out = zscore_normalize(signal);

        // Constant channel: mean removed, no scaling
        assert_eq!(out.column(0).to_vec(), vec![0.0; 4]);
        // Varying channel: mean 0, population std 1
        assert_eq!(out.column(1).to_vec(), vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_all_zero_signal_stays_zero() {
        let signal = Array2::<f64>::zeros((10, 2));
        let out = preprocess_signal(signal.view(), 20).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_nan_replaced_before_normalization() {
        let signal = array![[f64::NAN], [2.0], [0.0], [2.0]];
        let out = preprocess_signal(signal.view(), 4).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(out.column(0).to_vec(), vec![-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_zero_target_length_rejected() {
        let signal = array![[1.0]];
        assert!(matches!(
            preprocess_signal(signal.view(), 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_to_channel_major() {
        let signal = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let out = to_channel_major(signal);
        assert_eq!(out, array![[1.0f32, 3.0, 5.0], [2.0, 4.0, 6.0]]);
        assert!(out.is_standard_layout());
    }

    #[test]
    fn test_channel_stats_skips_missing() {
        let signal = array![[1.0, f64::NAN], [3.0, f64::NAN], [f64::NAN, f64::NAN]];
        let stats = channel_stats(signal.view());
        assert_eq!(stats[0].mean, 2.0);
        assert_eq!(stats[0].std, 1.0);
        assert_eq!(stats[0].min, 1.0);
        assert_eq!(stats[0].max, 3.0);
        assert_eq!(stats[0].missing, 1);
        assert_eq!(stats[1].missing, 3);
    }
}
