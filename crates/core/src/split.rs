//! Train/validation split
//!
//! The split is a prefix/suffix partition of an ordered list: the first
//! `floor(n * ratio)` items train, the rest validate. An optional seeded
//! shuffle runs first so both halves see the same permutation.

use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the partition a dataset draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "training"),
            Split::Validation => write!(f, "validation"),
        }
    }
}

/// Reject ratios outside `[0, 1]`
pub fn check_ratio(ratio: f64) -> Result<()> {
    if ratio.is_finite() && (0.0..=1.0).contains(&ratio) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "split ratio must be within [0, 1], got {}",
            ratio
        )))
    }
}

/// Number of items in the prefix: `floor(n * ratio)`
pub fn split_index(n: usize, ratio: f64) -> Result<usize> {
    check_ratio(ratio)?;
    Ok(((n as f64 * ratio).floor() as usize).min(n))
}

/// Partition `items` into a prefix of `floor(n * ratio)` items and the remainder
pub fn split<T>(mut items: Vec<T>, ratio: f64) -> Result<(Vec<T>, Vec<T>)> {
    let idx = split_index(items.len(), ratio)?;
    let suffix = items.split_off(idx);
    Ok((items, suffix))
}

/// Shuffle with a seeded RNG, then partition
pub fn shuffled_split<T>(mut items: Vec<T>, ratio: f64, seed: u64) -> Result<(Vec<T>, Vec<T>)> {
    check_ratio(ratio)?;
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    split(items, ratio)
}

/// Keep one side of the partition, optionally shuffling first with `seed`
pub fn select<T>(items: Vec<T>, ratio: f64, which: Split, seed: Option<u64>) -> Result<Vec<T>> {
    let (train, validation) = match seed {
        Some(seed) => shuffled_split(items, ratio, seed)?,
        None => split(items, ratio)?,
    };
    Ok(match which {
        Split::Train => train,
        Split::Validation => validation,
    })
}
