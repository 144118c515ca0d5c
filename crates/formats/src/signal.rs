//! WFDB signal file decoding
//!
//! Samples of every signal stored in one file are interleaved frame by
//! frame. Decoding yields the flat digital sample stream; splitting it into
//! channels is left to the record reader.

use crate::{Error, Result};

/// Supported WFDB storage formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit two's complement, little-endian
    Fmt16,
    /// Pairs of 12-bit samples packed into three bytes
    Fmt212,
    /// 8-bit offset binary
    Fmt80,
}

impl SampleFormat {
    /// Map a header format code to a supported format
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            16 => Ok(Self::Fmt16),
            212 => Ok(Self::Fmt212),
            80 => Ok(Self::Fmt80),
            other => Err(Error::UnsupportedFormat(format!(
                "WFDB signal format {}",
                other
            ))),
        }
    }

    /// Digital value marking a missing sample
    pub fn invalid_sample(self) -> i32 {
        match self {
            Self::Fmt16 => -32768,
            Self::Fmt212 => -2048,
            Self::Fmt80 => -128,
        }
    }

    /// Bytes needed to hold `n` samples, `None` on overflow
    pub fn byte_len(self, n: usize) -> Option<usize> {
        match self {
            Self::Fmt16 => n.checked_mul(2),
            Self::Fmt212 => (n / 2).checked_mul(3).and_then(|b| b.checked_add(2 * (n % 2))),
            Self::Fmt80 => Some(n),
        }
    }

    /// Decode as many complete samples as `bytes` holds, at most `max_samples`
    pub fn decode(self, bytes: &[u8], max_samples: Option<usize>) -> Vec<i32> {
        let mut samples: Vec<i32> = match self {
            Self::Fmt16 => bytes
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as i32)
                .collect(),
            Self::Fmt212 => decode_212(bytes),
            Self::Fmt80 => bytes.iter().map(|&b| b as i32 - 128).collect(),
        };
        if let Some(max) = max_samples {
            samples.truncate(max);
        }
        samples
    }

    /// Encode digital samples, used to build fixtures and exports
    pub fn encode(self, samples: &[i32]) -> Vec<u8> {
        match self {
            Self::Fmt16 => samples
                .iter()
                .flat_map(|&s| (s as i16).to_le_bytes())
                .collect(),
            Self::Fmt212 => {
                let mut out = Vec::with_capacity(self.byte_len(samples.len()).unwrap_or(0));
                for pair in samples.chunks(2) {
                    let a = (pair[0] & 0x0FFF) as u16;
                    out.push((a & 0xFF) as u8);
                    match pair.get(1) {
                        Some(&second) => {
                            let b = (second & 0x0FFF) as u16;
                            out.push((((b >> 8) as u8) << 4) | (a >> 8) as u8);
                            out.push((b & 0xFF) as u8);
                        }
                        None => out.push((a >> 8) as u8),
                    }
                }
                out
            }
            Self::Fmt80 => samples.iter().map(|&s| (s + 128) as u8).collect(),
        }
    }
}

/// Sign-extend a 12-bit value
fn sign_extend_12(v: u16) -> i32 {
    let v = v as i32;
    if v & 0x800 != 0 {
        v - 0x1000
    } else {
        v
    }
}

fn decode_212(bytes: &[u8]) -> Vec<i32> {
    let mut samples = Vec::with_capacity(bytes.len() * 2 / 3 + 1);
    let mut chunks = bytes.chunks_exact(3);

    for b in chunks.by_ref() {
        let first = b[0] as u16 | ((b[1] as u16 & 0x0F) << 8);
        let second = b[2] as u16 | ((b[1] as u16 & 0xF0) << 4);
        samples.push(sign_extend_12(first));
        samples.push(sign_extend_12(second));
    }

    // A trailing odd sample occupies two bytes
    let rest = chunks.remainder();
    if rest.len() == 2 {
        samples.push(sign_extend_12(rest[0] as u16 | ((rest[1] as u16 & 0x0F) << 8)));
    }

    samples
}
