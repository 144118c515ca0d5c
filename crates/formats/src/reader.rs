//! WFDB record reader
//!
//! Reads a record given its base path (no extension): the header is
//! `<base>.hea` and signal files are resolved relative to the header's
//! directory.

use crate::header::{Header, SignalSpec};
use crate::signal::SampleFormat;
use crate::{EcgRecord, Error, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header path for a record base path
pub fn header_path<P: AsRef<Path>>(base: P) -> PathBuf {
    let mut path = base.as_ref().as_os_str().to_owned();
    path.push(".hea");
    PathBuf::from(path)
}

/// Read a header from disk
pub fn read_header<P: AsRef<Path>>(base: P) -> Result<Header> {
    let path = header_path(base);
    let text = std::fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::InvalidFile(format!("missing header {:?}", path))
        } else {
            Error::Io(e)
        }
    })?;
    Header::parse(&text)
}

/// Signals stored in one file, with their column indices in the record
struct FileGroup<'a> {
    file_name: &'a str,
    columns: Vec<usize>,
    spec: &'a SignalSpec,
}

fn group_by_file(signals: &[SignalSpec]) -> Vec<FileGroup<'_>> {
    let mut groups: Vec<FileGroup<'_>> = Vec::new();
    for (col, spec) in signals.iter().enumerate() {
        match groups.iter_mut().find(|g| g.file_name == spec.file_name) {
            Some(group) => group.columns.push(col),
            None => groups.push(FileGroup {
                file_name: &spec.file_name,
                columns: vec![col],
                spec,
            }),
        }
    }
    groups
}

/// Read a WFDB record and convert every channel to physical units
pub fn read_record<P: AsRef<Path>>(base: P) -> Result<EcgRecord> {
    let base = base.as_ref();
    let header = read_header(base)?;
    let dir = base.parent().unwrap_or_else(|| Path::new("."));

    debug!(
        "Reading record {} ({} signals, fs={})",
        header.record.name, header.record.n_signals, header.record.fs
    );

    if header.signals.is_empty() {
        return Err(Error::InvalidFile(format!(
            "record {} has no signals",
            header.record.name
        )));
    }

    let groups = group_by_file(&header.signals);
    let mut decoded: Vec<(Vec<usize>, Vec<i32>, SampleFormat)> = Vec::with_capacity(groups.len());
    let mut n_frames = header.record.n_samples;

    for group in &groups {
        for &col in &group.columns {
            let spec = &header.signals[col];
            if spec.samples_per_frame != 1 {
                return Err(Error::UnsupportedFormat(format!(
                    "signal {} has {} samples per frame",
                    spec.description, spec.samples_per_frame
                )));
            }
            if spec.skew != 0 {
                return Err(Error::UnsupportedFormat(format!(
                    "signal {} has skew {}",
                    spec.description, spec.skew
                )));
            }
            if spec.format != group.spec.format {
                return Err(Error::UnsupportedFormat(format!(
                    "mixed formats in {}",
                    group.file_name
                )));
            }
        }

        let format = SampleFormat::from_code(group.spec.format)?;
        let width = group.columns.len();
        let max_samples = match header.record.n_samples {
            Some(n) => Some(n.checked_mul(width).ok_or_else(|| {
                Error::InvalidHeader(format!("sample count {} overflows", n))
            })?),
            None => None,
        };
        let max_bytes = match max_samples {
            Some(n) => Some(format.byte_len(n).ok_or_else(|| {
                Error::InvalidHeader(format!("sample count {} overflows", n))
            })?),
            None => None,
        };

        let signal_path = dir.join(group.file_name);
        let mut file = File::open(&signal_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::InvalidFile(format!("missing signal file {:?}", signal_path))
            } else {
                Error::Io(e)
            }
        })?;
        if group.spec.byte_offset > 0 {
            file.seek(SeekFrom::Start(group.spec.byte_offset))?;
        }
        let mut bytes = Vec::new();
        match max_bytes {
            Some(n) => {
                file.take(n as u64).read_to_end(&mut bytes)?;
            }
            None => {
                file.read_to_end(&mut bytes)?;
            }
        }

        let samples = format.decode(&bytes, max_samples);
        let frames = samples.len() / width;

        if let Some(expected) = header.record.n_samples {
            if frames < expected {
                warn!(
                    "{}: expected {} samples per signal, found {}",
                    group.file_name, expected, frames
                );
            }
        }

        n_frames = Some(n_frames.map_or(frames, |n| n.min(frames)));
        decoded.push((group.columns.clone(), samples, format));
    }

    let n_frames = n_frames.unwrap_or(0);
    let mut signal = Array2::<f64>::zeros((n_frames, header.signals.len()));

    for (columns, samples, format) in &decoded {
        let width = columns.len();
        let invalid = format.invalid_sample();
        for (k, &col) in columns.iter().enumerate() {
            let spec = &header.signals[col];
            for t in 0..n_frames {
                let digital = samples[t * width + k];
                signal[[t, col]] = if digital == invalid {
                    f64::NAN
                } else {
                    spec.to_physical(digital)
                };
            }
        }
    }

    info!(
        "Read record {}: {} samples x {} channels",
        header.record.name,
        n_frames,
        header.signals.len()
    );

    Ok(EcgRecord {
        name: header.record.name,
        fs: header.record.fs,
        channels: header.signals.iter().map(|s| s.description.clone()).collect(),
        units: header.signals.iter().map(|s| s.units.clone()).collect(),
        signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, bytes: &[u8]) {
        let mut f = File::create(path).unwrap();
        f.write_all(bytes).unwrap();
    }

    #[test]
    fn test_read_format_16_record() {
        let dir = tempdir().unwrap();
        write_file(
            &dir.path().join("rec.hea"),
            b"rec 2 500 3\nrec.dat 16 200/mV 16 0 0 0 0 I\nrec.dat 16 100(10)/mV 16 0 0 0 0 II\n",
        );
        // frames: (200, 110), (-200, -32768), (0, 10)
        let digital = [200, 110, -200, -32768, 0, 10];
        write_file(&dir.path().join("rec.dat"), &SampleFormat::Fmt16.encode(&digital));

        let record = read_record(dir.path().join("rec")).unwrap();
        assert_eq!(record.name, "rec");
        assert_eq!(record.fs, 500.0);
        assert_eq!(record.channels, vec!["I", "II"]);
        assert_eq!(record.signal.dim(), (3, 2));
        assert_eq!(record.signal[[0, 0]], 1.0);
        assert_eq!(record.signal[[0, 1]], 1.0);
        assert_eq!(record.signal[[1, 0]], -1.0);
        assert!(record.signal[[1, 1]].is_nan());
        assert_eq!(record.signal[[2, 1]], 0.0);
    }

    #[test]
    fn test_read_format_212_record() {
        let dir = tempdir().unwrap();
        write_file(
            &dir.path().join("m.hea"),
            b"m 2 360 2\nm.dat 212 200 11 0 0 0 0 MLII\nm.dat 212 200 11 0 0 0 0 V5\n",
        );
        let digital = [400, -400, -2048, 200];
        write_file(&dir.path().join("m.dat"), &SampleFormat::Fmt212.encode(&digital));

        let record = read_record(dir.path().join("m")).unwrap();
        assert_eq!(record.signal.dim(), (2, 2));
        assert_eq!(record.signal[[0, 0]], 2.0);
        assert_eq!(record.signal[[0, 1]], -2.0);
        assert!(record.signal[[1, 0]].is_nan());
        assert_eq!(record.signal[[1, 1]], 1.0);
    }

    #[test]
    fn test_read_separate_files_and_offset() {
        let dir = tempdir().unwrap();
        write_file(
            &dir.path().join("s.hea"),
            b"s 2 100 2\na.dat 80 1 8 0 0 0 0 A\nb.dat 16+4 1 16 0 0 0 0 B\n",
        );
        write_file(&dir.path().join("a.dat"), &SampleFormat::Fmt80.encode(&[5, -5]));
        let mut b = vec![0xAA; 4];
        b.extend(SampleFormat::Fmt16.encode(&[7, 8]));
        write_file(&dir.path().join("b.dat"), &b);

        let record = read_record(dir.path().join("s")).unwrap();
        assert_eq!(record.signal.column(0).to_vec(), vec![5.0, -5.0]);
        assert_eq!(record.signal.column(1).to_vec(), vec![7.0, 8.0]);
    }

    #[test]
    fn test_short_signal_file_keeps_complete_frames() {
        let dir = tempdir().unwrap();
        write_file(
            &dir.path().join("t.hea"),
            b"t 2 500 10\nt.dat 16 1 16 0 0 0 0 I\nt.dat 16 1 16 0 0 0 0 II\n",
        );
        write_file(&dir.path().join("t.dat"), &SampleFormat::Fmt16.encode(&[1, 2, 3]));

        let record = read_record(dir.path().join("t")).unwrap();
        assert_eq!(record.signal.dim(), (1, 2));
    }

    #[test]
    fn test_missing_header() {
        let dir = tempdir().unwrap();
        let result = read_record(dir.path().join("absent"));
        assert!(matches!(result, Err(Error::InvalidFile(_))));
    }

    #[test]
    fn test_unsupported_signal_format() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join("u.hea"), b"u 1 500 1\nu.dat 310 200 10 0 0 0 0 I\n");
        write_file(&dir.path().join("u.dat"), &[0, 0, 0, 0]);

        let result = read_record(dir.path().join("u"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_oversized_sample_count_rejected() {
        let dir = tempdir().unwrap();
        write_file(
            &dir.path().join("h.hea"),
            b"h 2 500 18446744073709551615\nh.dat 16 200 16 0 0 0 0 I\nh.dat 16 200 16 0 0 0 0 II\n",
        );
        write_file(&dir.path().join("h.dat"), &SampleFormat::Fmt16.encode(&[1, 2]));

        let result = read_record(dir.path().join("h"));
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_extreme_baseline_converts() {
        let dir = tempdir().unwrap();
        write_file(
            &dir.path().join("b.hea"),
            b"b 1 500 1\nb.dat 16 1(-2147483648) 16 0 0 0 0 I\n",
        );
        write_file(&dir.path().join("b.dat"), &SampleFormat::Fmt16.encode(&[32767]));

        let record = read_record(dir.path().join("b")).unwrap();
        assert_eq!(record.signal[[0, 0]], 32767.0 + 2147483648.0);
    }

    #[test]
    fn test_missing_signal_file_names_path() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join("g.hea"), b"g 1 500 1\ngone.dat 16 200 16 0 0 0 0 I\n");

        match read_record(dir.path().join("g")) {
            Err(Error::InvalidFile(msg)) => assert!(msg.contains("gone.dat"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_skewed_signal_rejected() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join("k.hea"), b"k 1 500 2\nk.dat 16:3 200 16 0 0 0 0 I\n");
        write_file(&dir.path().join("k.dat"), &SampleFormat::Fmt16.encode(&[1, 2]));

        let result = read_record(dir.path().join("k"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_header_path_keeps_dots() {
        assert_eq!(
            header_path("files/p1/rec.v1"),
            PathBuf::from("files/p1/rec.v1.hea")
        );
    }
}
