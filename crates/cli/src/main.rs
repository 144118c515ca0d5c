//! ecgprep CLI
//!
//! Prepares ECG records and abnormality labels for model training

mod config;
mod progress;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ecgprep_core::preprocess::{channel_stats, preprocess_signal};
use ecgprep_core::{DatasetConfig, EcgDataset, Split};
use ecgprep_filters::{LabelDeriver, LabelStats};
use ecgprep_formats::{limit_subjects, load_catalog, load_measurements, read_record};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::DatasetArgs;
use progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "ecgprep")]
#[command(version, about = "Prepare ECG records and abnormality labels for model training", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    dataset: DatasetArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output statistics in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive abnormality labels from the measurement reports
    Labels {
        /// Write `row,study_id,label` CSV here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a split and report its size and label balance
    Split {
        /// Use the validation side instead of the training side
        #[arg(long)]
        validation: bool,
    },

    /// Read one WFDB record and show it before and after preprocessing
    Inspect {
        /// Record base path (with or without `.hea`)
        #[arg(value_name = "RECORD")]
        record: PathBuf,
    },

    /// Preprocess every record of a split into JSON Lines
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Export the validation side instead of the training side
        #[arg(long)]
        validation: bool,

        /// Stop after this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Log unreadable records and continue instead of failing
        #[arg(long)]
        skip_errors: bool,
    },

    /// Print remote header names for catalog records
    Urls {
        /// Number of records to show
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },

    /// Write the effective configuration to a file
    InitConfig {
        /// Destination (YAML or TOML)
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.json) // Disable colors if JSON output
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Labels { output } => {
            let config = cli.dataset.resolve()?;
            derive_labels(&config, output.as_deref(), cli.json)?;
        }
        Commands::Split { validation } => {
            let config = cli.dataset.resolve()?;
            report_split(config, split_of(validation), cli.json)?;
        }
        Commands::Inspect { record } => {
            let config = cli.dataset.resolve()?;
            inspect_record(&record, config.target_length, cli.json)?;
        }
        Commands::Export {
            output,
            validation,
            limit,
            skip_errors,
        } => {
            let config = cli.dataset.resolve()?;
            export_split(config, split_of(validation), &output, limit, skip_errors, cli.json)?;
        }
        Commands::Urls { limit } => {
            let config = cli.dataset.resolve()?;
            print_urls(&config, limit, cli.json)?;
        }
        Commands::InitConfig { path } => {
            let config = cli.dataset.resolve()?;
            config::save(&config, &path)?;
            info!("Wrote configuration to {:?}", path);
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

fn split_of(validation: bool) -> Split {
    if validation {
        Split::Validation
    } else {
        Split::Train
    }
}

fn derive_labels(config: &DatasetConfig, output: Option<&Path>, json_output: bool) -> Result<()> {
    info!("Deriving labels");
    info!("  Measurements: {:?}", config.measurements);
    info!("  Keywords: {:?}", config.labels.keywords);

    let measurements = load_measurements(&config.measurements, &config.labels.column_prefix)?;
    let deriver = LabelDeriver::new(&config.labels)?;
    let rows: Vec<Vec<String>> = measurements.rows.iter().map(|r| r.reports.clone()).collect();
    let labels = deriver.label_all(&rows);
    let stats = LabelStats::from_labels(&labels);

    if let Some(path) = output {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create label file: {}", path.display()))?;
        writer.write_record(["row", "study_id", "label"])?;
        for (i, (row, label)) in measurements.rows.iter().zip(&labels).enumerate() {
            writer.write_record([
                i.to_string(),
                row.study_id.clone().unwrap_or_default(),
                label.to_string(),
            ])?;
        }
        writer.flush()?;
    }

    if json_output {
        let report = serde_json::json!({
            "measurements": config.measurements.to_string_lossy().to_string(),
            "output": output.map(|p| p.to_string_lossy().to_string()),
            "report_columns": measurements.report_columns,
            "total_records": stats.total,
            "abnormal": stats.abnormal,
            "normal": stats.normal,
            "abnormal_rate": stats.abnormal_rate(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        progress::print_summary_report(
            "Label Derivation Complete",
            &config.measurements,
            output,
            &stats,
            0,
        );
    }

    Ok(())
}

fn report_split(config: DatasetConfig, split: Split, json_output: bool) -> Result<()> {
    let record_list = config.record_list.clone();
    let dataset = EcgDataset::new(config, split)?;
    let stats = dataset.label_stats();
    let config = dataset.config();

    if json_output {
        let report = serde_json::json!({
            "record_list": record_list.to_string_lossy().to_string(),
            "split": split,
            "records": dataset.len(),
            "abnormal": stats.abnormal,
            "normal": stats.normal,
            "abnormal_rate": stats.abnormal_rate(),
            "train_ratio": config.train_ratio,
            "shuffle": config.shuffle,
            "seed": config.seed,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let title = format!("Split Summary ({})", split);
        progress::print_summary_report(&title, &record_list, None, &stats, 0);
    }

    Ok(())
}

/// Strip a trailing `.hea` so both `rec` and `rec.hea` name the same record
fn record_base(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("hea") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

fn inspect_record(path: &Path, target_length: usize, json_output: bool) -> Result<()> {
    let base = record_base(path);
    info!("Inspecting record: {:?}", base);

    let record = read_record(&base)
        .with_context(|| format!("Failed to read record: {}", base.display()))?;
    let before = channel_stats(record.signal.view());
    let processed = preprocess_signal(record.signal.view(), target_length)?;
    let after = channel_stats(processed.mapv(|v| v as f64).view());

    if json_output {
        let report = serde_json::json!({
            "record": record.name,
            "fs": record.fs,
            "samples": record.n_samples(),
            "channels": record.channels,
            "units": record.units,
            "missing_samples": record.missing_samples(),
            "target_length": target_length,
            "raw": before,
            "processed": after,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Record:        {}", record.name);
    println!("Sampling rate: {} Hz", record.fs);
    println!(
        "Shape:         {} samples x {} channels ({:.2} s)",
        record.n_samples(),
        record.n_channels(),
        record.duration_secs()
    );
    println!("Missing:       {}", record.missing_samples());
    println!();
    println!(
        "{:<8} {:>10} {:>10} {:>10} {:>10}   {:>10} {:>10}",
        "channel", "mean", "std", "min", "max", "mean'", "std'"
    );
    for (i, name) in record.channels.iter().enumerate() {
        let b = &before[i];
        let a = &after[i];
        println!(
            "{:<8} {:>10.4} {:>10.4} {:>10.4} {:>10.4}   {:>10.4} {:>10.4}",
            name, b.mean, b.std, b.min, b.max, a.mean, a.std
        );
    }

    Ok(())
}

fn export_split(
    config: DatasetConfig,
    split: Split,
    output: &Path,
    limit: Option<usize>,
    skip_errors: bool,
    json_output: bool,
) -> Result<()> {
    info!("Exporting {} split", split);
    info!("  Output: {:?}", output);
    info!("  Target length: {}", config.target_length);

    let record_list = config.record_list.clone();
    let dataset = EcgDataset::new(config, split)?;
    let total = limit.map_or(dataset.len(), |n| n.min(dataset.len()));

    let mut writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("Failed to create output file: {}", output.display()))?,
    );

    let progress = ProgressReporter::new(total as u64);
    let mut written = Vec::with_capacity(total);
    let mut abnormal = 0;
    let mut skipped = 0;

    for (i, result) in dataset.iter().take(total).enumerate() {
        let sample = match result {
            Ok(sample) => sample,
            Err(e) if skip_errors => {
                warn!("Skipping {}: {}", dataset.entries()[i].path, e);
                skipped += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load record {}", dataset.entries()[i].path)
                })
            }
        };

        let (channels, length) = sample.signal.dim();
        let signal: Vec<Vec<f32>> = sample.signal.outer_iter().map(|row| row.to_vec()).collect();
        let line = serde_json::json!({
            "path": sample.path,
            "label": sample.label,
            "shape": [channels, length],
            "signal": signal,
        });
        writeln!(writer, "{}", serde_json::to_string(&line)?)?;
        written.push(sample.label);
        if sample.label == 1 {
            abnormal += 1;
        }

        progress.update(i + 1, abnormal, skipped);
    }

    writer.flush()?;
    progress.finish();

    let stats = LabelStats::from_labels(&written);

    if json_output {
        let report = serde_json::json!({
            "record_list": record_list.to_string_lossy().to_string(),
            "output": output.to_string_lossy().to_string(),
            "split": split,
            "written": stats.total,
            "abnormal": stats.abnormal,
            "normal": stats.normal,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let title = format!("Export Complete ({})", split);
        progress::print_summary_report(&title, &record_list, Some(output), &stats, skipped);
    }

    Ok(())
}

fn print_urls(config: &DatasetConfig, limit: usize, json_output: bool) -> Result<()> {
    let catalog = load_catalog(&config.record_list)?;
    let catalog = limit_subjects(catalog, config.max_subjects, config.max_records_per_subject);

    let urls: Vec<String> = catalog
        .iter()
        .take(limit)
        .map(|e| e.remote_header_url(&config.remote_prefix))
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&urls)?);
    } else {
        for url in &urls {
            println!("{}", url);
        }
        info!("{} records in catalog", catalog.len());
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecgprep_formats::SampleFormat;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_with_overrides() {
        let cli = Cli::try_parse_from([
            "ecgprep",
            "export",
            "-o",
            "out.jsonl",
            "--validation",
            "-n",
            "10",
            "--target-length",
            "2500",
            "--no-shuffle",
        ])
        .unwrap();

        match cli.command {
            Commands::Export {
                output,
                validation,
                limit,
                skip_errors,
            } => {
                assert_eq!(output, PathBuf::from("out.jsonl"));
                assert!(validation);
                assert_eq!(limit, Some(10));
                assert!(!skip_errors);
            }
            _ => panic!("expected export command"),
        }
        assert_eq!(cli.dataset.target_length, Some(2500));
        assert!(cli.dataset.no_shuffle);
    }

    #[test]
    fn test_parse_global_config_before_subcommand() {
        let cli = Cli::try_parse_from(["ecgprep", "--config", "ecg.yaml", "split"]).unwrap();
        assert_eq!(cli.dataset.config, Some(PathBuf::from("ecg.yaml")));
        assert!(matches!(cli.command, Commands::Split { validation: false }));
    }

    #[test]
    fn test_record_base() {
        assert_eq!(record_base(Path::new("a/rec.hea")), PathBuf::from("a/rec"));
        assert_eq!(record_base(Path::new("a/rec")), PathBuf::from("a/rec"));
    }

    fn fixture(dir: &Path) -> DatasetConfig {
        let files = dir.join("files");
        fs::create_dir_all(&files).unwrap();
        for (name, digital) in [("r0", [200, -200, 0, 400]), ("r1", [100, 100, 100, 100])] {
            fs::write(
                files.join(format!("{}.hea", name)),
                format!("{} 1 500 4\n{}.dat 16 200/mV 16 0 0 0 0 I\n", name, name),
            )
            .unwrap();
            fs::write(files.join(format!("{}.dat", name)), SampleFormat::Fmt16.encode(&digital))
                .unwrap();
        }

        let record_list = dir.join("record_list.csv");
        fs::write(&record_list, "subject_id,path\n1,files/r0\n2,files/r1\n2,files/missing\n").unwrap();
        let measurements = dir.join("machine_measurements.csv");
        fs::write(
            &measurements,
            "report_0,report_1\nSinus rhythm,Abnormal ECG\nSinus rhythm,Normal ECG\nSinus rhythm,\n",
        )
        .unwrap();

        DatasetConfig {
            record_list,
            measurements,
            data_dir: Some(dir.to_path_buf()),
            target_length: 8,
            train_ratio: 1.0,
            shuffle: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_labels_writes_csv() {
        let dir = tempdir().unwrap();
        let config = fixture(dir.path());
        let output = dir.path().join("labels.csv");

        derive_labels(&config, Some(&output), true).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["row,study_id,label", "0,,1", "1,,0", "2,,0"]);
    }

    #[test]
    fn test_derive_labels_keeps_study_ids() {
        let dir = tempdir().unwrap();
        let config = fixture(dir.path());
        fs::write(
            &config.measurements,
            "study_id,report_0\n501,Inferior infarct\n502,Sinus rhythm\n",
        )
        .unwrap();
        let output = dir.path().join("labels.csv");

        derive_labels(&config, Some(&output), true).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["row,study_id,label", "0,501,1", "1,502,0"]);
    }

    #[test]
    fn test_export_skips_unreadable_records() {
        let dir = tempdir().unwrap();
        let config = fixture(dir.path());
        let output = dir.path().join("train.jsonl");

        export_split(config, Split::Train, &output, None, true, true).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let rows: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["path"], "files/r0");
        assert_eq!(rows[0]["label"], 1);
        assert_eq!(rows[0]["shape"], serde_json::json!([1, 8]));
        assert_eq!(rows[0]["signal"][0].as_array().unwrap().len(), 8);
        assert_eq!(rows[1]["label"], 0);
    }

    #[test]
    fn test_export_fails_on_unreadable_record() {
        let dir = tempdir().unwrap();
        let config = fixture(dir.path());
        let output = dir.path().join("train.jsonl");

        assert!(export_split(config, Split::Train, &output, None, false, true).is_err());
    }

    #[test]
    fn test_export_limit() {
        let dir = tempdir().unwrap();
        let config = fixture(dir.path());
        let output = dir.path().join("train.jsonl");

        export_split(config, Split::Train, &output, Some(1), false, true).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap().lines().count(), 1);
    }
}
