use ecgprep_core::{DatasetConfig, EcgDataset, Split};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🫀 ecgprep\n");

    let root = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "/tmp/ecgprep_test_data".to_string()),
    );

    let config = DatasetConfig {
        record_list: root.join("record_list.csv"),
        measurements: root.join("machine_measurements.csv"),
        data_dir: Some(root.clone()),
        ..Default::default()
    };

    for split in [Split::Train, Split::Validation] {
        let dataset = EcgDataset::new(config.clone(), split)?;
        let stats = dataset.label_stats();
        println!(
            "{} split: {} records ({} abnormal)",
            split,
            dataset.len(),
            stats.abnormal
        );

        for sample in dataset.iter().take(3) {
            let sample = sample?;
            println!(
                "  {} label={} shape={:?}",
                sample.path,
                sample.label,
                sample.signal.dim()
            );
        }
    }

    Ok(())
}
