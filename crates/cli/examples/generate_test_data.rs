use ecgprep_formats::SampleFormat;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const LEADS: [&str; 12] = [
    "I", "II", "III", "aVR", "aVF", "aVL", "V1", "V2", "V3", "V4", "V5", "V6",
];

const REPORTS: [(&str, &str); 6] = [
    ("Sinus rhythm", "Normal ECG"),
    ("Sinus rhythm", "Possible anterior infarct - age undetermined"),
    ("Sinus bradycardia", "Borderline ECG"),
    ("Atrial fibrillation", "Abnormal ECG"),
    ("Sinus tachycardia", "Consider acute ischemia"),
    ("Sinus rhythm", ""),
];

/// Write one 12-lead record at 500 Hz in format 16
fn write_record(dir: &Path, name: &str, samples: usize, seed: usize) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;

    let mut hea = BufWriter::new(File::create(dir.join(format!("{}.hea", name)))?);
    writeln!(hea, "{} 12 500 {}", name, samples)?;
    for lead in LEADS {
        writeln!(hea, "{}.dat 16 200/mV 16 0 0 0 0 {}", name, lead)?;
    }
    hea.flush()?;

    let mut digital = Vec::with_capacity(samples * LEADS.len());
    for t in 0..samples {
        for (c, _) in LEADS.iter().enumerate() {
            // Every 997th sample of lead V1 is missing
            if c == 6 && t % 997 == 0 {
                digital.push(-32768);
                continue;
            }
            let phase = t as f64 / 500.0 * std::f64::consts::TAU * (1.0 + seed as f64 * 0.05);
            let value = (phase + c as f64 * 0.3).sin() * 200.0 * (1.0 + c as f64 * 0.1);
            digital.push(value.round() as i32);
        }
    }
    fs::write(dir.join(format!("{}.dat", name)), SampleFormat::Fmt16.encode(&digital))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/ecgprep_test_data".to_string());
    let root = Path::new(&root);
    fs::create_dir_all(root)?;

    println!("🔧 Generating test database: {}\n", root.display());

    let mut catalog = BufWriter::new(File::create(root.join("record_list.csv"))?);
    writeln!(catalog, "subject_id,study_id,file_name,ecg_time,path")?;
    let mut measurements = BufWriter::new(File::create(root.join("machine_measurements.csv"))?);
    writeln!(measurements, "subject_id,study_id,report_0,report_1,rr_interval")?;

    let mut count = 0;
    for subject in 0..5usize {
        let subject_id = 10_000_000 + subject;
        for visit in 0..3usize {
            let study_id = 40_000_000 + subject * 10 + visit;
            let rel = format!("files/p{}/s{}/{}", subject_id, study_id, study_id);
            // Some records are shorter or longer than 10 s
            let samples = match count % 4 {
                0 => 4000,
                1 => 6000,
                _ => 5000,
            };
            write_record(
                &root.join(format!("files/p{}/s{}", subject_id, study_id)),
                &study_id.to_string(),
                samples,
                count,
            )?;

            writeln!(
                catalog,
                "{},{},{},2180-07-23 08:44:00,{}",
                subject_id, study_id, study_id, rel
            )?;
            let (r0, r1) = REPORTS[count % REPORTS.len()];
            writeln!(measurements, "{},{},{},{},800", subject_id, study_id, r0, r1)?;
            count += 1;
        }
    }

    catalog.flush()?;
    measurements.flush()?;

    println!("✓ Generated {} records for 5 subjects", count);
    println!("\nTry:");
    println!(
        "  ecgprep --record-list {0}/record_list.csv --measurements {0}/machine_measurements.csv --data-dir {0} split",
        root.display()
    );
    println!(
        "  cargo run --example load_dataset {}",
        root.display()
    );

    Ok(())
}
