//! Progress reporting and summaries for CLI

use std::path::Path;

use ecgprep_filters::LabelStats;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the records of one split
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter tracking records
    pub fn new(total_records: u64) -> Self {
        let bar = ProgressBar::new(total_records);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {human_pos}/{human_len} ({per_sec}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░-"),
        );

        Self { bar }
    }

    /// Update progress with current statistics
    pub fn update(&self, processed: usize, abnormal: usize, skipped: usize) {
        self.bar.set_position(processed as u64);

        let msg = if skipped > 0 {
            format!(
                "{} abnormal | {} skipped",
                Self::format_number(abnormal),
                Self::format_number(skipped)
            )
        } else {
            format!("{} abnormal", Self::format_number(abnormal))
        };
        self.bar.set_message(msg);
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        self.bar.finish_with_message("Complete!");
    }

    /// Format large numbers compactly
    fn format_number(n: usize) -> String {
        if n >= 1_000_000 {
            format!("{:.1}M", n as f64 / 1_000_000.0)
        } else if n >= 1_000 {
            format!("{:.1}K", n as f64 / 1_000.0)
        } else {
            n.to_string()
        }
    }
}

/// Print a formatted summary of a labelled split
pub fn print_summary_report(
    title: &str,
    input: &Path,
    output: Option<&Path>,
    stats: &LabelStats,
    skipped: usize,
) {
    println!("\n{}", "═".repeat(60));
    println!("{}", title);
    println!("{}", "═".repeat(60));
    println!("Input:              {}", input.display());

    if let Some(output_path) = output {
        println!("Output:             {}", output_path.display());
    }

    println!("Total records:      {}", format_with_commas(stats.total));
    println!(
        "Abnormal:           {} ({:.1}%)",
        format_with_commas(stats.abnormal),
        stats.abnormal_rate()
    );
    println!("Normal:             {}", format_with_commas(stats.normal));

    if skipped > 0 {
        println!("Skipped:            {}", format_with_commas(skipped));
    }

    println!("{}", "═".repeat(60));
}

/// Format number with thousand separators
pub fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
