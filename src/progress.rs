//! Progress reporting for batch runs
//!
//! Renders the event stream drained by the CLI main thread: a determinate
//! progress bar sized to the batch total, per-item log lines printed above
//! it, and a styled final summary.

use crate::events::BatchSummary;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Progress display for one batch
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a bar sized to the batch total
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress template")
                .progress_chars("█▓░"),
        );

        Self { bar }
    }

    /// Advance by one completed item and refresh the tally message
    pub fn record_item(&self, succeeded: u64, failed: u64) {
        self.bar.inc(1);
        if failed > 0 {
            self.bar
                .set_message(format!("{} ok, {} failed", succeeded, failed));
        } else {
            self.bar.set_message(format!("{} ok", succeeded));
        }
    }

    /// Print a log line above the bar without disturbing it
    pub fn log_line(&self, message: &str) {
        self.bar.println(message);
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Print a summary of the batch results
pub fn print_summary(summary: &BatchSummary) {
    let duration_secs = summary.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        summary.total as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Batch Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Items:").bold(),
        format_number(summary.total)
    );
    println!(
        "  {} {}",
        style("Succeeded:").bold(),
        format_number(summary.succeeded)
    );
    if summary.failed > 0 {
        println!(
            "  {} {}",
            style("Failed:").yellow().bold(),
            format_number(summary.failed)
        );
    }
    println!(
        "  {} {:.1}s ({:.1} items/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    println!();
}

/// Print a header at the start of the batch
pub fn print_header(root: &Path, workers: usize, endpoint: &str) {
    println!();
    println!(
        "{} {}",
        style("metabatch").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Folder:").bold(), root.display());
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Service:").bold(), endpoint);
    println!();
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
