//! Progress reporting for the render run
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::walker::{RenderProgress, RenderResult};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays run status
#[derive(Clone)]
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &RenderProgress) {
        let msg = format!(
            "Dirs: {} | Files: {} | Rendered: {} | Failed: {} | Rate: {:.0}/s",
            format_number(progress.dirs),
            format_number(progress.files),
            format_number(progress.rendered),
            format_number(progress.errors),
            progress.jobs_per_second(),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
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

/// Print a header at the start of the run
pub fn print_header(source: &str, dest: &str, converter: &str, workers: usize) {
    println!();
    println!(
        "{} {}",
        style("dotmill").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source);
    println!("  {} {}", style("Output:").bold(), dest);
    println!("  {} {}", style("Converter:").bold(), converter);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!();
}

/// Print a summary of the render results
pub fn print_summary(result: &RenderResult) {
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        result.rendered as f64 / duration_secs
    } else {
        0.0
    };

    let headline = if result.errors > 0 {
        style("Render Finished With Errors").yellow().bold()
    } else if result.completed {
        style("Render Complete").green().bold()
    } else {
        style("Render Interrupted").yellow().bold()
    };

    println!();
    println!("{}", headline);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(result.dirs_scanned)
    );
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(result.files_found)
    );
    println!(
        "  {} {} ({})",
        style("Rendered:").bold(),
        format_number(result.rendered),
        format_size(result.bytes_read, BINARY)
    );
    if result.skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").bold(),
            format_number(result.skipped)
        );
    }
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );

    if result.errors > 0 {
        println!(
            "  {} {}",
            style("Failed:").red().bold(),
            format_number(result.errors)
        );
        for failure in &result.failures {
            println!(
                "    {} {}: {}",
                style("✗").red(),
                failure.path.display(),
                failure.error
            );
        }
        let unreported = result.errors as usize - result.failures.len();
        if unreported > 0 {
            println!("    {} and {} more", style("…").dim(), unreported);
        }
    }
    println!();
}
