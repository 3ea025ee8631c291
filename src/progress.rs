//! Cargo-style console reporting
//!
//! Per-item operations scroll above a spinner that holds the current
//! stage and counters. The spinner draws to stderr and hides itself when
//! stderr is not a terminal, so piped output stays plain text.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Uploads between "Progress:" checkpoint lines
pub const CHECKPOINT_EVERY: u64 = 10;

pub struct DeployProgress {
    spinner: ProgressBar,
    start_time: Instant,
    quiet: bool,
    verbose: bool,
}

impl DeployProgress {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner,
            start_time: Instant::now(),
            quiet,
            verbose,
        }
    }

    /// No spinner; lines are still printed unless `quiet`
    pub fn hidden(quiet: bool) -> Self {
        Self {
            spinner: ProgressBar::hidden(),
            start_time: Instant::now(),
            quiet,
            verbose: false,
        }
    }

    fn print(&self, line: String) {
        self.spinner.suspend(|| println!("{}", line));
    }

    /// Section heading, always shown
    pub fn stage(&self, msg: &str) {
        self.print(msg.to_string());
        self.spinner.set_message(msg.trim_end_matches(['.', ':']).to_string());
    }

    /// One successful operation (`Deleted file`, `Uploaded`, ...)
    pub fn file_op(&self, operation: &str, path: &str) {
        if !self.quiet {
            self.print(format!("✓ {}: {}", operation, path));
        }
    }

    /// A recoverable failure; shown even in quiet mode
    pub fn failure(&self, what: &str, path: &str, err: &anyhow::Error) {
        self.spinner
            .suspend(|| eprintln!("✗ {} {}: {:#}", what, path, err));
    }

    /// Detail only shown with `--verbose`
    pub fn detail(&self, msg: &str) {
        if self.verbose {
            self.print(format!("  {}", msg));
        }
    }

    pub fn warn(&self, msg: &str) {
        self.spinner.suspend(|| eprintln!("warning: {}", msg));
    }

    /// Called after each successful upload with the running total
    pub fn uploaded(&self, total: u64) {
        self.spinner
            .set_message(format!("Uploading ({} files) in {:.1}s", total, self.elapsed_secs()));
        if !self.quiet && total % CHECKPOINT_EVERY == 0 {
            self.print(format!("  Progress: {} files uploaded...", total));
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for DeployProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
