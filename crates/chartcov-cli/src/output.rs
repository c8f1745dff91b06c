//! Output formatting and progress reporting

use chartcov::{CoverageStatus, CoverageSummary, ScanNote};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for coverage runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar across runs
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message("Done");
        }
    }

    /// Drop the progress bar without a completion message
    pub fn abandon(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        self.emit(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.emit(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.emit(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.emit(&format!("{prefix} {message}"));
    }

    /// Warn about every scanner tolerance note
    pub fn scan_notes(&self, notes: &[ScanNote]) {
        for note in notes {
            self.warning(&note_line(note));
        }
    }

    /// Print the one-line coverage summary
    pub fn coverage_summary(&self, summary: &CoverageSummary) {
        if self.quiet {
            return;
        }

        self.emit(&summary_line(summary, self.use_color));
    }

    fn emit(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.suspend(|| {
                let _ = self.term.write_line(line);
            }),
            None => {
                let _ = self.term.write_line(line);
            }
        }
    }
}

/// `file:line: message` for a scanner note
#[must_use]
pub fn note_line(note: &ScanNote) -> String {
    format!("{}:{}: {}", note.file, note.line, note.message)
}

/// Status line printed when a run aborts part way
#[must_use]
pub fn abort_line(completed: usize, total: usize) -> String {
    format!("Coverage run aborted after {completed} of {total} run(s); no report written")
}

/// One-line coverage summary, colored by status band
#[must_use]
pub fn summary_line(summary: &CoverageSummary, use_color: bool) -> String {
    let (Some(percent), Some(status)) = (summary.coverage_percent, summary.status()) else {
        return "No branches found".to_string();
    };

    let line = format!(
        "{:.2}% branch coverage ({}/{} branches)",
        percent, summary.covered_branches, summary.total_branches
    );

    if !use_color {
        return line;
    }

    let styled = match status {
        CoverageStatus::Full => Style::new().green().bold(),
        CoverageStatus::Partial => Style::new().yellow().bold(),
        CoverageStatus::Low => Style::new().red().bold(),
    };
    styled.apply_to(line).to_string()
}
