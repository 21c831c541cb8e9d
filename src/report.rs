use crate::constants::{ERROR_PREFIX, INFO_PREFIX, SIZE_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX};
use crate::progress::create_progress_bar;
use crate::scheduler::{JobFailure, JobResult};
use crate::utils::{calculate_compression_ratio, format_file_size};
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Totals of one finished batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Sum of per-job durations.
    pub total_duration: Duration,
    pub wall_time: Duration,
    pub workers: usize,
    pub worker_ids: BTreeSet<usize>,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub failures: Vec<(PathBuf, JobFailure)>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.successful + self.failed
    }

    /// Mean duration over every completed job, failures included.
    pub fn average_duration(&self) -> Option<Duration> {
        match self.completed() {
            0 => None,
            n => Some(self.total_duration / n as u32),
        }
    }

    pub fn print_summary(&self) {
        let average = self
            .average_duration()
            .map(|d| format!("{:.2?}", d))
            .unwrap_or_else(|| "n/a".to_string());

        println!("\n{} Batch Compression Summary:", SIZE_PREFIX);
        println!("  {} Successful: {}", SUCCESS_PREFIX, self.successful);
        println!("  {} Failed: {}", ERROR_PREFIX, self.failed);
        println!("  {} Skipped: {}", INFO_PREFIX, self.skipped);
        println!("  ⚙️  Workers: {}", self.workers);
        println!("  ⏱️  Total time: {:.2?}", self.wall_time);
        println!("  ⏱️  Total processing time: {:.2?}", self.total_duration);
        println!("  ⚡ Average time per file: {}", average);

        if self.successful > 0 {
            println!(
                "  {} Total size: {} -> {} ({:.1}%)",
                SIZE_PREFIX,
                format_file_size(self.bytes_before),
                format_file_size(self.bytes_after),
                calculate_compression_ratio(self.bytes_before, self.bytes_after)
            );
        }

        if !self.failures.is_empty() {
            println!("\n{}  Failed files:", WARNING_PREFIX);
            for (path, failure) in &self.failures {
                println!("  {} {}: {}", ERROR_PREFIX, path.display(), failure);
            }
        }
    }
}

/// One status line for a finished job.
pub fn format_result_line(result: &JobResult) -> String {
    match &result.error {
        None => format!(
            "{} {} -> {} ({:.2?})",
            SUCCESS_PREFIX,
            result.job.input_path.display(),
            result.job.output_path.display(),
            result.duration
        ),
        Some(failure) => format!(
            "{} {} -> FAILED: {}",
            ERROR_PREFIX,
            result.job.input_path.display(),
            failure
        ),
    }
}

/// Folds the result stream into a `BatchReport`, echoing each result as it
/// arrives.
pub struct BatchReporter {
    progress: ProgressBar,
    echo: bool,
    report: BatchReport,
}

impl BatchReporter {
    pub fn new(progress: ProgressBar, echo: bool) -> Self {
        Self {
            progress,
            echo,
            report: BatchReport::default(),
        }
    }

    /// Terminal reporter with a live progress bar.
    pub fn interactive() -> Self {
        Self::new(create_progress_bar(0), true)
    }

    /// Reporter that draws and prints nothing.
    pub fn hidden() -> Self {
        Self::new(ProgressBar::hidden(), false)
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.report.skipped = skipped;
        self
    }

    pub fn start(&mut self, total: usize) {
        self.progress.set_length(total as u64);
        self.progress.set_position(0);
    }

    pub fn record(&mut self, result: JobResult) {
        if self.echo {
            let line = format_result_line(&result);
            self.progress.suspend(|| println!("{}", line));
        }

        let report = &mut self.report;
        report.total_duration += result.duration;
        report.worker_ids.insert(result.worker);
        match result.error {
            None => {
                report.successful += 1;
                if let Some((before, after)) = result.sizes {
                    report.bytes_before += before;
                    report.bytes_after += after;
                }
            }
            Some(failure) => {
                report.failed += 1;
                report.failures.push((result.job.input_path, failure));
            }
        }

        self.progress.inc(1);
        self.progress
            .set_message(format!("{} ok, {} failed", report.successful, report.failed));
    }

    pub fn finish(mut self, workers: usize, wall_time: Duration) -> BatchReport {
        self.progress
            .finish_with_message(format!("{} Batch compression complete", SUCCESS_PREFIX));
        self.report.workers = workers;
        self.report.wall_time = wall_time;
        self.report
    }
}
