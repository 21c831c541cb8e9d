//! Progress reporting consumed by the processor strategies.

use crate::constants::{PROGRESS_BAR_TEMPLATE, PROGRESS_TICK};
use indicatif::{ProgressBar, ProgressStyle};

/// Sink for the completed-units / stage-description pair a strategy emits.
pub trait ProgressTracker {
    fn add(&mut self, units: u64);
    fn describe(&mut self, description: &str);
}

/// Single-file mode draws directly onto an indicatif bar.
impl ProgressTracker for ProgressBar {
    fn add(&mut self, units: u64) {
        self.inc(units);
    }

    fn describe(&mut self, description: &str) {
        self.set_message(description.to_string());
    }
}

/// Silent accumulator used per job in batch mode so that concurrent jobs
/// never draw over each other.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub units_completed: u64,
    pub current_description: String,
}

impl ProgressTracker for JobProgress {
    fn add(&mut self, units: u64) {
        self.units_completed += units;
    }

    fn describe(&mut self, description: &str) {
        self.current_description.clear();
        self.current_description.push_str(description);
    }
}

pub fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.enable_steady_tick(PROGRESS_TICK);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_progress_accumulates() {
        let mut progress = JobProgress::default();
        progress.describe("Loading image...");
        progress.add(50);
        progress.describe("Encoding...");
        progress.add(40);

        assert_eq!(progress.units_completed, 90);
        assert_eq!(progress.current_description, "Encoding...");
    }

    #[test]
    fn test_progress_bar_tracker() {
        let mut pb = ProgressBar::hidden();
        pb.set_length(100);
        ProgressTracker::add(&mut pb, 60);
        ProgressTracker::describe(&mut pb, "halfway");
        assert_eq!(pb.position(), 60);
        assert_eq!(pb.message(), "halfway");
    }
}
