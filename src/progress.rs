//! Load progress to status text.
//!
//! A load moves through `Transferring -> Finalizing -> Ready`, or ends in
//! `Failed`. The reporter only moves forward: progress events that arrive
//! after the transfer completed are ignored.

use std::fmt;

use crate::loader::LoadError;

const BYTES_PER_MB: f64 = 1_000_000.0;

/// Bytes received so far for the model transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Bytes received.
    pub loaded: u64,
    /// Total bytes expected; 0 when the length is unknown.
    pub total: u64,
}

impl LoadProgress {
    /// Progress of `loaded` out of `total` bytes.
    #[must_use]
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// Rounded percentage, or `None` when the total is unknown.
    #[must_use]
    pub fn percent(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        let ratio = self.loaded as f64 / self.total as f64;
        Some((ratio * 100.0).round() as u32)
    }

    /// Whether every expected byte has arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.loaded >= self.total
    }
}

/// Megabytes with two decimals, as shown in the status label.
#[must_use]
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MB)
}

/// Where a model load stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Bytes are arriving.
    Transferring(LoadProgress),
    /// All bytes arrived; parsing and uploading.
    Finalizing,
    /// Model is in the scene.
    Ready,
    /// Transfer or parse failed; holds the error message.
    Failed(String),
}

impl LoadStatus {
    /// Whether the load has ended, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Transferring(p) => match p.percent() {
                Some(pct) => write!(
                    f,
                    "Loading 3D model: {} of {} ({pct}%)",
                    format_megabytes(p.loaded),
                    format_megabytes(p.total),
                ),
                None => write!(
                    f,
                    "Loading 3D model: {} MB",
                    format_megabytes(p.loaded)
                ),
            },
            Self::Finalizing => f.write_str("Rendering 3D model..."),
            Self::Ready => f.write_str("Done loading 3D Model!"),
            Self::Failed(msg) => f.write_str(msg),
        }
    }
}

/// Sink for status text (DOM label, window title, log).
pub trait StatusLabel {
    /// Replace the visible text.
    fn set_text(&mut self, text: &str);
}

/// Tracks load status and pushes each change to a [`StatusLabel`].
#[derive(Debug, Default)]
pub struct ProgressReporter {
    status: LoadStatus,
}

impl ProgressReporter {
    /// Reporter in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Record a progress tick. A tick that completes the transfer moves
    /// straight to `Finalizing`.
    pub fn report(&mut self, progress: LoadProgress) -> &LoadStatus {
        if matches!(self.status, LoadStatus::Idle | LoadStatus::Transferring(_)) {
            self.status = if progress.is_complete() {
                LoadStatus::Finalizing
            } else {
                LoadStatus::Transferring(progress)
            };
        }
        &self.status
    }

    /// The model is in the scene.
    pub fn finish(&mut self) -> &LoadStatus {
        if !self.status.is_terminal() {
            self.status = LoadStatus::Ready;
        }
        &self.status
    }

    /// The load failed.
    pub fn fail(&mut self, error: &LoadError) -> &LoadStatus {
        if !self.status.is_terminal() {
            self.status = LoadStatus::Failed(error.to_string());
        }
        &self.status
    }

    /// [`report`](Self::report) and push the resulting text to `label`.
    pub fn report_to(&mut self, progress: LoadProgress, label: &mut impl StatusLabel) {
        let text = self.report(progress).to_string();
        label.set_text(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_way_formats_percent_and_megabytes() {
        let mut reporter = ProgressReporter::new();
        let status = reporter.report(LoadProgress::new(500_000, 1_000_000));
        assert_eq!(
            status,
            &LoadStatus::Transferring(LoadProgress::new(500_000, 1_000_000))
        );
        assert_eq!(LoadProgress::new(500_000, 1_000_000).percent(), Some(50));
        assert_eq!(format_megabytes(500_000), "0.50");
        assert_eq!(format_megabytes(1_000_000), "1.00");
        assert_eq!(status.to_string(), "Loading 3D model: 0.50 of 1.00 (50%)");
    }

    #[test]
    fn complete_transfer_moves_to_finalizing() {
        let mut reporter = ProgressReporter::new();
        let _ = reporter.report(LoadProgress::new(10, 1_000_000));
        let status = reporter.report(LoadProgress::new(1_000_000, 1_000_000));
        assert_eq!(status, &LoadStatus::Finalizing);
        assert_eq!(status.to_string(), "Rendering 3D model...");
        assert_eq!(LoadProgress::new(1_000_000, 1_000_000).percent(), Some(100));
    }

    #[test]
    fn late_ticks_do_not_regress() {
        let mut reporter = ProgressReporter::new();
        let _ = reporter.report(LoadProgress::new(4, 4));
        let _ = reporter.report(LoadProgress::new(2, 4));
        assert_eq!(reporter.status(), &LoadStatus::Finalizing);
        let _ = reporter.finish();
        let _ = reporter.report(LoadProgress::new(1, 4));
        assert_eq!(reporter.status(), &LoadStatus::Ready);
        assert_eq!(reporter.status().to_string(), "Done loading 3D Model!");
    }

    #[test]
    fn unknown_total_shows_bytes_only() {
        let status = LoadStatus::Transferring(LoadProgress::new(2_345_678, 0));
        assert_eq!(status.to_string(), "Loading 3D model: 2.35 MB");
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(LoadProgress::new(1, 3).percent(), Some(33));
        assert_eq!(LoadProgress::new(2, 3).percent(), Some(67));
    }

    #[test]
    fn failure_is_reported_as_text() {
        let mut reporter = ProgressReporter::new();
        let err = LoadError::Transfer("HTTP 404 Not Found".into());
        let text = reporter.fail(&err).to_string();
        assert!(text.contains("404"));
        let _ = reporter.finish();
        assert!(matches!(reporter.status(), LoadStatus::Failed(_)));
    }

    #[test]
    fn report_to_pushes_label_text() {
        struct Recorder(Vec<String>);
        impl StatusLabel for Recorder {
            fn set_text(&mut self, text: &str) {
                self.0.push(text.to_owned());
            }
        }
        let mut label = Recorder(Vec::new());
        let mut reporter = ProgressReporter::new();
        reporter.report_to(LoadProgress::new(250_000, 1_000_000), &mut label);
        reporter.report_to(LoadProgress::new(1_000_000, 1_000_000), &mut label);
        assert_eq!(
            label.0,
            vec![
                "Loading 3D model: 0.25 of 1.00 (25%)".to_owned(),
                "Rendering 3D model...".to_owned(),
            ]
        );
    }
}
