//! Per-frame outcomes and the run summary.

use crate::camera::CameraParams;
use crate::events::StatusLevel;

use std::path::PathBuf;
use std::time::Duration;

/// Final state of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub index: u64,
    /// `Success`, `Warning` (output written, but something went wrong) or `Error`.
    pub level: StatusLevel,
    pub message: String,
    pub output_path: Option<PathBuf>,
    pub gaussian_count: Option<usize>,
}

impl FrameOutcome {
    pub fn produced_output(&self) -> bool {
        self.output_path.is_some()
    }
}

/// Result of one run over a frame interval.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub video_name: String,
    pub session_dir: PathBuf,
    pub camera: CameraParams,
    /// Requested closed interval.
    pub first_frame: u64,
    pub last_frame: u64,
    /// Outcomes in processing (ascending index) order.
    pub frames: Vec<FrameOutcome>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    fn count(&self, level: StatusLevel) -> usize {
        self.frames.iter().filter(|f| f.level == level).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(StatusLevel::Success)
    }

    pub fn warnings(&self) -> usize {
        self.count(StatusLevel::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count(StatusLevel::Error)
    }

    /// A run succeeds if at least one frame produced output.
    pub fn is_success(&self) -> bool {
        self.frames.iter().any(FrameOutcome::produced_output)
    }

    /// Paths of every produced output file, in index order.
    pub fn output_files(&self) -> Vec<PathBuf> {
        self.frames.iter().filter_map(|f| f.output_path.clone()).collect()
    }

    /// Human-readable counts, e.g. "2 succeeded, 1 error".
    pub fn status_line(&self) -> String {
        let mut line = format!("{} succeeded", self.succeeded());
        let warnings = self.warnings();
        if warnings > 0 {
            line.push_str(&format!(", {} {}", warnings, plural(warnings, "warning")));
        }
        let errors = self.errors();
        if errors > 0 {
            line.push_str(&format!(", {} {}", errors, plural(errors, "error")));
        }
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FocalSource;

    fn outcome(index: u64, level: StatusLevel) -> FrameOutcome {
        let produced = level != StatusLevel::Error;
        FrameOutcome {
            index,
            level,
            message: String::new(),
            output_path: produced.then(|| PathBuf::from(format!("frame_{index:06}.ply"))),
            gaussian_count: produced.then_some(10),
        }
    }

    fn summary(frames: Vec<FrameOutcome>) -> RunSummary {
        RunSummary {
            video_name: "walk".to_string(),
            session_dir: PathBuf::from("/out/walk/20250101_000000"),
            camera: CameraParams {
                focal_length_px: 1000.0,
                width: 1920,
                height: 1080,
                source: FocalSource::Manual,
            },
            first_frame: 2,
            last_frame: 4,
            frames,
            cancelled: false,
            elapsed: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_status_line() {
        let s = summary(vec![
            outcome(2, StatusLevel::Success),
            outcome(3, StatusLevel::Error),
            outcome(4, StatusLevel::Success),
        ]);
        assert_eq!(s.status_line(), "2 succeeded, 1 error");
        assert!(s.is_success());
        assert_eq!(s.output_files().len(), 2);

        let s = summary(vec![
            outcome(2, StatusLevel::Warning),
            outcome(3, StatusLevel::Warning),
            outcome(4, StatusLevel::Error),
            outcome(5, StatusLevel::Error),
        ]);
        assert_eq!(s.status_line(), "0 succeeded, 2 warnings, 2 errors");
        assert!(s.is_success());
    }

    #[test]
    fn test_all_failed_is_not_success() {
        let s = summary(vec![outcome(2, StatusLevel::Error)]);
        assert!(!s.is_success());
        assert_eq!(s.status_line(), "0 succeeded, 1 error");
    }
}
