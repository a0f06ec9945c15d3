// ============================================================================
// splatreel-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Terminal Rendering of the Run Event Stream
//
// The processing thread publishes events into a bounded channel; this module
// consumes them on the UI thread and renders an indicatif progress bar plus
// one styled line per frame outcome.
//
// KEY COMPONENTS:
// - TerminalProgress: Holds the progress bar and renders single events
// - render_events: Drains a receiver until the processing side hangs up
//
// AI-ASSISTANT-INFO: indicatif progress bar driven by core run events

// ---- Internal crate imports ----
use crate::output::status_line;

// ---- External crate imports ----
use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use splatreel_core::{Event, FocalSource, StatusLevel, format_duration};

// ---- Standard library imports ----
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} frames ({eta})";

/// Renders run events on the terminal.
pub struct TerminalProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            bar: None,
            hidden: false,
        }
    }

    /// Prints status lines but never draws the bar.
    pub fn hidden() -> Self {
        Self {
            bar: None,
            hidden: true,
        }
    }

    /// Draws the bar only when stderr is a terminal.
    pub fn for_stderr() -> Self {
        if Term::stderr().is_term() { Self::new() } else { Self::hidden() }
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ => println!("{line}"),
        }
    }

    pub fn handle(&mut self, event: &Event) {
        match event {
            Event::RunStarted {
                video_path,
                video,
                first_frame,
                last_frame,
            } => {
                self.println(format!(
                    "Processing {} ({}x{}, {:.3} fps, {} frames)",
                    video_path.display(),
                    video.width,
                    video.height,
                    video.fps,
                    video.frame_count
                ));
                let total = last_frame.saturating_sub(*first_frame).saturating_add(1);
                let bar = ProgressBar::new(total);
                if self.hidden {
                    bar.set_draw_target(ProgressDrawTarget::hidden());
                }
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar.enable_steady_tick(Duration::from_millis(120));
                self.bar = Some(bar);
            }
            Event::CameraResolved { camera } => {
                let source = match camera.source {
                    FocalSource::Estimated { fov_degrees } => format!("estimated, {fov_degrees}° FOV"),
                    FocalSource::Manual => "manual".to_string(),
                };
                self.println(format!("Focal length: {:.2}px ({})", camera.focal_length_px, source));
            }
            Event::ModelReady => self.println(status_line(StatusLevel::Info, "Model ready")),
            Event::SessionCreated { session_dir } => {
                self.println(format!("Output: {}", session_dir.display()));
            }
            Event::FrameStatus {
                index, level, message, ..
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("frame {index}"));
                }
                // Per-frame "processing" notices only feed the bar.
                if *level != StatusLevel::Info {
                    self.println(status_line(*level, &format!("frame {index}: {message}")));
                }
            }
            Event::Progress { completed, total } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(*total);
                    bar.set_position(*completed);
                }
            }
            Event::RunFinished {
                succeeded,
                warnings,
                errors,
                cancelled,
                elapsed,
            } => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                let (level, line) = finish_line(*succeeded, *warnings, *errors, *cancelled, *elapsed);
                self.println(status_line(level, &line));
            }
            Event::RunAborted { message, .. } => {
                if let Some(bar) = self.bar.take() {
                    bar.abandon();
                }
                self.println(status_line(StatusLevel::Error, &format!("Run aborted: {message}")));
            }
        }
    }

    /// Drains `events` until every sender is dropped.
    pub fn render_events<I: IntoIterator<Item = Event>>(mut self, events: I) {
        for event in events {
            self.handle(&event);
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Level and text of the end-of-run line.
fn finish_line(succeeded: usize, warnings: usize, errors: usize, cancelled: bool, elapsed: Duration) -> (StatusLevel, String) {
    let level = if succeeded + warnings == 0 {
        StatusLevel::Error
    } else if warnings + errors > 0 || cancelled {
        StatusLevel::Warning
    } else {
        StatusLevel::Success
    };
    let line = format!(
        "Finished in {}: {} succeeded, {} warnings, {} errors{}",
        format_duration(elapsed.as_secs_f64()),
        succeeded,
        warnings,
        errors,
        if cancelled { " (cancelled)" } else { "" }
    );
    (level, line)
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatreel_core::VideoInfo;
    use std::path::PathBuf;

    #[test]
    fn test_bar_tracks_progress_events() {
        let mut progress = TerminalProgress::hidden();
        progress.handle(&Event::RunStarted {
            video_path: PathBuf::from("walk.mp4"),
            video: VideoInfo {
                frame_count: 10,
                fps: 30.0,
                width: 64,
                height: 48,
                duration_secs: 0.33,
            },
            first_frame: 2,
            last_frame: 4,
        });
        progress.handle(&Event::Progress { completed: 2, total: 3 });

        let bar = progress.bar.as_ref().unwrap();
        assert!(bar.is_hidden());
        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 2);

        progress.handle(&Event::RunAborted {
            kind: "io",
            message: "disk full".to_string(),
        });
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_cancelled_run_finishes_with_warning() {
        let (level, line) = finish_line(2, 0, 0, true, Duration::from_secs(5));
        assert_eq!(level, StatusLevel::Warning);
        assert!(line.ends_with("2 succeeded, 0 warnings, 0 errors (cancelled)"));

        let (level, _) = finish_line(0, 0, 3, false, Duration::from_secs(1));
        assert_eq!(level, StatusLevel::Error);
        let (level, line) = finish_line(3, 0, 0, false, Duration::from_secs(1));
        assert_eq!(level, StatusLevel::Success);
        assert!(!line.contains("cancelled"));
    }
}
