//! Forwards events to the `log` facade so every status reaches the log file.

use super::{Event, EventHandler, StatusLevel};
use crate::camera::FocalSource;
use crate::utils::format_duration;

use log::{Level, log};

/// Log target of every record this handler emits, so logging setup can route
/// the event stream separately from other log output.
pub const EVENT_LOG_TARGET: &str = "splatreel::events";

#[derive(Debug, Default)]
pub struct LogEventHandler;

impl EventHandler for LogEventHandler {
    fn handle(&self, event: &Event) {
        let (level, message) = match event {
            Event::RunStarted {
                video_path,
                video,
                first_frame,
                last_frame,
            } => (
                Level::Info,
                format!(
                    "Processing {} ({}x{}, {:.3} fps, {} frames), frames {}..={}",
                    video_path.display(),
                    video.width,
                    video.height,
                    video.fps,
                    video.frame_count,
                    first_frame,
                    last_frame
                ),
            ),
            Event::CameraResolved { camera } => match camera.source {
                FocalSource::Estimated { fov_degrees } => (
                    Level::Info,
                    format!(
                        "Focal length {:.2}px (estimated from {}px width at {}° FOV)",
                        camera.focal_length_px, camera.width, fov_degrees
                    ),
                ),
                FocalSource::Manual => (
                    Level::Info,
                    format!("Focal length {:.2}px (manual)", camera.focal_length_px),
                ),
            },
            Event::ModelReady => (Level::Info, "Model ready".to_string()),
            Event::SessionCreated { session_dir } => {
                (Level::Info, format!("Writing to {}", session_dir.display()))
            }
            Event::FrameStatus {
                index, level, message, ..
            } => {
                let level = match level {
                    StatusLevel::Info | StatusLevel::Success => Level::Info,
                    StatusLevel::Warning => Level::Warn,
                    StatusLevel::Error => Level::Error,
                };
                (level, format!("[frame {index}] {message}"))
            }
            Event::Progress { completed, total } => (Level::Debug, format!("Progress {completed}/{total}")),
            Event::RunFinished {
                succeeded,
                warnings,
                errors,
                cancelled,
                elapsed,
            } => (
                Level::Info,
                format!(
                    "Run {} in {}: {} succeeded, {} warnings, {} errors",
                    if *cancelled { "cancelled" } else { "finished" },
                    format_duration(elapsed.as_secs_f64()),
                    succeeded,
                    warnings,
                    errors
                ),
            ),
            Event::RunAborted { kind, message } => (Level::Error, format!("Run aborted ({kind}): {message}")),
        };

        log!(target: EVENT_LOG_TARGET, level, "{}", message);
    }
}
