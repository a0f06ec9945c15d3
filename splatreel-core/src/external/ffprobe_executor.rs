//! FFprobe integration for video stream metadata.
//!
//! Reads the first video stream's dimensions, frame rate and frame count.
//! `nb_frames` is preferred; containers that do not record it (mkv, webm)
//! fall back to `duration * fps`.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::utils::parse_frame_rate;
use crate::video::VideoInfo;
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Trait for reading video metadata, so tests can substitute canned answers.
pub trait FfprobeExecutor {
    /// Returns metadata of the first video stream in `input_path`.
    fn get_video_info(&self, input_path: &Path) -> CoreResult<VideoInfo>;
}

/// Production implementation backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn get_video_info(&self, input_path: &Path) -> CoreResult<VideoInfo> {
        log::debug!("Running ffprobe (via crate) for video info on: {}", input_path.display());

        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!("ffprobe failed for {}: {:?}", input_path.display(), err);
            map_ffprobe_error(err, input_path)
        })?;

        let unreadable = |reason: &str| CoreError::InputUnreadable {
            path: input_path.to_path_buf(),
            reason: reason.to_string(),
        };

        let stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| unreadable("no video stream"))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
            _ => return Err(unreadable("video stream has no valid dimensions")),
        };

        let fps = parse_frame_rate(&stream.r_frame_rate)
            .or_else(|| parse_frame_rate(&stream.avg_frame_rate))
            .ok_or_else(|| unreadable("video stream has no frame rate"))?;

        let duration_secs = stream
            .duration
            .as_deref()
            .or(metadata.format.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);

        let frame_count = match stream.nb_frames.as_deref().and_then(|n| n.parse::<u64>().ok()) {
            Some(count) if count > 0 => count,
            _ => {
                let estimated = (duration_secs * fps).round() as u64;
                log::debug!(
                    "nb_frames unavailable for {}, estimated {} frames from duration",
                    input_path.display(),
                    estimated
                );
                estimated
            }
        };
        if frame_count == 0 {
            return Err(unreadable("video stream has no frames"));
        }

        Ok(VideoInfo {
            frame_count,
            fps,
            width,
            height,
            duration_secs,
        })
    }
}

fn map_ffprobe_error(err: FfProbeError, input_path: &Path) -> CoreError {
    match err {
        FfProbeError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            CoreError::DependencyNotFound("ffprobe".to_string())
        }
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                command_failed_error("ffprobe", output.status, stderr)
            } else {
                CoreError::InputUnreadable {
                    path: input_path.to_path_buf(),
                    reason: stderr,
                }
            }
        }
        FfProbeError::Deserialize(err) => CoreError::InputUnreadable {
            path: input_path.to_path_buf(),
            reason: format!("unexpected ffprobe output: {err}"),
        },
        _ => CoreError::InputUnreadable {
            path: input_path.to_path_buf(),
            reason: format!("unknown ffprobe error: {err:?}"),
        },
    }
}
