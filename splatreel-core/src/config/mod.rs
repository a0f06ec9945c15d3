//! Configuration structures and constants for the splatreel-core library.
//!
//! A `CoreConfig` is built once per run, from persisted `RunSettings` plus
//! whatever the caller overrides, and passed explicitly to the orchestrator.

mod builder;

use crate::error::{CoreError, CoreResult};
use crate::inference::Device;

use std::path::PathBuf;

pub use builder::CoreConfigBuilder;

// Default constants

/// Assumed horizontal field of view used to estimate the focal length.
pub const DEFAULT_FOV_DEGREES: f64 = crate::camera::DEFAULT_FOV_DEGREES;

/// Side length of the square the predictor resizes frames to.
pub const DEFAULT_PROCESSING_RESOLUTION: u32 = 1536;

/// The predictor encodes images in patches of this size; resolutions must be multiples of it.
pub const PROCESSING_RESOLUTION_STEP: u32 = 384;

/// Smallest accepted processing resolution.
pub const MIN_PROCESSING_RESOLUTION: u32 = 768;

/// Largest accepted processing resolution.
pub const MAX_PROCESSING_RESOLUTION: u32 = 6144;

/// Low-pass filter epsilon applied to the predicted Gaussians.
/// Lower values keep more fine detail.
pub const DEFAULT_LOW_PASS_FILTER_EPS: f64 = 0.001;

/// Attribution string embedded in every output file name.
pub const DEFAULT_ATTRIBUTION: &str = "Shramko_4DGS_apple-Sharp_Generator";

/// Format tag appended to converted output file names.
pub const DEFAULT_FORMAT_TAG: &str = "standard";

/// Closed interval of frame indices to process.
///
/// `end == None` means "through the last frame of the video".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl FrameRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Resolves the range against the video's frame count.
    ///
    /// An open end becomes the last frame. Both ends must name frames that
    /// exist, so a resolved interval never has more than `frame_count` frames.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - empty video, start past the last frame, end past
    ///   the last frame, or end before start
    pub fn resolve(&self, frame_count: u64) -> CoreResult<(u64, u64)> {
        let Some(last_index) = frame_count.checked_sub(1) else {
            return Err(CoreError::InvalidInput("the video has no frames".to_string()));
        };
        if self.start > last_index {
            return Err(CoreError::InvalidInput(format!(
                "start frame {} is beyond the last frame ({} frames)",
                self.start, frame_count
            )));
        }
        let end = match self.end {
            Some(end) if end > last_index => {
                return Err(CoreError::InvalidInput(format!(
                    "end frame {end} exceeds the last frame ({frame_count} frames)"
                )));
            }
            Some(end) => end,
            None => last_index,
        };
        if end < self.start {
            return Err(CoreError::InvalidInput(format!(
                "frame range end ({end}) is before start ({})",
                self.start
            )));
        }
        Ok((self.start, end))
    }
}

/// Main configuration structure for the splatreel-core library.
///
/// Holds everything one run needs: the input video, where output goes, the
/// frame interval, camera and predictor parameters, and output naming.
///
/// # Examples
///
/// ```rust
/// use splatreel_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .video_path(PathBuf::from("/videos/walk.mp4"))
///     .output_dir(PathBuf::from("/splats"))
///     .frame_range(2, Some(4))
///     .build()
///     .unwrap();
/// assert_eq!(config.frame_range.start, 2);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Video file to read frames from
    pub video_path: PathBuf,

    /// Base directory; each run writes into `output_dir/<video>/<timestamp>/`
    pub output_dir: PathBuf,

    pub frame_range: FrameRange,

    /// Manual focal length in pixels. When set it is used as-is for every frame.
    pub focal_length_override: Option<f64>,

    /// Assumed horizontal FOV for focal length estimation
    pub fov_degrees: f64,

    pub device: Device,

    /// Internal processing resolution passed to the predictor
    pub processing_resolution: u32,

    pub low_pass_filter_eps: f64,

    /// Convert each native PLY to a standard 3DGS PLY and delete the native file.
    /// When false the native file is kept as the frame's output.
    pub convert_to_standard: bool,

    pub attribution: String,
    pub format_tag: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::new(),
            output_dir: PathBuf::from("."),
            frame_range: FrameRange::default(),
            focal_length_override: None,
            fov_degrees: DEFAULT_FOV_DEGREES,
            device: Device::default(),
            processing_resolution: DEFAULT_PROCESSING_RESOLUTION,
            low_pass_filter_eps: DEFAULT_LOW_PASS_FILTER_EPS,
            convert_to_standard: true,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            format_tag: DEFAULT_FORMAT_TAG.to_string(),
        }
    }
}

impl CoreConfig {
    /// Checks parameter ranges. Called by the builder; call it again after
    /// mutating fields directly.
    pub fn validate(&self) -> CoreResult<()> {
        if self.video_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput("video path is required".to_string()));
        }
        if let Some(end) = self.frame_range.end {
            if end < self.frame_range.start {
                return Err(CoreError::InvalidInput(format!(
                    "frame range end ({end}) is before start ({})",
                    self.frame_range.start
                )));
            }
        }
        if let Some(focal) = self.focal_length_override {
            if !(focal.is_finite() && focal > 0.0) {
                return Err(CoreError::InvalidInput(format!(
                    "focal length override must be positive, got {focal}"
                )));
            }
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(CoreError::InvalidInput(format!(
                "field of view must be between 0 and 180 degrees, got {}",
                self.fov_degrees
            )));
        }
        if self.processing_resolution % PROCESSING_RESOLUTION_STEP != 0
            || !(MIN_PROCESSING_RESOLUTION..=MAX_PROCESSING_RESOLUTION).contains(&self.processing_resolution)
        {
            return Err(CoreError::InvalidInput(format!(
                "processing resolution must be a multiple of {PROCESSING_RESOLUTION_STEP} in \
                 {MIN_PROCESSING_RESOLUTION}..={MAX_PROCESSING_RESOLUTION}, got {}",
                self.processing_resolution
            )));
        }
        if !(self.low_pass_filter_eps.is_finite() && self.low_pass_filter_eps > 0.0) {
            return Err(CoreError::InvalidInput(format!(
                "low-pass filter epsilon must be positive, got {}",
                self.low_pass_filter_eps
            )));
        }
        for (name, value) in [("attribution", &self.attribution), ("format tag", &self.format_tag)] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(CoreError::InvalidInput(format!(
                    "{name} must be a non-empty file name fragment, got '{value}'"
                )));
            }
        }
        Ok(())
    }
}

/// Rounds `value` to the nearest accepted processing resolution.
pub fn normalize_processing_resolution(value: u32) -> u32 {
    let step = PROCESSING_RESOLUTION_STEP;
    let value = value.min(MAX_PROCESSING_RESOLUTION);
    let rounded = ((value + step / 2) / step) * step;
    rounded.clamp(MIN_PROCESSING_RESOLUTION, MAX_PROCESSING_RESOLUTION)
}
