// ============================================================================
// splatreel-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent API for creating CoreConfig instances. Every field starts from the
// CoreConfig default; `build()` validates the result.
//
// KEY COMPONENTS:
// - CoreConfigBuilder: Builder struct for creating CoreConfig instances
// - from_settings: Seeds a builder from persisted RunSettings
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{CoreConfig, FrameRange};
use crate::error::CoreResult;
use crate::inference::Device;
use crate::settings::RunSettings;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use splatreel_core::config::CoreConfigBuilder;
/// use splatreel_core::inference::Device;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .video_path(PathBuf::from("/videos/walk.mp4"))
///     .output_dir(PathBuf::from("/splats"))
///     .frame_range(0, Some(9))
///     .focal_length_override(Some(1400.0))
///     .device(Device::Cpu)
///     .processing_resolution(1920)
///     .build()
///     .unwrap();
/// assert_eq!(config.processing_resolution, 1920);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from persisted settings.
    ///
    /// Paths in the settings (last video, last output directory) are used
    /// only as fallbacks; callers normally set them explicitly afterwards.
    pub fn from_settings(settings: &RunSettings) -> Self {
        let mut builder = Self::new()
            .frame_range(settings.start_frame, settings.end_frame)
            .focal_length_override(settings.focal_length_override)
            .fov_degrees(settings.fov_degrees)
            .device(settings.device)
            .processing_resolution(settings.processing_resolution)
            .low_pass_filter_eps(settings.low_pass_filter_eps)
            .convert_to_standard(settings.auto_convert_to_standard);

        if let Some(video) = &settings.last_video_path {
            builder = builder.video_path(video.clone());
        }
        if let Some(output) = &settings.last_output_dir {
            builder = builder.output_dir(output.clone());
        }
        builder
    }

    /// Sets the input video.
    pub fn video_path(mut self, video_path: PathBuf) -> Self {
        self.config.video_path = video_path;
        self
    }

    /// Sets the base output directory.
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output_dir = output_dir;
        self
    }

    /// Sets the closed frame interval. `end == None` runs to the last frame.
    pub fn frame_range(mut self, start: u64, end: Option<u64>) -> Self {
        self.config.frame_range = FrameRange::new(start, end);
        self
    }

    pub fn focal_length_override(mut self, focal_px: Option<f64>) -> Self {
        self.config.focal_length_override = focal_px;
        self
    }

    pub fn fov_degrees(mut self, fov_degrees: f64) -> Self {
        self.config.fov_degrees = fov_degrees;
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.config.device = device;
        self
    }

    pub fn processing_resolution(mut self, resolution: u32) -> Self {
        self.config.processing_resolution = resolution;
        self
    }

    pub fn low_pass_filter_eps(mut self, eps: f64) -> Self {
        self.config.low_pass_filter_eps = eps;
        self
    }

    /// Sets whether native output is converted to standard 3DGS PLY.
    pub fn convert_to_standard(mut self, convert: bool) -> Self {
        self.config.convert_to_standard = convert;
        self
    }

    pub fn attribution(mut self, attribution: &str) -> Self {
        self.config.attribution = attribution.to_string();
        self
    }

    pub fn format_tag(mut self, format_tag: &str) -> Self {
        self.config.format_tag = format_tag.to_string();
        self
    }

    /// Builds the CoreConfig instance.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if any parameter is out of range
    /// or the video path is missing.
    pub fn build(self) -> CoreResult<CoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_ATTRIBUTION, DEFAULT_PROCESSING_RESOLUTION};
    use crate::error::CoreError;

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfigBuilder::new()
            .video_path(PathBuf::from("a.mp4"))
            .build()
            .unwrap();
        assert_eq!(config.frame_range, FrameRange::new(0, None));
        assert_eq!(config.processing_resolution, DEFAULT_PROCESSING_RESOLUTION);
        assert_eq!(config.attribution, DEFAULT_ATTRIBUTION);
        assert!(config.convert_to_standard);
        assert!(config.focal_length_override.is_none());
    }

    #[test]
    fn test_builder_requires_video() {
        assert!(matches!(CoreConfigBuilder::new().build(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_from_settings_carries_values() {
        let settings = RunSettings {
            device: Device::Cpu,
            processing_resolution: 2304,
            start_frame: 3,
            end_frame: Some(7),
            focal_length_override: Some(900.0),
            auto_convert_to_standard: false,
            last_video_path: Some(PathBuf::from("last.mov")),
            ..RunSettings::default()
        };
        let config = CoreConfigBuilder::from_settings(&settings).build().unwrap();
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.processing_resolution, 2304);
        assert_eq!(config.frame_range, FrameRange::new(3, Some(7)));
        assert_eq!(config.focal_length_override, Some(900.0));
        assert!(!config.convert_to_standard);
        assert_eq!(config.video_path, PathBuf::from("last.mov"));
    }
}
