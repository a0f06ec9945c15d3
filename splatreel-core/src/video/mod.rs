//! Frame access for input videos.
//!
//! A [`FrameSource`] opens a container into a [`VideoHandle`] and decodes
//! individual frames by index, in any order. The production source is
//! [`FfmpegFrameSource`]; tests use `mocks::FakeFrameSource`.

mod ffmpeg_source;

pub use ffmpeg_source::FfmpegFrameSource;

use crate::error::{CoreError, CoreResult};
use crate::utils::get_file_stem_safe;

use image::RgbImage;
use serde::Serialize;

use std::path::{Path, PathBuf};

/// Properties of the video stream being processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoInfo {
    pub frame_count: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// An opened video. Owned by the orchestrator for the length of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoHandle {
    pub path: PathBuf,
    pub info: VideoInfo,
}

impl VideoHandle {
    pub fn new(path: impl Into<PathBuf>, info: VideoInfo) -> Self {
        Self {
            path: path.into(),
            info,
        }
    }

    /// Returns `FrameOutOfRange` unless `index < frame_count`.
    pub fn check_index(&self, index: u64) -> CoreResult<()> {
        if index >= self.info.frame_count {
            return Err(CoreError::FrameOutOfRange {
                index,
                frame_count: self.info.frame_count,
            });
        }
        Ok(())
    }

    /// File stem of the video, used to namespace output directories.
    pub fn name(&self) -> String {
        get_file_stem_safe(&self.path).unwrap_or_else(|_| "video".to_string())
    }
}

/// One decoded frame: tightly packed RGB24 pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Wraps a pixel buffer, checking its length against the dimensions.
    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> CoreResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CoreError::FrameDecode {
                index,
                reason: format!(
                    "expected {expected} bytes for {width}x{height} RGB, got {}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            index,
            width,
            height,
            data,
        })
    }

    pub fn to_image(&self) -> CoreResult<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CoreError::FrameDecode {
                index: self.index,
                reason: "pixel buffer does not match frame dimensions".to_string(),
            }
        })
    }

    /// Writes the frame as a PNG image.
    pub fn save_png(&self, path: &Path) -> CoreResult<()> {
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| CoreError::InferenceFailure(format!(
                "cannot write frame {} to {}: {}",
                self.index,
                path.display(),
                e
            )))
    }
}

/// Opens videos and decodes frames by index.
pub trait FrameSource {
    /// Opens `path`.
    ///
    /// # Errors
    ///
    /// * `InputNotFound` - `path` does not exist
    /// * `InputUnreadable` - the container cannot be parsed or has no video stream
    fn open(&self, path: &Path) -> CoreResult<VideoHandle>;

    /// Decodes frame `index`.
    ///
    /// # Errors
    ///
    /// * `FrameOutOfRange` - `index >= handle.info.frame_count`
    /// * `FrameDecode` - the decoder produced no usable frame
    fn frame_at(&self, handle: &VideoHandle, index: u64) -> CoreResult<Frame>;
}
