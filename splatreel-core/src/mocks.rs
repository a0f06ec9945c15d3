// splatreel-core/src/mocks.rs

// --- Test doubles for the frame source, predictor and checkpoint fetcher ---

// These stand in for ffmpeg, the model and the network so the orchestrator
// can be exercised end to end without external tools.

// This module is only compiled for unit tests or with the "test-mocks" feature.
#![cfg(any(test, feature = "test-mocks"))]

use crate::camera::CameraParams;
use crate::error::{CoreError, CoreResult};
use crate::inference::{CheckpointFetcher, FetchedBody, GaussianPredictor};
use crate::ply::{
    ElementDef, Gaussian, GaussianSet, PlyData, PlyFormat, PlyHeader, PropertyDef, PropertyKind, PropertyValue,
    Row, Scalar, ScalarType,
};
use crate::processing::CancellationToken;
use crate::video::{Frame, FrameSource, VideoHandle, VideoInfo};

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

// ============================================================================
// FRAME SOURCE
// ============================================================================

/// In-memory video: every frame is a flat RGB buffer filled with `index % 256`.
#[derive(Debug)]
pub struct FakeFrameSource {
    pub info: VideoInfo,
    missing_input: bool,
    fail_decode_at: HashSet<u64>,
    decoded: Mutex<Vec<u64>>,
}

impl FakeFrameSource {
    pub fn new(frame_count: u64, width: u32, height: u32) -> Self {
        Self {
            info: VideoInfo {
                frame_count,
                fps: 30.0,
                width,
                height,
                duration_secs: frame_count as f64 / 30.0,
            },
            missing_input: false,
            fail_decode_at: HashSet::new(),
            decoded: Mutex::new(Vec::new()),
        }
    }

    /// Makes `open` report the input as missing.
    pub fn missing(mut self) -> Self {
        self.missing_input = true;
        self
    }

    /// Makes decoding of `index` fail.
    pub fn fail_decode_at(mut self, index: u64) -> Self {
        self.fail_decode_at.insert(index);
        self
    }

    /// Indices successfully decoded so far, in call order.
    pub fn decoded(&self) -> Vec<u64> {
        self.decoded.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl FrameSource for FakeFrameSource {
    fn open(&self, path: &Path) -> CoreResult<VideoHandle> {
        if self.missing_input {
            return Err(CoreError::InputNotFound(path.to_path_buf()));
        }
        Ok(VideoHandle::new(path, self.info))
    }

    fn frame_at(&self, handle: &VideoHandle, index: u64) -> CoreResult<Frame> {
        handle.check_index(index)?;
        if self.fail_decode_at.contains(&index) {
            return Err(CoreError::FrameDecode {
                index,
                reason: "simulated decoder failure".to_string(),
            });
        }
        if let Ok(mut decoded) = self.decoded.lock() {
            decoded.push(index);
        }
        let len = self.info.width as usize * self.info.height as usize * 3;
        Frame::new(index, self.info.width, self.info.height, vec![(index % 256) as u8; len])
    }
}

// ============================================================================
// PREDICTOR
// ============================================================================

/// Writes a small native PLY per frame instead of running a model.
///
/// The Gaussians depend on the frame index so that outputs of different
/// frames differ.
#[derive(Debug)]
pub struct FakePredictor {
    pub gaussians_per_frame: usize,
    pub format: PlyFormat,
    fail_prepare: bool,
    fail_infer_at: HashSet<u64>,
    cancel_after: Option<(usize, CancellationToken)>,
    prepared: bool,
    calls: Vec<(u64, f64)>,
}

impl Default for FakePredictor {
    fn default() -> Self {
        Self::new(4)
    }
}

impl FakePredictor {
    pub fn new(gaussians_per_frame: usize) -> Self {
        Self {
            gaussians_per_frame,
            format: PlyFormat::BinaryLittleEndian,
            fail_prepare: false,
            fail_infer_at: HashSet::new(),
            cancel_after: None,
            prepared: false,
            calls: Vec::new(),
        }
    }

    /// Native files are written in `format`.
    pub fn with_format(mut self, format: PlyFormat) -> Self {
        self.format = format;
        self
    }

    /// `prepare` fails with `ModelUnavailable`.
    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    /// Inference of `index` fails after writing a partial native file.
    pub fn fail_infer_at(mut self, index: u64) -> Self {
        self.fail_infer_at.insert(index);
        self
    }

    /// Cancels `token` once `frames` inferences have completed.
    pub fn cancel_after(mut self, frames: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((frames, token));
        self
    }

    /// `(frame index, focal length)` of every inference call, in order.
    pub fn calls(&self) -> &[(u64, f64)] {
        &self.calls
    }

    pub fn frame_gaussians(&self, index: u64) -> GaussianSet {
        let gaussians = (0..self.gaussians_per_frame)
            .map(|i| Gaussian {
                position: [index as f32, i as f32, 1.0 + i as f32 * 0.25],
                color_dc: [0.1, 0.2, 0.3],
                opacity: -0.5 + i as f32,
                scale: [-4.0, -4.5, -5.0],
                rotation: [1.0, 0.0, 0.0, 0.0],
            })
            .collect();
        GaussianSet::new(gaussians)
    }
}

impl GaussianPredictor for FakePredictor {
    fn prepare(&mut self) -> CoreResult<()> {
        if self.fail_prepare {
            return Err(CoreError::ModelUnavailable("simulated download failure".to_string()));
        }
        self.prepared = true;
        Ok(())
    }

    fn infer(&mut self, frame: &Frame, camera: &CameraParams, native_path: &Path) -> CoreResult<usize> {
        if !self.prepared {
            return Err(CoreError::InferenceFailure("predictor used before prepare".to_string()));
        }
        self.calls.push((frame.index, camera.focal_length_px));

        if self.fail_infer_at.contains(&frame.index) {
            std::fs::write(native_path, b"ply\nformat binary_little_endian 1.0\n")?;
            return Err(CoreError::InferenceFailure(format!(
                "simulated model failure on frame {}",
                frame.index
            )));
        }

        let gaussians = self.frame_gaussians(frame.index);
        write_native_ply(native_path, &gaussians, self.format, camera)?;

        if let Some((after, token)) = &self.cancel_after {
            if self.calls.len() >= *after {
                token.cancel();
            }
        }
        Ok(gaussians.len())
    }
}

// ============================================================================
// CHECKPOINT FETCHER
// ============================================================================

/// A fetcher for an unreachable host.
#[derive(Debug, Clone, Default)]
pub struct FailingFetcher;

impl CheckpointFetcher for FailingFetcher {
    fn fetch(&self, url: &str, _dest: &mut dyn Write) -> CoreResult<FetchedBody> {
        Err(CoreError::ModelUnavailable(format!("cannot reach {url}")))
    }
}

// ============================================================================
// NATIVE PLY WRITER
// ============================================================================

/// Writes a predictor-style PLY: the `vertex` element followed by the
/// metadata elements the model appends (extrinsics, intrinsics, image size,
/// frame info, disparity range, color space and version).
pub fn write_native_ply(path: &Path, gaussians: &GaussianSet, format: PlyFormat, camera: &CameraParams) -> CoreResult<()> {
    let mut header = PlyHeader::new(format);
    header.comments.push("generated by a SHARP-style predictor".to_string());
    let mut elements = Vec::new();

    header.elements.push(gaussians.vertex_element());
    elements.push(gaussians.vertex_rows());

    let mut identity = [0f32; 16];
    for i in 0..4 {
        identity[i * 5] = 1.0;
    }
    push_float_element(&mut header, &mut elements, "extrinsic", "extrinsic", &identity);

    let f = camera.focal_length_px as f32;
    let intrinsic = [
        f, 0.0, camera.width as f32 / 2.0,
        0.0, f, camera.height as f32 / 2.0,
        0.0, 0.0, 1.0,
    ];
    push_float_element(&mut header, &mut elements, "intrinsic", "intrinsic", &intrinsic);

    let mut image_size = ElementDef::new("image_size", 2);
    image_size.properties.push(PropertyDef::scalar("image_size", ScalarType::UInt));
    header.elements.push(image_size);
    elements.push(vec![
        vec![PropertyValue::Scalar(Scalar::UInt(camera.width))],
        vec![PropertyValue::Scalar(Scalar::UInt(camera.height))],
    ]);

    let mut frame = ElementDef::new("frame", 2);
    frame.properties.push(PropertyDef::scalar("frame", ScalarType::Int));
    header.elements.push(frame);
    elements.push(vec![
        vec![PropertyValue::Scalar(Scalar::Int(1))],
        vec![PropertyValue::Scalar(Scalar::Int(gaussians.len() as i32))],
    ]);

    push_float_element(&mut header, &mut elements, "disparity", "disparity", &[0.05, 2.0]);

    let mut color_space = ElementDef::new("color_space", 1);
    color_space.properties.push(PropertyDef::scalar("color_space", ScalarType::UChar));
    header.elements.push(color_space);
    elements.push(vec![vec![PropertyValue::Scalar(Scalar::UChar(1))]]);

    let mut version = ElementDef::new("version", 1);
    version.properties.push(PropertyDef {
        name: "version".to_string(),
        kind: PropertyKind::List {
            count: ScalarType::UChar,
            item: ScalarType::UChar,
        },
    });
    header.elements.push(version);
    elements.push(vec![vec![PropertyValue::List(vec![
        Scalar::UChar(1),
        Scalar::UChar(5),
        Scalar::UChar(0),
    ])]]);

    PlyData { header, elements }.write_to(path)
}

fn push_float_element(header: &mut PlyHeader, elements: &mut Vec<Vec<Row>>, name: &str, property: &str, values: &[f32]) {
    let mut element = ElementDef::new(name, values.len());
    element.properties.push(PropertyDef::scalar(property, ScalarType::Float));
    header.elements.push(element);
    elements.push(
        values
            .iter()
            .map(|v| vec![PropertyValue::Scalar(Scalar::Float(*v))])
            .collect(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_ply_has_metadata_elements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("native.ply");
        let predictor = FakePredictor::new(3);
        let camera = CameraParams::resolve(64, 48, None, 50.0).unwrap();
        write_native_ply(&path, &predictor.frame_gaussians(7), PlyFormat::BinaryLittleEndian, &camera).unwrap();

        let data = PlyData::read_from(&path).unwrap();
        let names: Vec<&str> = data.header.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["vertex", "extrinsic", "intrinsic", "image_size", "frame", "disparity", "color_space", "version"]
        );
        assert_eq!(GaussianSet::from_ply(&data).unwrap(), predictor.frame_gaussians(7));
    }

    #[test]
    fn test_fake_source_out_of_range() {
        let source = FakeFrameSource::new(3, 4, 2);
        let handle = source.open(Path::new("clip.mp4")).unwrap();
        assert!(source.frame_at(&handle, 2).is_ok());
        assert!(matches!(
            source.frame_at(&handle, 3),
            Err(CoreError::FrameOutOfRange { index: 3, frame_count: 3 })
        ));
        assert_eq!(source.decoded(), vec![2]);
    }
}
