//! Gaussian prediction from single frames.
//!
//! The predictor itself is opaque: anything that turns an RGB frame plus a
//! camera model into a native Gaussian PLY file implements
//! [`GaussianPredictor`]. The shipped implementation, [`CommandPredictor`],
//! runs an external inference command per frame against a cached checkpoint.

pub mod checkpoint;
pub mod command;

pub use checkpoint::{CheckpointCache, CheckpointFetcher, FetchedBody, HttpFetcher, default_cache_dir};
pub use command::CommandPredictor;

use crate::camera::CameraParams;
use crate::error::{CoreError, CoreResult};
use crate::video::Frame;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Published SHARP checkpoint.
pub const DEFAULT_CHECKPOINT_URL: &str = "https://ml-site.cdn-apple.com/models/sharp/sharp_2572gikvuh.pt";

/// Compute device preference passed to the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Let the predictor pick (CUDA, then MPS, then CPU).
    #[default]
    Default,
    Cuda,
    Cpu,
    Mps,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Default => "default",
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
            Device::Mps => "mps",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "auto" => Ok(Device::Default),
            "cuda" | "gpu" => Ok(Device::Cuda),
            "cpu" => Ok(Device::Cpu),
            "mps" => Ok(Device::Mps),
            other => Err(CoreError::InvalidInput(format!(
                "unknown device '{other}' (expected default, cuda, cpu or mps)"
            ))),
        }
    }
}

/// Turns one frame into a native Gaussian PLY file.
pub trait GaussianPredictor {
    /// Makes the model ready (checkpoint resolved, weights reachable).
    /// Called once per run, before any frame.
    ///
    /// # Errors
    ///
    /// `ModelUnavailable` when the checkpoint is missing and cannot be fetched.
    fn prepare(&mut self) -> CoreResult<()>;

    /// Predicts Gaussians for `frame` under `camera` and writes them to
    /// `native_path`. Returns the number of Gaussians written.
    ///
    /// # Errors
    ///
    /// `InferenceFailure` when the model fails or produces no output.
    fn infer(&mut self, frame: &Frame, camera: &CameraParams, native_path: &Path) -> CoreResult<usize>;
}
