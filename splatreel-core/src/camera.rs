//! Camera intrinsics shared by every frame of a run.
//!
//! The predictor needs a focal length in pixels. Videos rarely carry lens
//! metadata, so the value is estimated from the frame width and an assumed
//! horizontal field of view. It is resolved once per run and then reused for
//! every frame so that all point clouds of a sequence share one camera model.

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};

/// Horizontal field of view assumed when nothing better is known.
pub const DEFAULT_FOV_DEGREES: f64 = 50.0;

/// Where the focal length of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FocalSource {
    /// Derived from the frame width and an assumed field of view.
    Estimated { fov_degrees: f64 },
    /// Supplied by the user.
    Manual,
}

/// Intrinsics used for every frame of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub focal_length_px: f64,
    pub width: u32,
    pub height: u32,
    pub source: FocalSource,
}

impl CameraParams {
    /// Resolves the camera for a run.
    ///
    /// A manual override is authoritative: when present the estimator is not
    /// consulted at all.
    pub fn resolve(
        width: u32,
        height: u32,
        focal_override: Option<f64>,
        fov_degrees: f64,
    ) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidInput(format!(
                "Frame dimensions must be non-zero, got {width}x{height}"
            )));
        }

        match focal_override {
            Some(focal) => {
                if !focal.is_finite() || focal <= 0.0 {
                    return Err(CoreError::InvalidInput(format!(
                        "Focal length must be positive, got {focal}"
                    )));
                }
                Ok(Self {
                    focal_length_px: focal,
                    width,
                    height,
                    source: FocalSource::Manual,
                })
            }
            None => Ok(Self {
                focal_length_px: estimate_focal_length(width, height, fov_degrees)?,
                width,
                height,
                source: FocalSource::Estimated { fov_degrees },
            }),
        }
    }
}

/// Estimates a focal length in pixels: `f_px = (width / 2) / tan(fov / 2)`.
///
/// The width is the reference axis (landscape video). `height` is accepted so
/// the signature matches the intrinsics it feeds, but does not affect the
/// result.
pub fn estimate_focal_length(width: u32, _height: u32, fov_degrees: f64) -> CoreResult<f64> {
    if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
        return Err(CoreError::InvalidInput(format!(
            "Field of view must be within (0, 180) degrees, got {fov_degrees}"
        )));
    }
    if width == 0 {
        return Err(CoreError::InvalidInput("Frame width must be non-zero".to_string()));
    }

    let half_fov = fov_degrees.to_radians() / 2.0;
    Ok((f64::from(width) / 2.0) / half_fov.tan())
}
