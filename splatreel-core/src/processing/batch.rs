// ============================================================================
// splatreel-core/src/processing/batch.rs
// ============================================================================
//
// BATCH ORCHESTRATION: Frame Range to Gaussian Splat Sequence
//
// This module drives one run: it opens the video, fixes the camera model,
// readies the predictor and then walks the requested frame interval, turning
// each frame into one standard 3DGS PLY file.
//
// KEY COMPONENTS:
// - process_video: Main entry point for a run
// - FramePipeline: The per-frame decode -> infer -> convert sequence
// - CancellationToken: Cooperative stop between frames
//
// WORKFLOW:
// 1. Validate configuration and open the video
// 2. Resolve the frame interval against the video's frame count
// 3. Resolve the camera once; the same value is used for every frame
// 4. Prepare the predictor (checkpoint fetch)
// 5. Create a fresh session directory
// 6. For each index in ascending order:
//    a. Decode the frame
//    b. Run the predictor into a native PLY
//    c. Convert to standard PLY and delete the native file
//    d. Report status and progress, then check for cancellation
//
// Steps 1-5 abort the run on failure, before any output exists. Failures in
// step 6 are recorded against the frame and the loop moves on.
//
// AI-ASSISTANT-INFO: Main run orchestration, sequential per-frame pipeline

// ---- Internal crate imports ----
use super::naming::{FrameNaming, create_session_dir, session_timestamp};
use super::summary::{FrameOutcome, RunSummary};
use crate::camera::CameraParams;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher, StatusLevel};
use crate::inference::GaussianPredictor;
use crate::ply::convert_native_to_standard;
use crate::utils::format_bytes;
use crate::video::{FrameSource, VideoHandle};

// ---- External crate imports ----
use chrono::Local;
use log::{debug, error, info, warn};

// ---- Standard library imports ----
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

// ============================================================================
// CANCELLATION
// ============================================================================

/// Shared flag asking a run to stop before its next frame.
///
/// Clones share the flag. A frame already in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// MAIN PROCESSING FUNCTION
// ============================================================================

/// Runs the whole pipeline for `config.video_path` over `config.frame_range`.
///
/// Returns the run summary whenever frame processing started, even if every
/// frame failed; check [`RunSummary::is_success`]. Returns `Err` only for
/// run-level failures (bad configuration, missing or unreadable input, model
/// unavailable, session directory not creatable), in which case exactly one
/// `RunAborted` event has been emitted and no output was written.
pub fn process_video<F, P>(
    source: &F,
    predictor: &mut P,
    config: &CoreConfig,
    events: &EventDispatcher,
    cancel: &CancellationToken,
) -> CoreResult<RunSummary>
where
    F: FrameSource + ?Sized,
    P: GaussianPredictor + ?Sized,
{
    let started = Instant::now();
    let abort = |err: CoreError| {
        events.emit(Event::RunAborted {
            kind: err.kind(),
            message: err.to_string(),
        });
        err
    };

    // ========================================================================
    // STEP 1: VALIDATE AND OPEN
    // ========================================================================

    config.validate().map_err(abort)?;
    let handle = source.open(&config.video_path).map_err(abort)?;

    // ========================================================================
    // STEP 2: RESOLVE FRAME INTERVAL
    // ========================================================================

    let (first_frame, last_frame) = config
        .frame_range
        .resolve(handle.info.frame_count)
        .map_err(abort)?;

    events.emit(Event::RunStarted {
        video_path: handle.path.clone(),
        video: handle.info,
        first_frame,
        last_frame,
    });

    // ========================================================================
    // STEP 3: RESOLVE CAMERA (ONCE PER RUN)
    // ========================================================================

    let camera = CameraParams::resolve(
        handle.info.width,
        handle.info.height,
        config.focal_length_override,
        config.fov_degrees,
    )
    .map_err(abort)?;
    events.emit(Event::CameraResolved { camera });

    // ========================================================================
    // STEP 4: PREPARE MODEL
    // ========================================================================

    predictor.prepare().map_err(abort)?;
    events.emit(Event::ModelReady);

    // ========================================================================
    // STEP 5: CREATE SESSION DIRECTORY
    // ========================================================================

    let video_name = handle.name();
    let session_dir = create_session_dir(&config.output_dir, &video_name, &session_timestamp(Local::now()))
        .map_err(abort)?;
    events.emit(Event::SessionCreated {
        session_dir: session_dir.clone(),
    });

    // ========================================================================
    // STEP 6: PROCESS FRAMES
    // ========================================================================

    let mut pipeline = FramePipeline {
        source,
        predictor,
        handle: &handle,
        camera,
        session_dir: &session_dir,
        naming: FrameNaming::new(config.attribution.clone(), config.format_tag.clone()),
        convert_to_standard: config.convert_to_standard,
        events,
    };
    let (frames, cancelled) = pipeline.run(first_frame, last_frame, cancel);

    let summary = RunSummary {
        video_name,
        session_dir,
        camera,
        first_frame,
        last_frame,
        frames,
        cancelled,
        elapsed: started.elapsed(),
    };

    events.emit(Event::RunFinished {
        succeeded: summary.succeeded(),
        warnings: summary.warnings(),
        errors: summary.errors(),
        cancelled: summary.cancelled,
        elapsed: summary.elapsed,
    });

    Ok(summary)
}

// ============================================================================
// PER-FRAME PIPELINE
// ============================================================================

/// Everything a frame needs, fixed for the whole run.
pub struct FramePipeline<'a, F: ?Sized, P: ?Sized> {
    pub source: &'a F,
    pub predictor: &'a mut P,
    pub handle: &'a VideoHandle,
    /// Shared by every frame of the run.
    pub camera: CameraParams,
    pub session_dir: &'a Path,
    pub naming: FrameNaming,
    pub convert_to_standard: bool,
    pub events: &'a EventDispatcher,
}

impl<F, P> FramePipeline<'_, F, P>
where
    F: FrameSource + ?Sized,
    P: GaussianPredictor + ?Sized,
{
    /// Processes `first..=last` strictly in order, one frame at a time.
    ///
    /// Returns the outcomes and whether the run was cancelled before the
    /// interval was exhausted.
    pub fn run(&mut self, first: u64, last: u64, cancel: &CancellationToken) -> (Vec<FrameOutcome>, bool) {
        let total = last.checked_sub(first).map_or(0, |span| span.saturating_add(1));
        let mut outcomes = Vec::with_capacity(total.min(4096) as usize);
        let mut cancelled = false;

        for (completed, index) in (first..=last).enumerate() {
            if cancel.is_cancelled() {
                info!("Cancellation requested; stopping before frame {index}");
                cancelled = true;
                break;
            }

            self.events.emit(Event::FrameStatus {
                index,
                level: StatusLevel::Info,
                message: format!("Processing frame {} ({}/{})", index, completed + 1, total),
                output_path: None,
            });

            let outcome = match self.process_frame(index) {
                Ok(outcome) => outcome,
                Err(e) => {
                    if e.is_frame_level() {
                        warn!("Frame {} failed: {}", index, e);
                    } else {
                        error!("Frame {} failed with an unexpected {} error: {}", index, e.kind(), e);
                    }
                    FrameOutcome {
                        index,
                        level: StatusLevel::Error,
                        message: e.to_string(),
                        output_path: None,
                        gaussian_count: None,
                    }
                }
            };

            self.events.emit(Event::FrameStatus {
                index,
                level: outcome.level,
                message: outcome.message.clone(),
                output_path: outcome.output_path.clone(),
            });
            self.events.emit(Event::Progress {
                completed: completed as u64 + 1,
                total,
            });
            outcomes.push(outcome);
        }

        (outcomes, cancelled)
    }

    /// Decode, infer and convert one frame.
    pub fn process_frame(&mut self, index: u64) -> CoreResult<FrameOutcome> {
        // ---- Decode ----
        let frame = self.source.frame_at(self.handle, index)?;
        debug!("Decoded frame {} ({}x{})", index, frame.width, frame.height);

        // ---- Infer ----
        let native_path = self.session_dir.join(self.naming.native_file_name(index));
        let gaussian_count = match self.predictor.infer(&frame, &self.camera, &native_path) {
            Ok(count) => count,
            Err(e) => {
                if native_path.exists() {
                    if let Err(remove_err) = fs::remove_file(&native_path) {
                        warn!(
                            "Could not remove partial output {}: {}",
                            native_path.display(),
                            remove_err
                        );
                    }
                }
                return Err(e);
            }
        };
        drop(frame);

        if !self.convert_to_standard {
            return Ok(FrameOutcome {
                index,
                level: StatusLevel::Success,
                message: format!(
                    "Saved {} ({} Gaussians)",
                    display_name(&native_path),
                    gaussian_count
                ),
                output_path: Some(native_path),
                gaussian_count: Some(gaussian_count),
            });
        }

        // ---- Convert ----
        let standard_path = self.session_dir.join(self.naming.standard_file_name(index));
        let report = convert_native_to_standard(&native_path, &standard_path)?;

        let (level, message) = match &report.native_removal_error {
            None => (
                StatusLevel::Success,
                format!(
                    "Saved {} ({} Gaussians, {})",
                    display_name(&standard_path),
                    report.gaussian_count,
                    format_bytes(report.output_size)
                ),
            ),
            Some(reason) => (
                StatusLevel::Warning,
                format!(
                    "Saved {} but could not remove native file {}: {}",
                    display_name(&standard_path),
                    display_name(&native_path),
                    reason
                ),
            ),
        };

        Ok(FrameOutcome {
            index,
            level,
            message,
            output_path: Some(report.output_path),
            gaussian_count: Some(report.gaussian_count),
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
