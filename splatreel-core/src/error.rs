// ============================================================================
// splatreel-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for Splatreel Core
//
// This module defines the error type used throughout the splatreel-core
// library. Errors fall into two groups:
//
// - Run-level errors (InputNotFound, ModelUnavailable, ...) abort a run
//   before any frame is processed.
// - Frame-level errors (FrameOutOfRange, FrameDecode, InferenceFailure,
//   ConversionError) are caught by the batch orchestrator, reported for the
//   offending frame index, and the run continues.
//
// KEY COMPONENTS:
// - CoreError: Main error enum
// - CoreResult: Result alias
// - Helper constructors for external command failures
//
// AI-ASSISTANT-INFO: Error types and frame/run classification

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Errors produced by the splatreel-core library.
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- Input errors ----
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Cannot read video '{path}': {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ---- Frame errors ----
    #[error("Frame {index} is out of range (video has {frame_count} frames)")]
    FrameOutOfRange { index: u64, frame_count: u64 },

    #[error("Failed to decode frame {index}: {reason}")]
    FrameDecode { index: u64, reason: String },

    // ---- Model errors ----
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    // ---- Conversion errors ----
    #[error("PLY conversion failed: {0}")]
    ConversionError(String),

    // ---- Settings errors ----
    #[error("Failed to load settings from '{path}': {reason}")]
    SettingsLoadError { path: PathBuf, reason: String },

    #[error("Failed to save settings to '{path}': {reason}")]
    SettingsSaveError { path: PathBuf, reason: String },

    // ---- External command errors ----
    #[error("Required external command '{0}' not found")]
    DependencyNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Command '{cmd}' failed with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    // ---- Wrapped errors ----
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),
}

impl CoreError {
    /// Returns true for the errors a frame is expected to fail with.
    ///
    /// The orchestrator records every error raised while processing a frame
    /// against that frame and moves on; anything outside this set (disk
    /// errors, for example) is additionally logged as unexpected.
    pub fn is_frame_level(&self) -> bool {
        matches!(
            self,
            CoreError::FrameOutOfRange { .. }
                | CoreError::FrameDecode { .. }
                | CoreError::InferenceFailure(_)
                | CoreError::ConversionError(_)
        )
    }

    /// Short machine-friendly name used in structured progress output.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::InputNotFound(_) => "input_not_found",
            CoreError::InputUnreadable { .. } => "input_unreadable",
            CoreError::InvalidInput(_) => "invalid_input",
            CoreError::FrameOutOfRange { .. } => "frame_out_of_range",
            CoreError::FrameDecode { .. } => "frame_decode",
            CoreError::ModelUnavailable(_) => "model_unavailable",
            CoreError::InferenceFailure(_) => "inference_failure",
            CoreError::ConversionError(_) => "conversion_error",
            CoreError::SettingsLoadError { .. } => "settings_load_error",
            CoreError::SettingsSaveError { .. } => "settings_save_error",
            CoreError::DependencyNotFound(_) => "dependency_not_found",
            CoreError::CommandStart(..) => "command_start",
            CoreError::CommandFailed { .. } => "command_failed",
            CoreError::CommandWait(..) => "command_wait",
            CoreError::Io(_) => "io",
            CoreError::Json(_) => "json",
            CoreError::PathError(_) => "path",
        }
    }
}

/// Result type for splatreel-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

// ============================================================================
// HELPER CONSTRUCTORS
// ============================================================================

/// Builds a `CommandStart` error for a command that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a `CommandWait` error for a command whose exit could not be collected.
pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds a `CommandFailed` error for a command that exited unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}
