// ============================================================================
// splatreel-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: ffmpeg and ffprobe
//
// The frame source reads metadata with ffprobe and decodes single frames with
// ffmpeg. Both sit behind traits so the frame source can run against canned
// answers in tests.
//
// KEY COMPONENTS:
// - FfmpegSpawner / capture_single_frame: running one-frame ffmpeg decodes
// - FfprobeExecutor: reading video stream metadata
// - require_tools: failing early when a tool is not installed
//
// AI-ASSISTANT-INFO: External tool interactions and abstractions for ffmpeg/ffprobe

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Single-frame ffmpeg decodes
pub mod ffmpeg_executor;

/// Video stream metadata via ffprobe
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{
    CapturedFrame, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, capture_single_frame,
};
pub use ffprobe_executor::{CrateFfprobeExecutor, FfprobeExecutor};

// ============================================================================
// TOOL AVAILABILITY
// ============================================================================

/// Verifies each of `tools` starts (`<tool> -version`), in order.
///
/// # Errors
///
/// * `DependencyNotFound` - the first tool that is not on PATH
/// * `CommandStart` - a tool exists but could not be started
pub fn require_tools(tools: &[&str]) -> CoreResult<()> {
    for tool in tools {
        let started = Command::new(tool)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match started {
            Ok(_) => log::debug!("{} is available", tool),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CoreError::DependencyNotFound(tool.to_string()));
            }
            Err(e) => return Err(CoreError::CommandStart(tool.to_string(), e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_missing_tool_is_reported() {
        let err = require_tools(&["splatreel-no-such-tool-7f3a", "splatreel-no-such-tool-9c1e"]).unwrap_err();
        assert!(matches!(err, CoreError::DependencyNotFound(name) if name == "splatreel-no-such-tool-7f3a"));
    }

    #[test]
    fn test_no_tools_is_ok() {
        assert!(require_tools(&[]).is_ok());
    }
}
