// ============================================================================
// splatreel-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Running Single-Frame Decodes
//
// The frame source builds an ffmpeg command that emits exactly one raw RGB24
// frame on stdout. This module runs such a command and captures that frame
// together with any error lines ffmpeg printed, behind traits so decoding can
// be driven by scripted event streams in tests.
//
// KEY COMPONENTS:
// - FfmpegProcess: A running ffmpeg whose event stream can be drained
// - FfmpegSpawner: Starts an FfmpegProcess from a command
// - SidecarSpawner: ffmpeg-sidecar implementation
// - capture_single_frame: Drains a process and keeps the first frame
//
// AI-ASSISTANT-INFO: ffmpeg process abstraction for one-frame decodes

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};

use std::process::ExitStatus;

/// Number of ffmpeg error lines kept for a decode failure message.
pub const MAX_ERROR_LINES: usize = 5;

/// A running ffmpeg invocation.
pub trait FfmpegProcess {
    /// Passes every event to `on_event` until ffmpeg closes its output.
    /// Stops early, killing the process, if `on_event` returns an error.
    fn drain_events(&mut self, on_event: &mut dyn FnMut(FfmpegEvent) -> CoreResult<()>) -> CoreResult<()>;

    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Starts ffmpeg commands.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

/// `FfmpegProcess` over an `ffmpeg_sidecar` child.
pub struct SidecarProcess(FfmpegChild);

impl FfmpegProcess for SidecarProcess {
    fn drain_events(&mut self, on_event: &mut dyn FnMut(FfmpegEvent) -> CoreResult<()>) -> CoreResult<()> {
        let events = self
            .0
            .iter()
            .map_err(|e| command_failed_error("ffmpeg", ExitStatus::default(), e.to_string()))?;

        for event in events {
            if let Err(e) = on_event(event) {
                if let Err(kill_err) = self.0.kill() {
                    log::debug!("Could not kill ffmpeg after handler error: {}", kill_err);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0.wait().map_err(|e| command_wait_error("ffmpeg", e))
    }
}

/// Spawns ffmpeg through `ffmpeg_sidecar`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let child = cmd.spawn().map_err(|e| command_start_error("ffmpeg", e))?;
        Ok(SidecarProcess(child))
    }
}

/// What a single-frame decode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// `(width, height, rgb24 bytes)` of the first frame ffmpeg emitted.
    pub frame: Option<(u32, u32, Vec<u8>)>,
    /// Up to [`MAX_ERROR_LINES`] error lines, in emission order.
    pub errors: Vec<String>,
    pub status: ExitStatus,
}

impl CapturedFrame {
    /// Human-readable reason a decode produced nothing usable.
    pub fn failure_reason(&self) -> String {
        if self.errors.is_empty() {
            format!("ffmpeg exited with {} without producing a frame", self.status)
        } else {
            self.errors.join("; ")
        }
    }
}

/// Drains `process` to completion, keeping the first output frame.
pub fn capture_single_frame<P: FfmpegProcess + ?Sized>(process: &mut P) -> CoreResult<CapturedFrame> {
    let mut frame = None;
    let mut errors = Vec::new();

    process.drain_events(&mut |event| {
        match event {
            FfmpegEvent::OutputFrame(output) if frame.is_none() => {
                frame = Some((output.width, output.height, output.data));
            }
            FfmpegEvent::Error(line) | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                if errors.len() < MAX_ERROR_LINES {
                    errors.push(line);
                }
            }
            _ => {}
        }
        Ok(())
    })?;

    let status = process.wait()?;
    Ok(CapturedFrame { frame, errors, status })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    struct ScriptedProcess {
        events: Vec<FfmpegEvent>,
        status: ExitStatus,
    }

    impl FfmpegProcess for ScriptedProcess {
        fn drain_events(&mut self, on_event: &mut dyn FnMut(FfmpegEvent) -> CoreResult<()>) -> CoreResult<()> {
            for event in self.events.drain(..) {
                on_event(event)?;
            }
            Ok(())
        }

        fn wait(&mut self) -> CoreResult<ExitStatus> {
            Ok(self.status)
        }
    }

    #[test]
    fn test_error_lines_are_capped() {
        let mut events = vec![FfmpegEvent::Log(LogLevel::Info, "Input #0".to_string())];
        events.extend((0..8).map(|i| FfmpegEvent::Error(format!("bad packet {i}"))));
        let mut process = ScriptedProcess {
            events,
            status: ExitStatus::from_raw(1 << 8),
        };

        let captured = capture_single_frame(&mut process).unwrap();
        assert!(captured.frame.is_none());
        assert_eq!(captured.errors.len(), MAX_ERROR_LINES);
        assert!(captured.failure_reason().starts_with("bad packet 0; bad packet 1"));
    }

    #[test]
    fn test_silent_failure_mentions_status() {
        let mut process = ScriptedProcess {
            events: Vec::new(),
            status: ExitStatus::from_raw(1 << 8),
        };
        let captured = capture_single_frame(&mut process).unwrap();
        assert!(captured.failure_reason().contains("without producing a frame"));
    }
}
