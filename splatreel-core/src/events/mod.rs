//! Typed status feed emitted by the batch orchestrator.
//!
//! Every run produces a sequence of [`Event`]s: run start, resolved camera,
//! model readiness, one status per frame, monotonically increasing progress
//! counts, and exactly one terminal event (`RunFinished` or `RunAborted`).
//! Handlers receive events synchronously on the processing thread and must
//! not block it for long; [`ChannelEventHandler`] hands events to another
//! thread through a bounded channel.

use crate::camera::CameraParams;
use crate::video::VideoInfo;

use serde::Serialize;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod channel;
pub mod json_handler;
pub mod log_handler;

pub use channel::ChannelEventHandler;
pub use json_handler::JsonProgressHandler;
pub use log_handler::{EVENT_LOG_TARGET, LogEventHandler};

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusLevel::Info => "INFO",
            StatusLevel::Success => "SUCCESS",
            StatusLevel::Warning => "WARNING",
            StatusLevel::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted {
        video_path: PathBuf,
        video: VideoInfo,
        first_frame: u64,
        last_frame: u64,
    },

    /// The camera used for every frame of the run.
    CameraResolved {
        camera: CameraParams,
    },

    ModelReady,

    /// The session directory was created; frames are written below it.
    SessionCreated {
        session_dir: PathBuf,
    },

    FrameStatus {
        index: u64,
        level: StatusLevel,
        message: String,
        output_path: Option<PathBuf>,
    },

    /// `completed` frames of `total` are done (successfully or not).
    Progress {
        completed: u64,
        total: u64,
    },

    RunFinished {
        succeeded: usize,
        warnings: usize,
        errors: usize,
        cancelled: bool,
        elapsed: Duration,
    },

    /// The run stopped before any frame was processed.
    RunAborted {
        kind: &'static str,
        message: String,
    },
}

impl Event {
    /// Progress events may be coalesced by consumers; status events may not.
    pub fn is_progress(&self) -> bool {
        matches!(self, Event::Progress { .. })
    }
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
