//! Run orchestration.
//!
//! Organizes the batch pipeline into submodules and exposes the entry point
//! for a run.

/// Main run orchestration logic
pub mod batch;

/// Session directory and output file naming
pub mod naming;

/// Per-frame outcomes and run summary
pub mod summary;

pub use batch::{CancellationToken, FramePipeline, process_video};
pub use naming::{FrameNaming, create_session_dir, parse_frame_index, session_timestamp};
pub use summary::{FrameOutcome, RunSummary};
