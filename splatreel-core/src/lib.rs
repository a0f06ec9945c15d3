//! Core library for turning a video into a sequence of 3D Gaussian Splatting
//! PLY files, one per frame.
//!
//! For every frame of a requested interval the pipeline decodes the frame,
//! runs a single-image Gaussian predictor on it with a focal length fixed for
//! the whole run, and rewraps the predictor's native PLY into the standard
//! vertex-only 3DGS layout that viewers load.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use splatreel_core::{
//!     CancellationToken, CheckpointCache, CommandPredictor, CoreConfigBuilder, EventDispatcher,
//!     FfmpegFrameSource, HttpFetcher, LogEventHandler, process_video,
//! };
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = CoreConfigBuilder::new()
//!     .video_path(PathBuf::from("/videos/walk.mp4"))
//!     .output_dir(PathBuf::from("/splats"))
//!     .frame_range(0, Some(47))
//!     .build()
//!     .unwrap();
//!
//! let cache = CheckpointCache::default_location().unwrap();
//! let mut predictor = CommandPredictor::new(
//!     "sharp predict -i {input} -o {output} -c {checkpoint}",
//!     cache,
//!     Box::new(HttpFetcher::new()),
//! )
//! .unwrap()
//! .with_device(config.device);
//!
//! let mut events = EventDispatcher::new();
//! events.add_handler(Arc::new(LogEventHandler));
//!
//! let summary = process_video(
//!     &FfmpegFrameSource::new(),
//!     &mut predictor,
//!     &config,
//!     &events,
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//! println!("{}", summary.status_line());
//! ```

pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod external;
pub mod inference;
pub mod logging;
pub mod mocks;
pub mod ply;
pub mod processing;
pub mod settings;
pub mod temp_files;
pub mod utils;
pub mod video;

// Re-exports for public API
pub use camera::{CameraParams, FocalSource, estimate_focal_length};
pub use config::{CoreConfig, CoreConfigBuilder, FrameRange};
pub use error::{CoreError, CoreResult};
pub use events::{
    ChannelEventHandler, Event, EventDispatcher, EventHandler, JsonProgressHandler, LogEventHandler, StatusLevel,
};
pub use inference::{
    CheckpointCache, CheckpointFetcher, CommandPredictor, DEFAULT_CHECKPOINT_URL, Device, GaussianPredictor,
    HttpFetcher,
};
pub use logging::{LoggingConfig, init_logging};
pub use ply::{ConversionReport, convert_native_to_standard, default_standard_path, rewrap_to_standard};
pub use processing::{CancellationToken, FrameOutcome, RunSummary, process_video};
pub use settings::{RunSettings, SettingsStore, default_settings_path};
pub use utils::{format_bytes, format_duration};
pub use video::{FfmpegFrameSource, Frame, FrameSource, VideoHandle, VideoInfo};
