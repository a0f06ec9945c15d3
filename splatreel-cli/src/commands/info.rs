// ============================================================================
// splatreel-cli/src/commands/info.rs
// ============================================================================
//
// INFO COMMAND: Video Properties and Camera Preview
//
// Probes a video and shows the frame count, dimensions and the focal length
// a run would use, without loading the model.
//
// AI-ASSISTANT-INFO: `splatreel info` implementation

use crate::cli::InfoArgs;
use crate::output::{print_heading, print_info};

use anyhow::Result;
use log::debug;
use serde_json::json;
use splatreel_core::{CameraParams, FfmpegFrameSource, FocalSource, FrameSource, RunSettings, format_duration};

/// Executes `splatreel info`.
pub fn info_command(args: InfoArgs, settings: &RunSettings) -> Result<()> {
    let source = FfmpegFrameSource::new();
    let handle = source.open(&args.input)?;
    let info = &handle.info;
    debug!("Probed {}: {:?}", args.input.display(), info);

    let fov = args.fov.unwrap_or(settings.fov_degrees);
    let camera = CameraParams::resolve(info.width, info.height, settings.focal_length_override, fov)?;

    if args.json {
        let value = json!({
            "path": args.input,
            "video": info,
            "camera": camera,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_heading(&handle.name());
    print_info("Path", args.input.display());
    print_info("Resolution", format!("{}x{}", info.width, info.height));
    print_info("Frame rate", format!("{:.3} fps", info.fps));
    print_info("Frames", info.frame_count);
    print_info("Duration", format_duration(info.duration_secs));
    let focal = match camera.source {
        FocalSource::Estimated { fov_degrees } => {
            format!("{:.2}px (estimated at {fov_degrees}° FOV)", camera.focal_length_px)
        }
        FocalSource::Manual => format!("{:.2}px (manual)", camera.focal_length_px),
    };
    print_info("Focal length", focal);
    Ok(())
}
