// splatreel-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Splatreel: video frames to 3D Gaussian Splatting PLY sequences",
    long_about = "Runs a single-image Gaussian splat predictor on every frame of a video range \
                  and writes one standard 3DGS PLY file per frame."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings document to read and update (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH", env = "SPLATREEL_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Write a run log file into this directory
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Show debug output on the console
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates one Gaussian splat PLY per frame of a video range
    Run(RunArgs),

    /// Prints video properties and the focal length a run would use
    Info(InfoArgs),

    /// Converts a native predictor PLY into a standard 3DGS PLY
    Convert(ConvertArgs),

    /// Shows or changes persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Downloads the model checkpoint into the local cache
    FetchModel(FetchModelArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input video (defaults to the last video used)
    #[arg(short = 'i', long = "input", value_name = "VIDEO")]
    pub input: Option<PathBuf>,

    /// Base output directory (defaults to the last output directory used)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// First frame index to process
    #[arg(long, value_name = "N")]
    pub start: Option<u64>,

    /// Last frame index to process, inclusive (defaults to the last frame)
    #[arg(long, value_name = "N")]
    pub end: Option<u64>,

    /// Focal length in pixels; skips estimation from the field of view
    #[arg(long = "focal-length", value_name = "PX")]
    pub focal_length: Option<f64>,

    /// Horizontal field of view assumed for focal length estimation
    #[arg(long, value_name = "DEG")]
    pub fov: Option<f64>,

    /// Inference device: default, cuda, cpu or mps
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Processing resolution (multiple of 384, 768-6144)
    #[arg(long, value_name = "PX")]
    pub resolution: Option<u32>,

    /// Low-pass filter epsilon applied to predicted Gaussians
    #[arg(long, value_name = "EPS")]
    pub eps: Option<f64>,

    /// Predictor command template; must contain {input} and {output}
    #[arg(long = "predictor-command", value_name = "CMD", env = "SPLATREEL_PREDICTOR_COMMAND")]
    pub predictor_command: Option<String>,

    /// Keep the predictor's native PLY files instead of converting them
    #[arg(long, default_value_t = false)]
    pub keep_native: bool,

    /// Print one JSON object per event on stdout instead of a progress bar
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Input video
    #[arg(short = 'i', long = "input", required = true, value_name = "VIDEO")]
    pub input: PathBuf,

    /// Horizontal field of view for the focal length estimate
    #[arg(long, value_name = "DEG")]
    pub fov: Option<f64>,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Native PLY written by the predictor
    #[arg(required = true, value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path (defaults to <input stem>_standard.ply next to the input)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Do not delete the input after a successful conversion
    #[arg(long, default_value_t = false)]
    pub keep_input: bool,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Prints the effective settings as JSON
    Show,
    /// Sets one setting
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Restores the defaults
    Reset,
    /// Prints the settings document path
    Path,
}

#[derive(Args, Debug)]
pub struct FetchModelArgs {
    /// Checkpoint URL (defaults to the configured checkpoint)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Cache directory (defaults to the torch hub checkpoint cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}
