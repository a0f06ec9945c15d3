// ============================================================================
// splatreel-cli/src/commands/model.rs
// ============================================================================
//
// FETCH-MODEL COMMAND: Checkpoint Download
//
// Downloads the predictor checkpoint ahead of a run so the first frame does
// not wait on the network. A cached checkpoint is reused as-is.
//
// AI-ASSISTANT-INFO: `splatreel fetch-model` implementation

use crate::cli::FetchModelArgs;
use crate::output::print_status;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use splatreel_core::inference::default_cache_dir;
use splatreel_core::{CheckpointCache, HttpFetcher, RunSettings, StatusLevel};

use std::time::Duration;

/// Executes `splatreel fetch-model`.
pub fn fetch_model_command(args: FetchModelArgs, settings: &RunSettings) -> Result<()> {
    let dir = match args.cache_dir {
        Some(dir) => dir,
        None => default_cache_dir()?,
    };
    let url = args.url.unwrap_or_else(|| settings.checkpoint_url.clone());
    let cache = CheckpointCache::new(dir, url)?;

    if let Some(path) = cache.cached() {
        print_status(StatusLevel::Info, &format!("Checkpoint already cached at {}", path.display()));
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Downloading checkpoint to {}", cache.path().display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = cache.ensure(&HttpFetcher::new());
    spinner.finish_and_clear();

    let path = result?;
    print_status(StatusLevel::Success, &format!("Checkpoint saved to {}", path.display()));
    Ok(())
}
