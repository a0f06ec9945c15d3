// ============================================================================
// splatreel-cli/src/main.rs
// ============================================================================
//
// SPLATREEL CLI: Main Entry Point
//
// Parses the command line, installs logging, opens the settings store and
// dispatches to the selected command.
//
// Exit codes:
// - 0: the command succeeded (for `run`, at least one frame produced output)
// - 1: the command failed, or a run produced no output
//
// AI-ASSISTANT-INFO: Entry point for the splatreel binary

// ---- Internal crate imports ----
use splatreel_cli::logging::logging_config;
use splatreel_cli::output::print_error;
use splatreel_cli::{
    Cli, Commands, convert_command, fetch_model_command, info_command, run_command, settings_command,
};

// ---- External crate imports ----
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use splatreel_core::{SettingsStore, init_logging};

// ---- Standard library imports ----
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let renders_events = matches!(cli.command, Commands::Run(_));
    let log_path = init_logging(&logging_config(cli.verbose, cli.log_dir.clone(), renders_events))
        .context("failed to initialize logging")?;
    if let Some(path) = &log_path {
        info!("Logging to {}", path.display());
    }
    debug!("Command line: {:?}", cli);

    let store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::open_default().context("cannot locate the settings file (use --settings)")?,
    };

    match cli.command {
        Commands::Run(args) => run_command(args, &store),
        Commands::Info(args) => info_command(args, &store.load()).map(|()| true),
        Commands::Convert(args) => convert_command(args).map(|()| true),
        Commands::Settings { action } => settings_command(action, &store).map(|()| true),
        Commands::FetchModel(args) => fetch_model_command(args, &store.load()).map(|()| true),
    }
}
