// ============================================================================
// splatreel-core/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and Run Log Configuration
//
// Installs a log4rs configuration for the process: a stderr console appender
// and, when a log directory is given, a per-run file appender named
// `splatreel_run_{YYYYmmdd_HHMMSS}.log`.
//
// The console and file levels are independent so a quiet terminal can still
// produce a detailed log file. Records of the event log target can be kept off
// the console when a front end renders the event stream itself.
//
// AI-ASSISTANT-INFO: log4rs initialization for console and per-run log files

use crate::events::EVENT_LOG_TARGET;

use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

use std::path::{Path, PathBuf};

/// Prefix of per-run log file names.
pub const RUN_LOG_PREFIX: &str = "splatreel_run_";

/// Where log output goes.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub console_level: LevelFilter,
    /// Directory for the run log; no file is written when `None`.
    pub log_dir: Option<PathBuf>,
    pub file_level: LevelFilter,
    /// Whether event records (target `splatreel::events`) reach the console.
    pub events_to_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            log_dir: None,
            file_level: LevelFilter::Debug,
            events_to_console: true,
        }
    }
}

/// File name of the run log started now.
pub fn run_log_file_name() -> String {
    format!("{}{}.log", RUN_LOG_PREFIX, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Builds the log4rs configuration without installing it.
///
/// Returns the configuration and the run log path, if any.
pub fn build_config(config: &LoggingConfig) -> Result<(Config, Option<PathBuf>)> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l:<5})} {m}{n}")))
        .build();

    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(config.console_level)))
            .build("console", Box::new(console)),
    );
    let mut root = Root::builder().appender("console");
    let mut root_level = config.console_level;

    let log_path = match &config.log_dir {
        Some(dir) => {
            let path = dir.join(run_log_file_name());
            let file = file_appender(&path)?;
            builder = builder.appender(
                Appender::builder()
                    .filter(Box::new(ThresholdFilter::new(config.file_level)))
                    .build("file", Box::new(file)),
            );
            root = root.appender("file");
            root_level = root_level.max(config.file_level);
            Some(path)
        }
        None => None,
    };

    if !config.events_to_console {
        let mut events = Logger::builder().additive(false);
        let events_level = if log_path.is_some() {
            events = events.appender("file");
            config.file_level
        } else {
            LevelFilter::Off
        };
        builder = builder.logger(events.build(EVENT_LOG_TARGET, events_level));
    }

    let built = builder
        .build(root.build(root_level))
        .context("invalid logging configuration")?;
    Ok((built, log_path))
}

/// Installs the logger for the whole process. Call once, early in `main`.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    let (built, log_path) = build_config(config)?;
    log4rs::init_config(built).context("logger already initialized")?;
    Ok(log_path)
}

fn file_appender(log_file: &Path) -> Result<FileAppender> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }

    FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}")))
        .build(log_file)
        .with_context(|| format!("cannot open log file {}", log_file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_file_name() {
        let name = run_log_file_name();
        assert!(name.starts_with(RUN_LOG_PREFIX));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), RUN_LOG_PREFIX.len() + "20250101_000000.log".len());
    }

    #[test]
    fn test_build_config_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            log_dir: Some(dir.path().join("logs")),
            ..LoggingConfig::default()
        };
        let (_config, path) = build_config(&config).unwrap();
        let path = path.unwrap();
        assert!(path.starts_with(dir.path().join("logs")));
        assert!(path.exists());
    }

    #[test]
    fn test_events_kept_off_console() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            log_dir: Some(dir.path().to_path_buf()),
            events_to_console: false,
            ..LoggingConfig::default()
        };
        let (built, _path) = build_config(&config).unwrap();
        let events = built.loggers().iter().find(|l| l.name() == EVENT_LOG_TARGET).unwrap();
        assert!(!events.additive());
        assert_eq!(events.appenders(), ["file".to_string()]);
    }

    #[test]
    fn test_console_only() {
        let (_config, path) = build_config(&LoggingConfig::default()).unwrap();
        assert!(path.is_none());
    }
}
