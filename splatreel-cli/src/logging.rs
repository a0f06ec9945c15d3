// ============================================================================
// splatreel-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Mapping Command-Line Flags to Logger Setup
//
// The CLI keeps the console quiet (warnings and errors) unless `--verbose`
// is given, and writes a detailed run log when `--log-dir` is present. While
// the progress bar renders the event stream, event records go to the file
// only.
//
// AI-ASSISTANT-INFO: Console/file log levels derived from CLI flags

use log::LevelFilter;
use splatreel_core::LoggingConfig;

use std::path::PathBuf;

/// Builds the logger configuration for one invocation.
///
/// `renders_events` is true when the terminal already shows every event,
/// as the progress UI and `--json` mode do.
pub fn logging_config(verbose: bool, log_dir: Option<PathBuf>, renders_events: bool) -> LoggingConfig {
    LoggingConfig {
        console_level: if verbose { LevelFilter::Debug } else { LevelFilter::Warn },
        log_dir,
        file_level: LevelFilter::Debug,
        events_to_console: !renders_events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_lowers_console_level() {
        assert_eq!(logging_config(false, None, false).console_level, LevelFilter::Warn);
        assert_eq!(logging_config(true, None, false).console_level, LevelFilter::Debug);
    }

    #[test]
    fn test_rendered_events_stay_off_console() {
        let config = logging_config(false, Some(PathBuf::from("logs")), true);
        assert!(!config.events_to_console);
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));
    }
}
