// splatreel-cli/src/lib.rs
//
// Library portion of the Splatreel CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ConvertArgs, FetchModelArgs, InfoArgs, RunArgs, SettingsAction};
pub use commands::{convert_command, fetch_model_command, info_command, run_command, settings_command};
