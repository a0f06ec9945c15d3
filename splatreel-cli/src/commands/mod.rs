//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `convert` command.
pub mod convert;
pub mod info;
/// Module containing the implementation of the `fetch-model` command.
pub mod model;
/// Module containing the implementation of the `run` command.
/// This command turns a frame range of a video into a PLY sequence.
pub mod run;
pub mod settings;

pub use convert::convert_command;
pub use info::info_command;
pub use model::fetch_model_command;
pub use run::run_command;
pub use settings::settings_command;
