// ============================================================================
// splatreel-cli/src/commands/settings.rs
// ============================================================================
//
// SETTINGS COMMAND: Inspect and Edit Persisted Settings
//
// AI-ASSISTANT-INFO: `splatreel settings` implementation

use crate::cli::SettingsAction;
use crate::output::print_status;

use anyhow::{Result, bail};
use splatreel_core::{RunSettings, SettingsStore, StatusLevel};

/// Executes `splatreel settings <action>`.
pub fn settings_command(action: SettingsAction, store: &SettingsStore) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = store.try_load()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set { key, value } => {
            if !RunSettings::KEYS.contains(&key.as_str()) {
                bail!("unknown setting '{}' (known: {})", key, RunSettings::KEYS.join(", "));
            }
            let mut settings = store.load();
            settings.set(&key, &value)?;
            store.save(&settings)?;
            print_status(StatusLevel::Success, &format!("{key} updated"));
        }
        SettingsAction::Reset => {
            store.reset()?;
            print_status(
                StatusLevel::Success,
                &format!("Settings reset to defaults ({})", store.path().display()),
            );
        }
        SettingsAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}
