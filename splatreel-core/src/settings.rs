// ============================================================================
// splatreel-core/src/settings.rs
// ============================================================================
//
// SETTINGS STORE: Persisted User Settings
//
// A flat JSON document holding the user's preferred device, processing
// parameters, frame range and last-used paths. Loaded at startup, saved on
// change, with exactly one writer.
//
// KEY COMPONENTS:
// - RunSettings: Typed settings document (serde)
// - SettingsStore: Load / save / reset against one document path
//
// LOADING RULES:
// - Missing document: defaults, no error
// - Unparseable document: defaults, logged as a warning
// - Keys are merged over the defaults one at a time; unknown keys are
//   ignored and keys with a value of the wrong type keep their default
//
// SAVING:
// The document is written to a temporary file in the same directory, synced
// and renamed over the previous document, so a crash mid-write leaves the
// previous valid document in place.
//
// AI-ASSISTANT-INFO: Persisted settings with per-key merge and atomic save

// ---- Internal crate imports ----
use crate::config::{
    DEFAULT_FOV_DEGREES, DEFAULT_LOW_PASS_FILTER_EPS, DEFAULT_PROCESSING_RESOLUTION,
    normalize_processing_resolution,
};
use crate::error::{CoreError, CoreResult};
use crate::inference::{DEFAULT_CHECKPOINT_URL, Device};

// ---- External crate imports ----
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::Builder as TempFileBuilder;

// ---- Standard library imports ----
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config directory.
pub const SETTINGS_DIR_NAME: &str = "splatreel";

/// Document file name.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// User settings persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub device: Device,
    pub processing_resolution: u32,
    pub low_pass_filter_eps: f64,
    pub last_video_path: Option<PathBuf>,
    pub last_output_dir: Option<PathBuf>,
    pub start_frame: u64,
    pub end_frame: Option<u64>,
    pub focal_length_override: Option<f64>,
    pub fov_degrees: f64,
    pub auto_convert_to_standard: bool,
    /// Command template run for each frame; see `inference::command`.
    pub predictor_command: Option<String>,
    pub checkpoint_url: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            device: Device::default(),
            processing_resolution: DEFAULT_PROCESSING_RESOLUTION,
            low_pass_filter_eps: DEFAULT_LOW_PASS_FILTER_EPS,
            last_video_path: None,
            last_output_dir: None,
            start_frame: 0,
            end_frame: None,
            focal_length_override: None,
            fov_degrees: DEFAULT_FOV_DEGREES,
            auto_convert_to_standard: true,
            predictor_command: None,
            checkpoint_url: DEFAULT_CHECKPOINT_URL.to_string(),
        }
    }
}

impl RunSettings {
    /// Every recognised key, in document order.
    pub const KEYS: [&'static str; 12] = [
        "device",
        "processing_resolution",
        "low_pass_filter_eps",
        "last_video_path",
        "last_output_dir",
        "start_frame",
        "end_frame",
        "focal_length_override",
        "fov_degrees",
        "auto_convert_to_standard",
        "predictor_command",
        "checkpoint_url",
    ];

    /// Builds settings from a JSON document, merging key by key over the defaults.
    pub fn from_json_value(loaded: &Value) -> CoreResult<Self> {
        let Value::Object(loaded) = loaded else {
            return Err(CoreError::InvalidInput("settings document is not a JSON object".to_string()));
        };

        let mut merged = match serde_json::to_value(Self::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in loaded {
            if !merged.contains_key(key) {
                warn!("Unknown setting '{key}' ignored");
                continue;
            }

            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            if serde_json::from_value::<Self>(Value::Object(candidate)).is_ok() {
                merged.insert(key.clone(), value.clone());
            } else {
                warn!("Invalid value for setting '{key}', using default");
            }
        }

        let mut settings: Self = serde_json::from_value(Value::Object(merged))?;
        settings.normalize();
        Ok(settings)
    }

    /// Assigns one setting from its string form.
    ///
    /// Optional settings are cleared by `"none"` or an empty string.
    pub fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let cleared = value.is_empty() || value.eq_ignore_ascii_case("none");
        match key {
            "device" => self.device = value.parse()?,
            "processing_resolution" => {
                let requested: u32 = parse_value(key, value)?;
                self.processing_resolution = normalize_processing_resolution(requested);
                if self.processing_resolution != requested {
                    info!(
                        "Processing resolution {} rounded to {}",
                        requested, self.processing_resolution
                    );
                }
            }
            "low_pass_filter_eps" => self.low_pass_filter_eps = parse_positive(key, value)?,
            "last_video_path" => self.last_video_path = (!cleared).then(|| PathBuf::from(value)),
            "last_output_dir" => self.last_output_dir = (!cleared).then(|| PathBuf::from(value)),
            "start_frame" => self.start_frame = parse_value(key, value)?,
            "end_frame" => {
                self.end_frame = if cleared { None } else { Some(parse_value(key, value)?) }
            }
            "focal_length_override" => {
                self.focal_length_override = if cleared { None } else { Some(parse_positive(key, value)?) }
            }
            "fov_degrees" => {
                let fov: f64 = parse_value(key, value)?;
                if !(fov > 0.0 && fov < 180.0) {
                    return Err(CoreError::InvalidInput(format!(
                        "fov_degrees must be between 0 and 180, got {value}"
                    )));
                }
                self.fov_degrees = fov;
            }
            "auto_convert_to_standard" => self.auto_convert_to_standard = parse_value(key, value)?,
            "predictor_command" => self.predictor_command = (!cleared).then(|| value.to_string()),
            "checkpoint_url" => self.checkpoint_url = value.to_string(),
            _ => return Err(CoreError::InvalidInput(format!("Unknown setting: {key}"))),
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let normalized = normalize_processing_resolution(self.processing_resolution);
        if normalized != self.processing_resolution {
            warn!(
                "Processing resolution {} is not a multiple of {}; using {}",
                self.processing_resolution,
                crate::config::PROCESSING_RESOLUTION_STEP,
                normalized
            );
            self.processing_resolution = normalized;
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::InvalidInput(format!("Invalid value for '{key}': {value}")))
}

fn parse_positive(key: &str, value: &str) -> CoreResult<f64> {
    let parsed: f64 = parse_value(key, value)?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(CoreError::InvalidInput(format!("'{key}' must be positive, got {value}")))
    }
}

/// Loads and saves one settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn open_default() -> CoreResult<Self> {
        Ok(Self::new(default_settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted settings, or defaults if the document is missing
    /// or cannot be parsed. Never fails.
    pub fn load(&self) -> RunSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{e}; using default settings");
                RunSettings::default()
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces a `SettingsLoadError` for an
    /// unreadable or unparseable document. A missing document is not an error.
    pub fn try_load(&self) -> CoreResult<RunSettings> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings document at {}; using defaults", self.path.display());
                return Ok(RunSettings::default());
            }
            Err(e) => return Err(self.load_error(e)),
        };

        let value: Value = serde_json::from_str(&text).map_err(|e| self.load_error(e))?;
        RunSettings::from_json_value(&value).map_err(|e| self.load_error(e))
    }

    /// Atomically replaces the persisted document.
    pub fn save(&self, settings: &RunSettings) -> CoreResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let write = || -> std::io::Result<()> {
            fs::create_dir_all(dir)?;
            let mut temp = TempFileBuilder::new()
                .prefix(".settings-")
                .suffix(".json.tmp")
                .tempfile_in(dir)?;
            serde_json::to_writer_pretty(&mut temp, settings)?;
            temp.write_all(b"\n")?;
            temp.as_file().sync_all()?;
            temp.persist(&self.path).map_err(|e| e.error)?;
            Ok(())
        };

        write().map_err(|e| CoreError::SettingsSaveError {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Overwrites the document with the defaults and returns them.
    pub fn reset(&self) -> CoreResult<RunSettings> {
        let defaults = RunSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }

    fn load_error(&self, reason: impl std::fmt::Display) -> CoreError {
        CoreError::SettingsLoadError {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// `<config dir>/splatreel/settings.json`, where the config directory is the
/// platform's (`$XDG_CONFIG_HOME` or `~/.config` on Linux, Application Support
/// on macOS, `%APPDATA%` on Windows).
pub fn default_settings_path() -> CoreResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
        .ok_or_else(|| CoreError::PathError("cannot determine the user config directory".to_string()))
}
