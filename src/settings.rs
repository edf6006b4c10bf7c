//! Run settings.
//!
//! Handles loading, validating, and merging the `settings.toml` file. The
//! stock defaults form the base layer and the user's file is merged on top,
//! so the file only needs the values it wants to change.
//!
//! ## Settings File Location
//!
//! By default the file is read from the MFDMF folder in the user's saved
//! games directory; `--settings` points somewhere else:
//!
//! ```text
//! ~/Saved Games/MFDMF/
//! ├── settings.toml        # This file (optional)
//! ├── displays.json        # Display templates
//! ├── Modules/             # Module definition files, any depth
//! ├── Cache/               # Rendered output
//! └── Logs/                # status.log
//! ```
//!
//! ## Settings Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! displays = ""       # Display file (empty = <base>/displays.json)
//! modules = ""        # Module definition root (empty = <base>/Modules)
//! assets = ""         # Asset root image references resolve against (empty = <base>)
//! cache = ""          # Render cache root (empty = <base>/Cache)
//! logs = ""           # Log directory (empty = <base>/Logs)
//!
//! [device]
//! use_cougar = false  # HC instead of WH for THROTTLE references
//!
//! [output]
//! quality = 80                # JPEG quality (1-100)
//! save_cropped_images = false # Also write <name>-crop.jpg before blending
//!
//! [rulers]
//! show = false        # Overlay centre axes with ticks
//! interval = 50       # Pixels between ticks
//! tick_length = 10    # Tick length in pixels
//! labels = true       # Print the coordinate next to each tick
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! ```
//!
//! Path values may reference environment variables as `$VAR` or `${VAR}`.
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Settings validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Hardware variant selection.
    pub device: DeviceConfig,
    /// Output encoding.
    pub output: OutputConfig,
    /// Measurement ruler overlay.
    pub rulers: RulerConfig,
    /// Log verbosity.
    pub logging: LoggingConfig,
}

/// Input and output locations. Empty values derive from the base directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub displays: String,
    pub modules: String,
    pub assets: String,
    pub cache: String,
    pub logs: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Substitute `HC` (Cougar) instead of `WH` (Warthog).
    pub use_cougar: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality, 1-100.
    pub quality: u32,
    /// Also persist the cropped and resized image before blending.
    pub save_cropped_images: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            save_cropped_images: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulerConfig {
    pub show: bool,
    /// Pixels between tick marks.
    pub interval: u32,
    /// Tick mark length in pixels.
    pub tick_length: u32,
    /// Draw coordinate labels next to ticks.
    pub labels: bool,
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            show: false,
            interval: 50,
            tick_length: 10,
            labels: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Fully expanded locations, ready to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub displays: PathBuf,
    pub modules: PathBuf,
    pub assets: String,
    pub cache: PathBuf,
    pub logs: PathBuf,
}

/// Log file name inside the logs directory.
pub const LOG_FILE: &str = "status.log";

impl ResolvedPaths {
    /// Open `<logs>/status.log` for appending, creating the directory and
    /// file as needed. Earlier runs' lines are kept.
    pub fn open_log_file(&self) -> std::io::Result<fs::File> {
        fs::create_dir_all(&self.logs)?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.logs.join(LOG_FILE))
    }
}

impl Settings {
    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(SettingsError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.rulers.show && self.rulers.interval == 0 {
            return Err(SettingsError::Validation(
                "rulers.interval must be non-zero when rulers are shown".into(),
            ));
        }
        Ok(())
    }

    /// Expand environment variables and fill empty paths from `base`.
    pub fn resolve_paths(&self, base: &Path) -> ResolvedPaths {
        let pick = |value: &str, fallback: PathBuf| -> PathBuf {
            let expanded = expand_env(value);
            if expanded.is_empty() {
                fallback
            } else {
                PathBuf::from(expanded)
            }
        };
        ResolvedPaths {
            displays: pick(&self.paths.displays, base.join("displays.json")),
            modules: pick(&self.paths.modules, base.join("Modules")),
            assets: pick(&self.paths.assets, base.to_path_buf())
                .to_string_lossy()
                .into_owned(),
            cache: pick(&self.paths.cache, base.join("Cache")),
            logs: pick(&self.paths.logs, base.join("Logs")),
        }
    }
}

/// The MFDMF folder under the user's saved games directory.
pub fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Saved Games")
        .join("MFDMF")
}

/// Default location of the settings file.
pub fn default_settings_path() -> PathBuf {
    default_base_dir().join("settings.toml")
}

/// Expand `$VAR` and `${VAR}` references. Unset variables expand to nothing.
pub fn expand_env(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
            name
        } else {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push('$');
                continue;
            }
            name
        };
        out.push_str(&std::env::var(&name).unwrap_or_default());
    }
    out
}

// =============================================================================
// Settings loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value. `Ok(None)` if it doesn't exist.
pub fn load_raw_settings(path: &Path) -> Result<Option<toml::Value>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_settings(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, SettingsError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path`, falling back to stock defaults when absent.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let overlay = load_raw_settings(path)?;
    resolve_settings(stock_defaults_value(), overlay)
}

/// A documented stock `settings.toml`.
pub fn stock_settings_toml() -> &'static str {
    r#"# mfd-compose settings
# All options are optional - remove any you don't need to change.
# Unknown keys will cause an error.
# Path values may use $VAR or ${VAR} environment references.

[paths]
# Display template file. Empty = <base>/displays.json
displays = ""
# Root directory searched (recursively) for module *.json files.
modules = ""
# Root that image file references resolve against.
assets = ""
# Where rendered images are written. Empty = <base>/Cache
cache = ""
# Where status.log is written. Empty = <base>/Logs
logs = ""

[device]
# Replace THROTTLE in flagged references with HC (Cougar) instead of WH (Warthog).
use_cougar = false

[output]
# JPEG quality (1-100).
quality = 80
# Also write <name>-crop.jpg with the cropped, resized image before blending.
save_cropped_images = false

[rulers]
# Draw centre axes with tick marks over every rendered image.
show = false
interval = 50
tick_length = 10
labels = true

[logging]
# Overridden by the MFD_LOG environment variable.
level = "info"
"#
}
