//! User configuration (terminal preferences)

use crate::storage::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment override for `TerminalApplication`
pub const TERMINAL_ENV: &str = "KONTAINER_TERMINAL";

/// Environment override for `TerminalService`
pub const TERMINAL_SERVICE_ENV: &str = "KONTAINER_TERMINAL_SERVICE";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to save settings: {0}")]
    SaveError(String),
}

/// Persisted settings file layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "General", default)]
    pub general: GeneralSettings,
}

/// The `[General]` group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Preferred terminal executable, optionally followed by extra arguments
    #[serde(rename = "TerminalApplication", default)]
    pub terminal_application: String,

    /// Preferred desktop-service id of the terminal (native mode only)
    #[serde(rename = "TerminalService", default)]
    pub terminal_service: String,
}

impl Settings {
    /// Load settings from the default location, applying environment overrides
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::load_from(&paths::settings_path())?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Load settings from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&paths::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| SettingsError::SaveError(e.to_string()))?;

        fs::write(path, content)?;

        Ok(())
    }

    pub fn terminal_application(&self) -> &str {
        self.general.terminal_application.trim()
    }

    pub fn terminal_service(&self) -> &str {
        self.general.terminal_service.trim()
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(TERMINAL_ENV) {
            if !value.trim().is_empty() {
                self.general.terminal_application = value;
            }
        }
        if let Ok(value) = std::env::var(TERMINAL_SERVICE_ENV) {
            if !value.trim().is_empty() {
                self.general.terminal_service = value;
            }
        }
    }
}
