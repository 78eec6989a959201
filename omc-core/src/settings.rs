//! Persisted user preferences.
//!
//! Only the search path handed to the Ogre tools is stored, as JSON under the
//! user's configuration directory.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory created under the platform configuration directory.
pub const SETTINGS_DIR: &str = "omc";

/// Settings file name.
pub const SETTINGS_FILE: &str = "settings.json";

/// User-scoped preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Value for the tools' `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,
}

impl Settings {
    /// Default settings file, if the platform has a configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Load settings. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(settings_error(path, e)),
        };
        serde_json::from_str(&content).map_err(|e| settings_error(path, e))
    }

    /// Write settings, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| settings_error(path, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| settings_error(path, e))?;
        fs::write(path, json).map_err(|e| settings_error(path, e))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Store a new search path. Blank input is ignored and `false` returned.
    pub fn set_search_path(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.search_path = Some(value.to_string());
        true
    }

    /// The stored search path, if it is non-blank.
    pub fn search_path(&self) -> Option<&str> {
        self.search_path
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

fn settings_error(path: &Path, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Settings {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
