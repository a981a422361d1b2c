//! Settings for the `minicron` host binary

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MinicronError;

static SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Runner (and thread) name
    pub name: String,
    /// Milliseconds between runs, 0 starts paused
    pub period_ms: u32,
    /// Program and arguments to run on every tick
    pub command: Vec<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "minicron".to_string(),
            period_ms: 60_000,
            command: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        path.push("minicron");
        path.push(SETTINGS_FILE_NAME);
        Ok(path)
    }

    /// Load settings, writing defaults only if `config_file_path` doesn't exist yet.
    /// An existing file that can't be read or parsed is left untouched and reported.
    pub fn load_or_create(config_file_path: &Path) -> Result<Self> {
        if !config_file_path.exists() {
            warn!(
                "Config file {} not found - creating default config",
                config_file_path.display()
            );
            let default = Self::default();
            default.save_to_file(config_file_path)?;
            return Ok(default);
        }
        Self::load_from_file(config_file_path)
            .with_context(|| format!("Invalid settings in {}", config_file_path.display()))
    }

    pub fn load_from_file(config_file_path: &Path) -> Result<Self> {
        if !config_file_path.exists() {
            return Err(anyhow!("Config file not found"));
        }
        let data = fs::read_to_string(config_file_path)
            .with_context(|| format!("Failed to read {}", config_file_path.display()))?;
        let settings: Self = serde_json::from_str(&data).context("Failed to parse settings")?;
        Ok(settings)
    }

    pub fn save_to_file(&self, config_file_path: &Path) -> Result<()> {
        if let Some(parent_path) = config_file_path.parent() {
            fs::create_dir_all(parent_path).context("Failed to create config directory")?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), MinicronError> {
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(MinicronError::Config("no command configured".to_string()));
        }
        if self.name.is_empty() {
            return Err(MinicronError::Config("runner name is empty".to_string()));
        }
        Ok(())
    }
}
