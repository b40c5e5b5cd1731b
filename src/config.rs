use crate::error::Result;
use crate::playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Persistent replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackConfig,
    /// How often a followed file is re-read, in milliseconds
    pub follow_poll_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            follow_poll_ms: 500,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("replay").join("settings.json"))
    }

    /// Load the user's settings, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(settings) => return settings,
                    Err(e) => warn!("Ignoring settings at {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the settings to the user's config directory
    pub fn save(&self) -> Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => {
                warn!("No config directory available, settings not saved");
                Ok(())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn follow_poll_interval(&self) -> Duration {
        Duration::from_millis(self.follow_poll_ms.max(10))
    }
}
