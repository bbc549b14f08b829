//! Configuration management for Clipshelf.
//!
//! This module handles loading, saving, and validating Clipshelf configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/clipshelf/config.toml` |
//! | macOS | `~/Library/Application Support/com.clipshelf.Clipshelf/config.toml` |
//! | Windows | `%APPDATA%\clipshelf\Clipshelf\config\config.toml` |
//!
//! ## Example
//!
//! ```toml
//! [history]
//! capacity = 30
//!
//! [watcher]
//! active_interval = "200ms"
//! idle_interval = "1s"
//!
//! [paste]
//! auto_paste = false
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::history::DEFAULT_CAPACITY;
use crate::normalize::DEFAULT_MAX_DIMENSION;
use crate::storage::PinnedStorage;

/// Main configuration struct for Clipshelf.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// History settings
    pub history: HistoryConfig,
    /// Clipboard watcher settings
    pub watcher: WatcherConfig,
    /// Image settings
    pub image: ImageConfig,
    /// Paste-back settings
    pub paste: PasteConfig,
    /// Storage settings
    pub storage: StorageConfig,
}

/// History configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum entries kept before unpinned ones are evicted
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Clipboard watcher configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Poll interval while the clipboard is changing
    #[serde(with = "humantime_serde")]
    pub active_interval: Duration,
    /// Poll interval once the clipboard has been quiet for `idle_after`
    #[serde(with = "humantime_serde")]
    pub idle_interval: Duration,
    /// Quiet period before switching to `idle_interval`
    #[serde(with = "humantime_serde")]
    pub idle_after: Duration,
    /// Changes this soon after our own clipboard write are ignored
    #[serde(with = "humantime_serde")]
    pub self_write_grace: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_millis(200),
            idle_interval: Duration::from_millis(1000),
            idle_after: Duration::from_secs(5),
            self_write_grace: Duration::from_millis(500),
        }
    }
}

/// Image configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Larger dimension images are scaled down to, in pixels
    pub max_dimension: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Paste-back configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Send a paste keystroke after restoring focus
    pub auto_paste: bool,
    /// Delay before restoring focus to the previous application
    #[serde(with = "humantime_serde")]
    pub focus_delay: Duration,
    /// Delay between restoring focus and the paste keystroke
    #[serde(with = "humantime_serde")]
    pub paste_delay: Duration,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            auto_paste: true,
            focus_delay: Duration::from_millis(50),
            paste_delay: Duration::from_millis(100),
        }
    }
}

/// Storage configuration options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the pinned entries file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Pinned entries storage, honouring the override.
    #[must_use]
    pub fn pinned_storage(&self) -> PinnedStorage {
        self.pinned_path
            .as_ref()
            .map_or_else(PinnedStorage::at_default_path, PinnedStorage::new)
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read,
    /// parsed, or validated.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or validated.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, reason: &str| {
            Err(Error::InvalidConfig {
                key: key.to_string(),
                reason: reason.to_string(),
            })
        };

        if self.history.capacity == 0 {
            return invalid("history.capacity", "must be at least 1");
        }
        if self.image.max_dimension == 0 {
            return invalid("image.max_dimension", "must be at least 1 pixel");
        }
        if self.watcher.active_interval.is_zero() {
            return invalid("watcher.active_interval", "must be greater than zero");
        }
        if self.watcher.idle_interval < self.watcher.active_interval {
            return invalid(
                "watcher.idle_interval",
                "must not be shorter than watcher.active_interval",
            );
        }
        Ok(())
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "clipshelf", "Clipshelf")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

/// Human-readable durations: `"250ms"`, `"5s"`, `"2m"`.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let parse_num = |n: &str| n.trim().parse::<u64>().map_err(|e| e.to_string());

        if let Some(ms) = s.strip_suffix("ms") {
            parse_num(ms).map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            parse_num(secs).map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            parse_num(mins).map(|m| Duration::from_secs(m * 60))
        } else {
            Err(format!("invalid duration format: {s:?}"))
        }
    }
}
