//! `AppConfig` struct and TOML read/write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use epgmgr_core::{DEFAULT_CATEGORY, DEFAULT_RETENTION_DAYS, RESET_CATEGORY, StoreOptions};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Guide file settings.
    #[serde(default)]
    pub guide: GuideConfig,
    /// Stale programme sweeper settings.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// Category sentinels.
    #[serde(default)]
    pub categories: CategoriesConfig,
}

/// Guide file configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuideConfig {
    /// XMLTV file read and rewritten by each command. Relative paths are
    /// taken from the config directory.
    #[serde(default = "default_guide_path")]
    pub path: PathBuf,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            path: default_guide_path(),
        }
    }
}

fn default_guide_path() -> PathBuf {
    PathBuf::from("epg.xml")
}

/// Sweeper configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Days of programme history to keep.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

const fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

/// Category sentinel configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoriesConfig {
    /// Category for programmes added without one.
    #[serde(default = "default_category")]
    pub default: String,
    /// Category written by updates that omit one.
    #[serde(default = "reset_category")]
    pub reset: String,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            default: default_category(),
            reset: reset_category(),
        }
    }
}

fn default_category() -> String {
    String::from(DEFAULT_CATEGORY)
}

fn reset_category() -> String {
    String::from(RESET_CATEGORY)
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Store options derived from the category settings.
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_category: self.categories.default.clone(),
            reset_category: self.categories.reset.clone(),
        }
    }
}
