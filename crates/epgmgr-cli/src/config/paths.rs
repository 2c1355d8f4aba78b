//! Config and guide file path resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolves the config file path.
///
/// - If `dir` is `Some`, returns `{dir}/config.toml`.
/// - Otherwise returns `~/.config/epgmgr/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join("config.toml"));
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("epgmgr")
        .join("config.toml"))
}

/// Resolves the guide file path.
///
/// An explicit `--file` wins. Otherwise a relative `configured` path is
/// taken relative to the directory holding the config file.
#[must_use]
pub fn resolve_guide_path(
    override_path: Option<PathBuf>,
    config_path: &Path,
    configured: &Path,
) -> PathBuf {
    if let Some(path) = override_path {
        return path;
    }
    if configured.is_absolute() {
        return configured.to_path_buf();
    }
    config_path
        .parent()
        .map_or_else(|| configured.to_path_buf(), |dir| dir.join(configured))
}
