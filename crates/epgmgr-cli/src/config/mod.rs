//! Application configuration module.
//!
//! Manages the TOML config file holding the guide path, sweeper
//! retention, and category sentinels, and resolves where the guide
//! file lives.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
pub use paths::{resolve_config_path, resolve_guide_path};
