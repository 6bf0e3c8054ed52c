//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations.

use std::path::PathBuf;

/// Application name used for the config directory
const APP_NAME: &str = "httpprobe";

/// Get the configuration directory path
///
/// - Linux: `~/.config/httpprobe/`
/// - macOS: `~/Library/Application Support/httpprobe/`
/// - Windows: `%APPDATA%\httpprobe\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
