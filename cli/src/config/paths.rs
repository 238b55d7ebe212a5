//! Platform-specific path utilities for the secrets CLI.

use std::path::PathBuf;

use crate::error::{CliError, Result};

/// Get the configuration directory for the secrets CLI.
///
/// - Linux: `~/.config/secrets`
/// - macOS: `~/Library/Application Support/secrets`
/// - Windows: `%APPDATA%\secrets`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| CliError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("secrets"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get the default credential file path.
pub fn credentials_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("credentials.json"))
}
