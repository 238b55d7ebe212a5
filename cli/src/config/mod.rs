//! Configuration management for the secrets CLI.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{ApiConfig, AuthConfig, SecretsConfig};

use std::path::Path;

use crate::error::{CliError, Result};

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<SecretsConfig> {
    let path = config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<SecretsConfig> {
    if !path.exists() {
        return Ok(SecretsConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: SecretsConfig =
        toml::from_str(&contents).map_err(|e| CliError::ConfigRead(e.to_string()))?;

    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\nmax_poll_attempts = 10\n").unwrap();

        let config = load_config_from(&path).unwrap();

        assert_eq!(config.auth.max_poll_attempts, 10);
        assert_eq!(config.auth.poll_interval_secs, 2);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn invalid_file_is_a_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"not a url\"\n").unwrap();

        assert!(matches!(
            load_config_from(&path),
            Err(CliError::ConfigRead(_))
        ));
    }
}
