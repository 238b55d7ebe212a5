//! Application configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::paths;
use crate::error::{CliError, Result};

/// Main configuration for the secrets CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// API client settings.
    pub api: ApiConfig,
    /// Authentication settings.
    pub auth: AuthConfig,
}

/// API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend API base URL.
    #[serde(with = "url_serde")]
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.secrets-cli.dev").expect("valid default URL"),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Builds the HTTP client used for every backend call.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .user_agent(format!("secrets-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }

    /// Appends percent-encoded path segments to the base URL.
    ///
    /// A base URL with a path prefix (`https://host/prefix`) keeps it.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the base URL cannot carry a path.
    pub fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                CliError::Config(format!("API base URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Seconds between device login token requests.
    pub poll_interval_secs: u64,
    /// Token requests before a device login gives up.
    pub max_poll_attempts: u32,
    /// Override for the credential file location.
    pub credentials_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            max_poll_attempts: 60,
            credentials_file: None,
        }
    }
}

impl AuthConfig {
    /// Resolves the credential file path, falling back to the per-user default.
    pub fn credentials_path(&self) -> Result<PathBuf> {
        match &self.credentials_file {
            Some(path) => Ok(path.clone()),
            None => paths::credentials_file(),
        }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const API_URL: &str = "SECRETS_API_URL";
    pub const CREDENTIALS_FILE: &str = "SECRETS_CREDENTIALS_FILE";
    pub const LOG_LEVEL: &str = "SECRETS_LOG";
}

impl SecretsConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(env::API_URL) {
            match Url::parse(&url) {
                Ok(parsed) => self.api.base_url = parsed,
                Err(e) => tracing::warn!("ignoring {}: {e}", env::API_URL),
            }
        }

        if let Ok(path) = std::env::var(env::CREDENTIALS_FILE) {
            if !path.is_empty() {
                self.auth.credentials_file = Some(PathBuf::from(path));
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> ApiConfig {
        ApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn defaults_match_device_login_budget() {
        let config = SecretsConfig::default();
        assert_eq!(config.auth.poll_interval_secs, 2);
        assert_eq!(config.auth.max_poll_attempts, 60);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn endpoint_appends_segments() {
        let url = api("http://127.0.0.1:8080")
            .endpoint(["api", "v1", "auth", "refresh"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/v1/auth/refresh");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = api("https://example.com/backend/")
            .endpoint(["api", "v1", "organizations"])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/backend/api/v1/organizations");
    }

    #[test]
    fn endpoint_encodes_segments() {
        let url = api("https://example.com")
            .endpoint(["secrets", "a/b c"])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/secrets/a%2Fb%20c");
    }

    #[test]
    fn endpoint_rejects_cannot_be_a_base_url() {
        let result = api("mailto:ops@example.com").endpoint(["api"]);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn explicit_credentials_file_wins() {
        let auth = AuthConfig {
            credentials_file: Some(PathBuf::from("/tmp/creds.json")),
            ..AuthConfig::default()
        };
        assert_eq!(
            auth.credentials_path().unwrap(),
            PathBuf::from("/tmp/creds.json")
        );
    }
}
