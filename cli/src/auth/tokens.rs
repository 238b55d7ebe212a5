//! Credential and device-session types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated session's durable state.
///
/// Stored on disk as `{access_token, refresh_token, name, email}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token attached to API calls.
    pub access_token: String,
    /// Token exchanged for a new access token once the current one expires.
    pub refresh_token: String,
    /// Account name.
    #[serde(default)]
    pub name: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
}

impl Credential {
    /// Both tokens are present and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Returns a copy with new tokens and the same account identity.
    #[must_use]
    pub fn with_tokens(&self, access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish()
    }
}

/// Transient state of one device login attempt. Never persisted.
#[derive(Clone)]
pub struct DeviceSession {
    /// Sent only to the token endpoint.
    pub(crate) device_code: String,
    /// Code the user enters in the browser.
    pub user_code: String,
    /// Page where the user enters the code.
    pub verification_uri: String,
    /// Verification page with the code pre-filled, if the backend provides one.
    pub verification_uri_complete: Option<String>,
    /// Delay before each token request.
    pub poll_interval: Duration,
    /// Number of token requests before giving up.
    pub max_attempts: u32,
    /// When the local attempt budget runs out.
    pub deadline: DateTime<Utc>,
}

impl DeviceSession {
    /// URL to open in the browser.
    #[must_use]
    pub fn browser_url(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device_code", &"<redacted>")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("poll_interval", &self.poll_interval)
            .field("max_attempts", &self.max_attempts)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
