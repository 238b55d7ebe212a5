//! Error types and result aliases for the secrets CLI.
//!
//! Every failure the authentication core can produce is a distinct variant,
//! so callers branch on the kind rather than on message text:
//! - local session state ([`CliError::NotLoggedIn`], [`CliError::CorruptCredential`])
//! - session validity ([`CliError::InvalidToken`], [`CliError::AccessDenied`])
//! - transport ([`CliError::ConnectionFailed`], [`CliError::BackendUnreachable`])
//! - device login outcomes ([`CliError::DeviceFlowLocalTimeout`] and friends)
//! - domain failures reported by the backend ([`CliError::Api`])

use std::path::PathBuf;

use thiserror::Error;

use crate::client::transport;

/// Main error type for secrets CLI operations.
///
/// Each variant includes a user-friendly message with the recovery step.
#[derive(Error, Debug)]
pub enum CliError {
    /// No credential file exists.
    #[error("Not logged in. Run 'secrets auth login' to authenticate.")]
    NotLoggedIn,

    /// The credential file exists but cannot be used.
    #[error("Stored credentials at {} are corrupted ({reason}). Inspect or remove the file, then run 'secrets auth login'.", path.display())]
    CorruptCredential {
        /// Location of the credential file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The refresh token was rejected; the session is dead.
    #[error("Your session has expired. Run 'secrets auth login' to re-authenticate.")]
    InvalidToken,

    /// The backend answered 403 for an authenticated request.
    #[error("Access denied. Your account does not have permission to perform this action.")]
    AccessDenied,

    /// Connection-level failure while talking to the API.
    #[error("Could not connect to the secrets API ({0}). Check your network connection or try again later.")]
    ConnectionFailed(String),

    /// Connection-level failure while starting a device login.
    #[error("The authentication server is unreachable ({0}). Check your network connection and try again.")]
    BackendUnreachable(String),

    /// The local polling budget ran out before the user approved the login.
    #[error("Login timed out after {attempts} attempts waiting for approval. Run 'secrets auth login' again and enter the code promptly.")]
    DeviceFlowLocalTimeout {
        /// Number of token requests issued.
        attempts: u32,
    },

    /// The authorization server gave up on the device code.
    #[error("The authorization server ended the login session. Check your connectivity and run 'secrets auth login' again.")]
    DeviceFlowBackendTimeout,

    /// The user declined the device login in the browser.
    #[error("Authorization was denied. If this was unintentional, run 'secrets auth login' to try again.")]
    AuthorizationDenied,

    /// Device login failed for a reason other than timeout or denial.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The backend reported a domain failure in the response envelope.
    #[error("API request failed ({code}): {message}")]
    Api {
        /// Machine-readable error code from the envelope.
        code: String,
        /// Human-readable message from the envelope.
        message: String,
    },

    /// The response body was not the expected envelope.
    #[error("Unexpected response from the API ({status}): {message}")]
    UnexpectedResponse {
        /// HTTP status code.
        status: u16,
        /// Decode failure detail.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out. The server may be slow or unreachable. Try again later.")]
    Timeout,

    /// Any other transport error.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Data serialization error: {0}. This may indicate corrupted data.")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CliError {
    /// Checks if this error can be resolved by logging in again.
    #[must_use]
    pub const fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn
                | Self::InvalidToken
                | Self::CorruptCredential { .. }
                | Self::DeviceFlowLocalTimeout { .. }
                | Self::DeviceFlowBackendTimeout
                | Self::AuthorizationDenied
        )
    }

    /// Checks if this error is transient and the operation might succeed on retry.
    ///
    /// Nothing in the authentication core retries on its own; this is for
    /// callers that want to.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::BackendUnreachable(_)
                | Self::Network(_)
                | Self::Timeout
        )
    }
}

/// Result type alias using [`CliError`].
pub type Result<T> = std::result::Result<T, CliError>;

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        transport::classify(&err)
    }
}

impl From<reqwest_middleware::Error> for CliError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => transport::classify(&err),
            reqwest_middleware::Error::Middleware(err) => transport::classify(&*err),
        }
    }
}
