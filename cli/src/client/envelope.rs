//! The uniform response wrapper returned by every backend endpoint.

use serde::{Deserialize, Deserializer};

use crate::error::{CliError, Result};

/// Error code the backend uses to signal an expired access token.
pub const EXPIRED_TOKEN: &str = "expired_token";

/// `{success, data, error_code, error_msg}` as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Payload, present on success for endpoints that return one.
    pub data: Option<T>,
    /// Machine-readable failure code.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub error_code: String,
    /// Human-readable failure message.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub error_msg: String,
}

impl<T> ApiEnvelope<T> {
    /// The backend rejected the access token as expired.
    #[must_use]
    pub fn is_expired_token(&self) -> bool {
        !self.success && self.error_code == EXPIRED_TOKEN
    }

    /// Converts a domain failure into [`CliError::Api`].
    pub fn into_result(self) -> Result<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(CliError::Api {
                code: self.error_code,
                message: self.error_msg,
            })
        }
    }

    /// Like [`into_result`](Self::into_result), but also requires a payload.
    pub fn into_data(self) -> Result<T> {
        self.into_result()?.ok_or_else(|| {
            CliError::Serialization("successful response carried no data".to_string())
        })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
