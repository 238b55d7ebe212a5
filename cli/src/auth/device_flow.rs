//! OAuth device authorization login.
//!
//! The flow moves through
//! `REQUEST_CODE -> DISPLAY_CODE -> POLLING -> {AUTHORIZED, DENIED, TIMED_OUT, BACKEND_UNREACHABLE}`:
//! [`DeviceLoginFlow::start`] requests the code pair, the caller shows it,
//! and [`DeviceLoginFlow::poll`] asks the token endpoint at a fixed interval
//! until it answers with a token, the user or backend gives up, or the local
//! attempt budget runs out.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::auth::credentials::CredentialStorage;
use crate::auth::tokens::{Credential, DeviceSession};
use crate::config::{ApiConfig, AuthConfig};
use crate::error::{CliError, Result};

const DEVICE_CODE_ENDPOINT: [&str; 5] = ["api", "v1", "auth", "device", "code"];
const DEVICE_TOKEN_ENDPOINT: [&str; 5] = ["api", "v1", "auth", "device", "token"];

/// Error the backend returns once it stops waiting for the user.
const DEVICE_AUTHORIZATION_TIMEOUT: &str = "device_authorization_timeout";
/// Error the backend returns when the user declines.
const ACCESS_DENIED: &str = "access_denied";

/// Polling cadence for the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay before each token request.
    pub interval: Duration,
    /// Token requests before giving up.
    pub max_attempts: u32,
}

impl From<&AuthConfig> for PollOptions {
    fn from(config: &AuthConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_attempts: config.max_poll_attempts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    interval: u64,
}

#[derive(Debug, Default, Deserialize)]
struct DeviceTokenResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    user: Option<DeviceUser>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeviceUser {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
}

impl DeviceTokenResponse {
    fn into_credential(self) -> Result<Credential> {
        if self.refresh_token.is_empty() {
            return Err(CliError::AuthenticationFailed(
                "the server issued an access token without a refresh token".to_string(),
            ));
        }
        let user = self.user.unwrap_or_default();
        Ok(Credential {
            access_token: self.token,
            refresh_token: self.refresh_token,
            name: user.username,
            email: user.email,
        })
    }
}

/// Result of a single token request.
enum PollOutcome {
    Pending,
    Authorized(DeviceTokenResponse),
    Denied,
    BackendTimeout,
}

/// Device authorization login against the secrets backend.
pub struct DeviceLoginFlow<S> {
    http: Client,
    api: ApiConfig,
    options: PollOptions,
    store: S,
}

impl<S: CredentialStorage> DeviceLoginFlow<S> {
    /// Create a login flow that saves the resulting credential to `store`.
    #[must_use]
    pub fn new(http: Client, api: ApiConfig, options: PollOptions, store: S) -> Self {
        Self {
            http,
            api,
            options,
            store,
        }
    }

    /// Run the whole flow, handing the session to `display` before polling.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start) and [`poll`](Self::poll).
    pub async fn login<F>(&self, display: F) -> Result<Credential>
    where
        F: FnOnce(&DeviceSession),
    {
        let session = self.start().await?;
        display(&session);
        self.poll(&session).await
    }

    /// Request a device/user code pair.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::BackendUnreachable`] on connection-level failures,
    /// [`CliError::AuthenticationFailed`] if the backend refuses, or
    /// [`CliError::Serialization`] for an unreadable response.
    pub async fn start(&self) -> Result<DeviceSession> {
        let url = self.api.endpoint(DEVICE_CODE_ENDPOINT)?;

        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| match CliError::from(e) {
                CliError::ConnectionFailed(message) => CliError::BackendUnreachable(message),
                other => other,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError::AuthenticationFailed(format!(
                "device authorization request failed ({status})"
            )));
        }

        let body = response.bytes().await?;
        let code: DeviceCodeResponse = serde_json::from_slice(&body)?;
        tracing::debug!(
            expires_in = code.expires_in,
            server_interval = code.interval,
            "received device code"
        );

        let budget = self
            .options
            .interval
            .checked_mul(self.options.max_attempts)
            .unwrap_or(Duration::MAX);

        Ok(DeviceSession {
            device_code: code.device_code,
            user_code: code.user_code,
            verification_uri: code.verification_uri,
            verification_uri_complete: code.verification_uri_complete,
            poll_interval: self.options.interval,
            max_attempts: self.options.max_attempts,
            deadline: Utc::now() + chrono::Duration::from_std(budget).unwrap_or_default(),
        })
    }

    /// Poll until the user approves the login, then save the credential.
    ///
    /// Every token request uses one attempt, including those that fail in
    /// transport.
    ///
    /// # Errors
    ///
    /// - [`CliError::DeviceFlowBackendTimeout`] when the backend ends the session
    /// - [`CliError::AuthorizationDenied`] when the user declines
    /// - [`CliError::DeviceFlowLocalTimeout`] after `max_attempts` requests without a token
    pub async fn poll(&self, session: &DeviceSession) -> Result<Credential> {
        let url = self.api.endpoint(DEVICE_TOKEN_ENDPOINT)?;

        for attempt in 1..=session.max_attempts {
            tokio::time::sleep(session.poll_interval).await;

            match self.poll_once(&url, session).await {
                PollOutcome::Pending => {
                    tracing::debug!(attempt, "device authorization pending");
                }
                PollOutcome::Authorized(response) => {
                    let credential = response.into_credential()?;
                    self.store.save(&credential)?;
                    tracing::info!(attempt, account = %credential.email, "device login authorized");
                    return Ok(credential);
                }
                PollOutcome::Denied => return Err(CliError::AuthorizationDenied),
                PollOutcome::BackendTimeout => return Err(CliError::DeviceFlowBackendTimeout),
            }
        }

        Err(CliError::DeviceFlowLocalTimeout {
            attempts: session.max_attempts,
        })
    }

    async fn poll_once(&self, url: &Url, session: &DeviceSession) -> PollOutcome {
        let response = match self
            .http
            .post(url.clone())
            .json(&serde_json::json!({ "device_code": session.device_code }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "token request failed");
                return PollOutcome::Pending;
            }
        };

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "token response could not be read");
                return PollOutcome::Pending;
            }
        };

        let token: DeviceTokenResponse = serde_json::from_slice(&body).unwrap_or_default();
        match token.error.as_deref() {
            Some(DEVICE_AUTHORIZATION_TIMEOUT) => PollOutcome::BackendTimeout,
            Some(ACCESS_DENIED) => PollOutcome::Denied,
            _ if !token.token.is_empty() => PollOutcome::Authorized(token),
            _ => PollOutcome::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::{FileCredentialStore, MockCredentialStorage};

    const CODE: &str = "/api/v1/auth/device/code";
    const TOKEN: &str = "/api/v1/auth/device/token";

    fn api_config(base: &str) -> ApiConfig {
        ApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout_secs: 5,
        }
    }

    fn fast(max_attempts: u32) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    fn flow<S: CredentialStorage>(base: &str, max_attempts: u32, store: S) -> DeviceLoginFlow<S> {
        let api = api_config(base);
        DeviceLoginFlow::new(api.http_client().unwrap(), api, fast(max_attempts), store)
    }

    fn session(max_attempts: u32) -> DeviceSession {
        DeviceSession {
            device_code: "device-123".to_string(),
            user_code: "WDJB-MJHT".to_string(),
            verification_uri: "https://example.com/device".to_string(),
            verification_uri_complete: None,
            poll_interval: Duration::from_millis(1),
            max_attempts,
            deadline: Utc::now(),
        }
    }

    fn authorized() -> serde_json::Value {
        json!({
            "token": "access-1",
            "refresh_token": "refresh-1",
            "user": {"email": "ada@example.com", "username": "ada"}
        })
    }

    async fn mount_code(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(CODE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device_code": "device-123",
                "user_code": "WDJB-MJHT",
                "verification_uri": "https://example.com/device",
                "verification_uri_complete": "https://example.com/device?code=WDJB-MJHT",
                "expires_in": 900,
                "interval": 5
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_token(server: &MockServer, response: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN))
            .and(body_json(json!({"device_code": "device-123"})))
            .respond_with(response)
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn start_builds_session_from_device_code() {
        let mock_server = MockServer::start().await;
        mount_code(&mock_server).await;

        let flow = flow(&mock_server.uri(), 60, MockCredentialStorage::new());
        let session = flow.start().await.unwrap();

        assert_eq!(session.device_code, "device-123");
        assert_eq!(session.user_code, "WDJB-MJHT");
        assert_eq!(
            session.browser_url(),
            "https://example.com/device?code=WDJB-MJHT"
        );
        assert_eq!(session.max_attempts, 60);
        assert!(session.deadline > Utc::now());
    }

    #[tokio::test]
    async fn start_with_unreachable_backend_fails_fast() {
        let flow = flow("http://127.0.0.1:1", 60, MockCredentialStorage::new());

        let result = flow.start().await;

        assert!(matches!(result, Err(CliError::BackendUnreachable(_))));
    }

    #[tokio::test]
    async fn start_rejected_by_backend_is_authentication_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CODE))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let flow = flow(&mock_server.uri(), 60, MockCredentialStorage::new());

        assert!(matches!(
            flow.start().await,
            Err(CliError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn token_on_third_poll_saves_credential_once() {
        let mock_server = MockServer::start().await;
        let request_count = Arc::new(AtomicUsize::new(0));
        let counter = request_count.clone();

        Mock::given(method("POST"))
            .and(path(TOKEN))
            .respond_with(move |_req: &wiremock::Request| {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    ResponseTemplate::new(200).set_body_json(json!({}))
                } else {
                    ResponseTemplate::new(200).set_body_json(authorized())
                }
            })
            .expect(3)
            .mount(&mock_server)
            .await;

        let mut store = MockCredentialStorage::new();
        store
            .expect_save()
            .withf(|saved: &Credential| {
                saved.access_token == "access-1"
                    && saved.refresh_token == "refresh-1"
                    && saved.name == "ada"
                    && saved.email == "ada@example.com"
            })
            .times(1)
            .returning(|_| Ok(()));
        let flow = flow(&mock_server.uri(), 60, store);

        let credential = flow.poll(&session(60)).await.unwrap();

        assert_eq!(credential.access_token, "access-1");
        assert_eq!(request_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_is_local_timeout_after_exact_attempts() {
        let mock_server = MockServer::start().await;
        mount_token(
            &mock_server,
            ResponseTemplate::new(200).set_body_json(json!({"error": "authorization_pending"})),
            60,
        )
        .await;

        let mut store = MockCredentialStorage::new();
        store.expect_save().never();
        let flow = flow(&mock_server.uri(), 60, store);

        let result = flow.poll(&session(60)).await;

        assert!(matches!(
            result,
            Err(CliError::DeviceFlowLocalTimeout { attempts: 60 })
        ));
    }

    #[tokio::test]
    async fn backend_timeout_stops_polling_immediately() {
        let mock_server = MockServer::start().await;
        mount_token(
            &mock_server,
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "device_authorization_timeout"})),
            1,
        )
        .await;

        let mut store = MockCredentialStorage::new();
        store.expect_save().never();
        let flow = flow(&mock_server.uri(), 60, store);

        let result = flow.poll(&session(60)).await;

        assert!(matches!(result, Err(CliError::DeviceFlowBackendTimeout)));
    }

    #[tokio::test]
    async fn denial_stops_polling_immediately() {
        let mock_server = MockServer::start().await;
        mount_token(
            &mock_server,
            ResponseTemplate::new(400).set_body_json(json!({"error": "access_denied"})),
            1,
        )
        .await;

        let flow = flow(&mock_server.uri(), 60, MockCredentialStorage::new());

        assert!(matches!(
            flow.poll(&session(60)).await,
            Err(CliError::AuthorizationDenied)
        ));
    }

    #[tokio::test]
    async fn transport_failures_consume_the_budget() {
        let flow = flow("http://127.0.0.1:1", 5, MockCredentialStorage::new());

        let result = flow.poll(&session(5)).await;

        assert!(matches!(
            result,
            Err(CliError::DeviceFlowLocalTimeout { attempts: 5 })
        ));
    }

    #[tokio::test]
    async fn garbage_responses_count_as_pending() {
        let mock_server = MockServer::start().await;
        mount_token(
            &mock_server,
            ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
            3,
        )
        .await;

        let flow = flow(&mock_server.uri(), 3, MockCredentialStorage::new());

        assert!(matches!(
            flow.poll(&session(3)).await,
            Err(CliError::DeviceFlowLocalTimeout { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn token_without_refresh_token_is_rejected() {
        let mock_server = MockServer::start().await;
        mount_token(
            &mock_server,
            ResponseTemplate::new(200).set_body_json(json!({"token": "access-1"})),
            1,
        )
        .await;

        let mut store = MockCredentialStorage::new();
        store.expect_save().never();
        let flow = flow(&mock_server.uri(), 60, store);

        assert!(matches!(
            flow.poll(&session(60)).await,
            Err(CliError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn login_displays_code_then_persists_credential() {
        let mock_server = MockServer::start().await;
        mount_code(&mock_server).await;
        mount_token(
            &mock_server,
            ResponseTemplate::new(200).set_body_json(authorized()),
            1,
        )
        .await;

        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join("credentials.json"));
        let flow = flow(&mock_server.uri(), 60, store.clone());

        let mut shown = None;
        let credential = flow
            .login(|session| shown = Some(session.user_code.clone()))
            .await
            .unwrap();

        assert_eq!(shown.as_deref(), Some("WDJB-MJHT"));
        assert_eq!(store.load().unwrap(), credential);
    }
}
