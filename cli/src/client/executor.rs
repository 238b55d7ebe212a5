//! Authenticated request execution with one transparent token refresh.
//!
//! Every feature call goes through [`AuthenticatedExecutor::execute`]:
//!
//! 1. load the stored credential (no credential, no network traffic);
//! 2. send the request with the current access token;
//! 3. on `403` fail with [`CliError::AccessDenied`], otherwise decode the envelope;
//! 4. on `expired_token`, exchange the refresh token, persist the new pair and
//!    send a fresh copy of the request exactly once more. A failed save is
//!    logged and does not prevent the retry.
//!
//! Domain failures are returned to the caller untouched.

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::auth::{Credential, CredentialStorage};
use crate::client::envelope::ApiEnvelope;
use crate::client::middleware::{AuthMiddleware, SessionHandle};
use crate::client::request::ApiRequest;
use crate::config::ApiConfig;
use crate::error::{CliError, Result};

const REFRESH_ENDPOINT: [&str; 4] = ["api", "v1", "auth", "refresh"];

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshData {
    #[serde(default)]
    token: String,
    #[serde(default)]
    refresh_token: String,
}

/// Executes API calls on behalf of the logged-in user.
pub struct AuthenticatedExecutor<S> {
    client: ClientWithMiddleware,
    refresh_client: Client,
    api: ApiConfig,
    store: S,
    session: SessionHandle,
}

impl<S: CredentialStorage> AuthenticatedExecutor<S> {
    /// Create an executor sending through `http`.
    #[must_use]
    pub fn new(http: Client, api: ApiConfig, store: S) -> Self {
        let session: SessionHandle = Arc::new(RwLock::new(None));
        let client = ClientBuilder::new(http.clone())
            .with(AuthMiddleware::new(Arc::clone(&session)))
            .build();

        Self {
            client,
            refresh_client: http,
            api,
            store,
            session,
        }
    }

    /// Credential storage backing this executor.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Execute one logical API call.
    ///
    /// At most one refresh round-trip happens per call. A second
    /// `expired_token` after a refresh is returned as is.
    ///
    /// # Errors
    ///
    /// - [`CliError::NotLoggedIn`] / [`CliError::CorruptCredential`] before any request
    /// - [`CliError::ConnectionFailed`], [`CliError::Timeout`], [`CliError::Network`] for transport failures
    /// - [`CliError::AccessDenied`] when the original or retried call answers 403
    /// - [`CliError::InvalidToken`] when the refresh token is rejected
    /// - [`CliError::UnexpectedResponse`] when the body is not an envelope
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<ApiEnvelope<T>> {
        let credential = self.store.load()?;
        self.publish(credential.clone()).await;

        let envelope = self.send::<T>(request).await?;
        if !envelope.is_expired_token() {
            return Ok(envelope);
        }

        tracing::info!("access token expired, refreshing session");
        let refreshed = self.refresh(&credential).await?;
        // The backend has already rotated the pair; finish the call either way.
        if let Err(e) = self.store.save(&refreshed) {
            tracing::warn!(error = %e, "could not persist refreshed credentials");
        }
        self.publish(refreshed).await;

        let retried = self.send::<T>(request).await?;
        if retried.is_expired_token() {
            tracing::warn!("backend still reports an expired token after refresh");
        }
        Ok(retried)
    }

    async fn publish(&self, credential: Credential) {
        *self.session.write().await = Some(credential);
    }

    async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<ApiEnvelope<T>> {
        let builder = request.build(&self.client, &self.api)?;
        tracing::debug!(
            method = %request.method(),
            body_len = request.body().map_or(0, <[u8]>::len),
            "sending authenticated request"
        );
        let response = builder.send().await?;
        decode(response).await
    }

    /// Exchange the refresh token for a new token pair.
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let url = self.api.endpoint(REFRESH_ENDPOINT)?;

        let response = self
            .refresh_client
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &credential.refresh_token,
            })
            .send()
            .await
            .map_err(|e| CliError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "refresh request rejected");
            return Err(CliError::InvalidToken);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CliError::ConnectionFailed(e.to_string()))?;

        let envelope: ApiEnvelope<RefreshData> = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "refresh response could not be decoded");
            CliError::InvalidToken
        })?;

        if !envelope.success {
            tracing::warn!(error_code = %envelope.error_code, "refresh token rejected");
            return Err(CliError::InvalidToken);
        }

        let data = envelope
            .data
            .filter(|data| !data.token.is_empty())
            .ok_or(CliError::InvalidToken)?;

        let refresh_token = if data.refresh_token.is_empty() {
            credential.refresh_token.clone()
        } else {
            data.refresh_token
        };

        Ok(credential.with_tokens(data.token, refresh_token))
    }
}

/// Turn a response into an envelope; 403 short-circuits before the body is read.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<ApiEnvelope<T>> {
    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return Err(CliError::AccessDenied);
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| CliError::UnexpectedResponse {
        status: status.as_u16(),
        message: e.to_string(),
    })
}
