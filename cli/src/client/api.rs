//! Secrets API client implementation.

use http::header::{HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::auth::{CredentialStorage, DeviceLoginFlow, FileCredentialStore, PollOptions};
use crate::client::executor::AuthenticatedExecutor;
use crate::client::request::ApiRequest;
use crate::client::types::{Environment, Organization, Secret, SecretGroup};
use crate::config::SecretsConfig;
use crate::error::Result;

/// Main API client for communicating with the secrets backend.
///
/// Feature calls only describe the request; authentication, refresh and
/// error classification happen in the [`AuthenticatedExecutor`].
pub struct ApiClient<S = FileCredentialStore> {
    http: Client,
    config: SecretsConfig,
    executor: AuthenticatedExecutor<S>,
}

impl ApiClient<FileCredentialStore> {
    /// Create a client using the configured credential file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the credential
    /// path cannot be determined.
    pub fn from_config(config: &SecretsConfig) -> Result<Self> {
        let store = FileCredentialStore::new(config.auth.credentials_path()?);
        Self::new(config, store)
    }
}

impl<S: CredentialStorage + Clone> ApiClient<S> {
    /// Create a client storing credentials in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SecretsConfig, store: S) -> Result<Self> {
        let http = config.api.http_client()?;
        let executor = AuthenticatedExecutor::new(http.clone(), config.api.clone(), store);
        Ok(Self {
            http,
            config: config.clone(),
            executor,
        })
    }

    /// Credential storage used by this client.
    pub const fn store(&self) -> &S {
        self.executor.store()
    }

    /// Device login flow that saves into this client's credential storage.
    #[must_use]
    pub fn device_login(&self) -> DeviceLoginFlow<S> {
        DeviceLoginFlow::new(
            self.http.clone(),
            self.config.api.clone(),
            PollOptions::from(&self.config.auth),
            self.store().clone(),
        )
    }

    /// List organizations the user belongs to.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.fetch(ApiRequest::get(["api", "v1", "organizations"]))
            .await
    }

    /// List secret groups of an organization.
    pub async fn list_secret_groups(&self, org: &str) -> Result<Vec<SecretGroup>> {
        self.fetch(ApiRequest::get(["api", "v1", "organizations", org, "groups"]))
            .await
    }

    /// List environments of a secret group.
    pub async fn list_environments(&self, org: &str, group: &str) -> Result<Vec<Environment>> {
        self.fetch(ApiRequest::get(group_path(org, group, &["environments"])))
            .await
    }

    /// Create an environment in a secret group.
    pub async fn create_environment(
        &self,
        org: &str,
        group: &str,
        name: &str,
    ) -> Result<Environment> {
        let request = ApiRequest::post(group_path(org, group, &["environments"]))
            .json(&serde_json::json!({ "name": name }))?;
        self.fetch(request).await
    }

    /// List secrets of an environment. Values stay masked unless `reveal` is set.
    pub async fn list_secrets(
        &self,
        org: &str,
        group: &str,
        env: &str,
        reveal: bool,
    ) -> Result<Vec<Secret>> {
        let mut request = ApiRequest::get(group_path(org, group, &["environments", env, "secrets"]));
        if reveal {
            request = request.query("reveal", "true");
        }
        self.fetch(request).await
    }

    /// Create or update a secret.
    pub async fn set_secret(
        &self,
        org: &str,
        group: &str,
        env: &str,
        key: &str,
        value: &str,
    ) -> Result<Secret> {
        let request =
            ApiRequest::put(group_path(org, group, &["environments", env, "secrets", key]))
                .json(&serde_json::json!({ "value": value }))?;
        self.fetch(request).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let request = request.header(ACCEPT, HeaderValue::from_static("application/json"));
        self.executor.execute::<T>(&request).await?.into_data()
    }
}

fn group_path(org: &str, group: &str, rest: &[&str]) -> Vec<String> {
    ["api", "v1", "organizations", org, "groups", group]
        .iter()
        .chain(rest)
        .map(|segment| (*segment).to_string())
        .collect()
}
