//! HTTP client for the secrets backend.
//!
//! - [`ApiClient`] - feature calls (organizations, groups, environments, secrets)
//! - [`executor::AuthenticatedExecutor`] - authenticated execution with one token refresh
//! - [`transport`] - connection error classification

pub mod api;
pub mod envelope;
pub mod executor;
pub mod middleware;
pub mod request;
pub mod transport;
pub mod types;

pub use api::ApiClient;
