//! Resource types returned by the secrets API.

use serde::{Deserialize, Serialize};

/// An organization the user belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// A named group of secrets inside an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A deployment environment of a secret group (e.g. `production`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
}

/// A single secret. `value` is masked by the backend unless revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub version: Option<u64>,
}
