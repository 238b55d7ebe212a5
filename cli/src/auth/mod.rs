//! Authentication module for the secrets CLI.
//!
//! This module provides the OAuth device login flow and the local
//! credential lifecycle used by every authenticated command.

pub mod credentials;
pub mod device_flow;
pub mod tokens;

#[cfg(test)]
pub use credentials::MockCredentialStorage;
pub use credentials::{CredentialStorage, FileCredentialStore};
pub use device_flow::{DeviceLoginFlow, PollOptions};
pub use tokens::{Credential, DeviceSession};
