//! Credential persistence in a single JSON file.
//!
//! The file lives at a fixed per-user path (see
//! [`crate::config::paths::credentials_file`]). Writes go to a private
//! (0600) temp file in the same directory that is renamed over the target,
//! so a crash mid-write leaves either the old credential or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::auth::tokens::Credential;
use crate::error::{CliError, Result};

/// Storage operations for the local credential (enables mocking).
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStorage {
    /// Persists the credential, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::CorruptCredential`] for a credential missing a
    /// token, or an IO error if the file cannot be written.
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Loads the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotLoggedIn`] if nothing is stored and
    /// [`CliError::CorruptCredential`] if the stored data is unusable.
    fn load(&self) -> Result<Credential>;

    /// Removes the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotLoggedIn`] if nothing is stored.
    fn delete(&self) -> Result<()>;
}

/// File-backed credential storage.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store for the credential file at `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl Into<String>) -> CliError {
        CliError::CorruptCredential {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn write_atomically(&self, contents: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Created 0600 with a unique name; removed on drop if never persisted.
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl CredentialStorage for FileCredentialStore {
    fn save(&self, credential: &Credential) -> Result<()> {
        if !credential.is_complete() {
            return Err(self.corrupt("refusing to store a credential without both tokens"));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(credential)?;
        self.write_atomically(json.as_bytes())?;

        tracing::debug!(path = %self.path.display(), "saved credentials");
        Ok(())
    }

    fn load(&self) -> Result<Credential> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CliError::NotLoggedIn),
            Err(e) => return Err(e.into()),
        };

        let credential: Credential =
            serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))?;

        if !credential.is_complete() {
            return Err(self.corrupt("access or refresh token is empty"));
        }

        Ok(credential)
    }

    fn delete(&self) -> Result<()> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CliError::NotLoggedIn),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(io::Error::other(format!(
                "credential path {} is not a regular file",
                self.path.display()
            ))
            .into());
        }

        fs::remove_file(&self.path)?;
        tracing::debug!(path = %self.path.display(), "deleted credentials");
        Ok(())
    }
}
