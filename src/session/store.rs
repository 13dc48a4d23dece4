//! File-backed session store.
//!
//! Holds the same record the web client keeps in local storage: access token,
//! refresh token and the user profile, as one JSON document.

use crate::error::{Error, Result};
use crate::session::{Credential, CredentialProvider, Session};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Session persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by the file at `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Session> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Session(format!("corrupt session file {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                Ok(Session::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Store tokens and user data after a login.
    ///
    /// Absent values leave the stored ones untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or written.
    pub fn store_tokens(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        user_data: Option<serde_json::Value>,
    ) -> Result<()> {
        let mut session = self.load()?;
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            session.access_token = Some(token.to_string());
        }
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            session.refresh_token = Some(token.to_string());
        }
        if let Some(data) = user_data {
            session.user_data = Some(data);
        }
        self.save(&session)?;
        info!("Session tokens stored in {}", self.path.display());
        Ok(())
    }

    /// The stored refresh token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.refresh_token.filter(|t| !t.is_empty()))
    }

    /// Remove all tokens and user data.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CredentialProvider for FileSessionStore {
    fn access_token(&self) -> Option<Credential> {
        match self.load() {
            Ok(session) => session.access_token.and_then(Credential::new),
            Err(e) => {
                warn!("Failed to read access token: {e}");
                None
            }
        }
    }
}
