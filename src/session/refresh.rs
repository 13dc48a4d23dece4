//! Access token refresh.

use crate::error::{Error, Result};
use crate::session::FileSessionStore;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Result of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token was stored.
    Refreshed,
    /// No refresh token is stored; nothing was sent.
    NoRefreshToken,
    /// The backend rejected the refresh token; the session was cleared.
    Rejected,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: Option<String>,
}

/// Exchanges the stored refresh token for a new access token.
pub struct TokenRefresher {
    http: reqwest::Client,
    url: Url,
}

impl TokenRefresher {
    /// Create a refresher posting to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, url })
    }

    /// Refresh the access token held by `store`.
    ///
    /// A rejected refresh token clears the whole session, so the user has to
    /// log in again.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached, answers without an
    /// access token, or the session file cannot be read or written.
    pub async fn refresh(&self, store: &FileSessionStore) -> Result<RefreshOutcome> {
        let Some(refresh_token) = store.refresh_token()? else {
            warn!("No refresh token available");
            return Ok(RefreshOutcome::NoRefreshToken);
        };

        debug!("Refreshing access token via {}", self.url);
        let response = self
            .http
            .post(self.url.clone())
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("token refresh failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token refresh rejected with HTTP {status}; clearing session");
            store.clear()?;
            return Ok(RefreshOutcome::Rejected);
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("invalid refresh response: {e}")))?;

        match body.access.filter(|t| !t.is_empty()) {
            Some(access) => {
                store.store_tokens(Some(&access), None, None)?;
                info!("Access token refreshed");
                Ok(RefreshOutcome::Refreshed)
            }
            None => Err(Error::Session(
                "refresh response carried no access token".to_string(),
            )),
        }
    }
}
