//! Session credentials for authenticated backend calls.
//!
//! The login flow owns the session; everything in this crate only reads the
//! access token through [`CredentialProvider`], except the explicit session
//! management helpers ([`FileSessionStore`], [`TokenRefresher`]).

mod refresh;
mod store;
mod token;

pub use refresh::{RefreshOutcome, TokenRefresher};
pub use store::FileSessionStore;
pub use token::{is_token_expired, token_expiry};

use serde::{Deserialize, Serialize};

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Returns `None` for an empty or blank token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of the current access token.
pub trait CredentialProvider: Send + Sync {
    /// The stored access token, if there is one.
    fn access_token(&self) -> Option<Credential>;
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    /// Provider that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credential::new(token))
    }

    /// Provider with no token.
    #[must_use]
    pub fn absent() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn access_token(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Persisted login session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// JWT access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// JWT refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// User profile returned by login or registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<serde_json::Value>,
}

impl Session {
    /// True if both tokens are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        non_blank(self.access_token.as_deref()) && non_blank(self.refresh_token.as_deref())
    }
}

fn non_blank(token: Option<&str>) -> bool {
    token.is_some_and(|t| !t.trim().is_empty())
}
