//! Configuration for jeewanjyoti-client.

use crate::redirect::ParamNames;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Which redirect-verification flow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// General payment success (appointment invoices).
    #[default]
    Payment,
    /// Loved-one profile mapping subscription.
    Mapping,
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payment => write!(f, "payment"),
            Self::Mapping => write!(f, "mapping"),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, without the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout applied to every backend request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Path of the persisted session file.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Path of the token refresh endpoint.
    #[serde(default = "default_token_refresh_path")]
    pub token_refresh_path: String,

    /// Payment verification flow.
    #[serde(default = "FlowConfig::payment")]
    pub payment: FlowConfig,

    /// User mapping verification flow.
    #[serde(default = "FlowConfig::mapping")]
    pub mapping: FlowConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Shape of one redirect-verification flow.
///
/// The gateway's query parameter names and the backend's request field names
/// differ between flows, so both are data rather than code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Endpoint path, joined onto `api_base_url`.
    pub endpoint_path: String,

    /// Query parameters that may carry the reference id, in priority order.
    pub reference_params: Vec<String>,

    /// Query parameters that may carry the gateway transaction id, in priority order.
    pub transaction_params: Vec<String>,

    /// Query parameter carrying the gateway status, if the flow checks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_param: Option<String>,

    /// Status value the gateway reports for a completed payment.
    #[serde(default = "default_success_marker")]
    pub success_marker: String,

    /// Request body field for the reference id.
    pub reference_field: String,

    /// Request body field for the transaction id.
    pub transaction_field: String,

    /// Application route offered once the flow is terminal.
    pub destination: String,
}

impl FlowConfig {
    /// Appointment payment verification.
    #[must_use]
    pub fn payment() -> Self {
        Self {
            endpoint_path: "/api/verify_payment/".to_string(),
            reference_params: vec!["purchase_order_id".to_string(), "invoice_no".to_string()],
            transaction_params: vec!["pidx".to_string()],
            status_param: None,
            success_marker: default_success_marker(),
            reference_field: "invoice_no".to_string(),
            transaction_field: "pidx".to_string(),
            destination: "/dashboard#appointments".to_string(),
        }
    }

    /// User mapping (loved-one profile) verification.
    #[must_use]
    pub fn mapping() -> Self {
        Self {
            endpoint_path: "/api/user-mapping/verify/".to_string(),
            reference_params: vec!["purchase_order_id".to_string()],
            transaction_params: vec!["pidx".to_string()],
            status_param: Some("status".to_string()),
            success_marker: default_success_marker(),
            reference_field: "payment_ref".to_string(),
            transaction_field: "pidx".to_string(),
            destination: "/dashboard".to_string(),
        }
    }

    /// Query parameter names used by the redirect extractor.
    #[must_use]
    pub fn param_names(&self) -> ParamNames {
        ParamNames {
            reference: self.reference_params.clone(),
            transaction: self.transaction_params.clone(),
            status: self.status_param.clone(),
        }
    }

    /// Check that the flow can be run at all.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first empty setting.
    pub fn validate(&self) -> crate::Result<()> {
        let required = [
            ("endpoint_path", self.endpoint_path.is_empty()),
            ("reference_params", self.reference_params.iter().all(String::is_empty)),
            ("transaction_params", self.transaction_params.iter().all(String::is_empty)),
            ("success_marker", self.success_marker.is_empty()),
            ("reference_field", self.reference_field.is_empty()),
            ("transaction_field", self.transaction_field.is_empty()),
            ("destination", self.destination.is_empty()),
        ];
        match required.iter().find(|(_, empty)| *empty) {
            Some((name, _)) => Err(crate::Error::Config(format!("flow setting `{name}` is empty"))),
            None => Ok(()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            session_file: default_session_file(),
            token_refresh_path: default_token_refresh_path(),
            payment: FlowConfig::payment(),
            mapping: FlowConfig::mapping(),
            log_level: default_log_level(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://jeewanjyoti-backend.smart.org.np".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_session_file() -> PathBuf {
    directories::ProjectDirs::from("np", "smart", "jeewanjyoti")
        .map(|dirs| dirs.data_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".jeewanjyoti/session.json"))
}

fn default_token_refresh_path() -> String {
    "/api/token/refresh/".to_string()
}

fn default_success_marker() -> String {
    "Completed".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the request timeout and both flows.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero request timeout or an incomplete flow.
    pub fn validate(&self) -> crate::Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        self.payment.validate()?;
        self.mapping.validate()
    }

    /// Flow configuration for the given kind.
    #[must_use]
    pub fn flow(&self, kind: FlowKind) -> &FlowConfig {
        match kind {
            FlowKind::Payment => &self.payment,
            FlowKind::Mapping => &self.mapping,
        }
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL of a backend path.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL and path do not form a valid URL.
    pub fn endpoint_url(&self, path: &str) -> crate::Result<Url> {
        let joined = format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| crate::Error::Config(format!("invalid URL {joined}: {e}")))
    }
}
