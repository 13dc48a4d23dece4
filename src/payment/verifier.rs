//! Backend verification client.
//!
//! Issues the single authenticated request that confirms a gateway
//! transaction, and maps the response onto [`VerificationError`].

use crate::config::{ClientConfig, FlowConfig};
use crate::error::{Error, Result};
use crate::payment::outcome::{Payload, VerificationError, GENERIC_FAILURE};
use crate::redirect::RedirectParams;
use crate::session::Credential;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Confirms a redirect transaction with the backend.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Verify `params`, sending at most one request.
    async fn verify(
        &self,
        params: &RedirectParams,
        credential: Option<&Credential>,
    ) -> std::result::Result<Payload, VerificationError>;
}

/// Configuration for the verification client.
#[derive(Debug, Clone)]
pub struct VerificationClientConfig {
    /// Verification endpoint.
    pub endpoint: Url,
    /// Request body field for the reference id.
    pub reference_field: String,
    /// Request body field for the transaction id.
    pub transaction_field: String,
    /// Status the gateway reports for a completed payment.
    pub success_marker: String,
    /// Timeout for the whole request.
    pub timeout: Duration,
}

impl VerificationClientConfig {
    /// Client configuration for `flow` against the backend in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or flow is incomplete, or the
    /// endpoint URL is invalid.
    pub fn from_flow(config: &ClientConfig, flow: &FlowConfig) -> Result<Self> {
        config.validate()?;
        flow.validate()?;
        Ok(Self {
            endpoint: config.endpoint_url(&flow.endpoint_path)?,
            reference_field: flow.reference_field.clone(),
            transaction_field: flow.transaction_field.clone(),
            success_marker: flow.success_marker.clone(),
            timeout: config.request_timeout(),
        })
    }
}

/// HTTP verification client.
pub struct VerificationClient {
    http: reqwest::Client,
    config: VerificationClientConfig,
}

impl VerificationClient {
    /// Create a new verification client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: VerificationClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        debug!(
            "Verification client for {} (timeout={:?})",
            config.endpoint, config.timeout
        );

        Ok(Self { http, config })
    }

    /// The verification endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    fn request_body(&self, params: &RedirectParams) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.config.reference_field.clone(),
            Value::String(params.reference_id.clone()),
        );
        body.insert(
            self.config.transaction_field.clone(),
            Value::String(params.transaction_id.clone()),
        );
        Value::Object(body)
    }
}

#[async_trait]
impl Verifier for VerificationClient {
    async fn verify(
        &self,
        params: &RedirectParams,
        credential: Option<&Credential>,
    ) -> std::result::Result<Payload, VerificationError> {
        let Some(credential) = credential else {
            return Err(VerificationError::unauthenticated());
        };

        if let Some(status) = &params.status_hint {
            if *status != self.config.success_marker {
                info!(
                    "Gateway reported status {status:?} for {}; not verifying",
                    params.reference_id
                );
                return Err(VerificationError::StatusNotCompleted {
                    status: status.clone(),
                });
            }
        }

        debug!(
            "Verifying {} / {} with {}",
            params.reference_id, params.transaction_id, self.config.endpoint
        );

        let response = self
            .http
            .post(self.config.endpoint.clone())
            .header(AUTHORIZATION, credential.bearer())
            .json(&self.request_body(params))
            .send()
            .await
            .map_err(|e| {
                warn!("Verification request failed: {e}");
                VerificationError::NetworkFailure {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!("Verification response could not be read: {e}");
            VerificationError::NetworkFailure {
                reason: e.to_string(),
            }
        })?;
        let body: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let message = rejection_message(body.as_ref());
            warn!("Verification rejected with HTTP {status}: {message}");
            return Err(VerificationError::BackendRejected {
                status: status.as_u16(),
                message,
            });
        }

        match body {
            Some(Value::Object(payload)) => {
                info!("Payment {} verified", params.reference_id);
                Ok(payload)
            }
            _ => {
                warn!("Verification succeeded with HTTP {status} but body is not a JSON object");
                Err(VerificationError::BackendRejected {
                    status: status.as_u16(),
                    message: GENERIC_FAILURE.to_string(),
                })
            }
        }
    }
}

/// Reason for a rejection: `error`, then `detail`, then the generic fallback.
fn rejection_message(body: Option<&Value>) -> String {
    let Some(body) = body else {
        return GENERIC_FAILURE.to_string();
    };

    for key in ["error", "detail"] {
        match body.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return s.clone(),
            Some(Value::Null | Value::String(_)) | None => {}
            Some(other) => return other.to_string(),
        }
    }

    GENERIC_FAILURE.to_string()
}
