//! Verification outcomes and their user-facing error taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Confirmation data returned by the backend on success.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Message shown when the backend gives no usable reason.
pub(crate) const GENERIC_FAILURE: &str = "Something went wrong";

/// Why a verification ended in the error state.
///
/// The `Display` text is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Required redirect identifiers were absent.
    #[error("Missing payment information. Please contact support.")]
    MissingParameters {
        /// Parameter names that were not found.
        missing: Vec<String>,
    },

    /// The gateway reported a status other than the success marker.
    #[error("Payment was not completed.")]
    StatusNotCompleted {
        /// Status the gateway reported.
        status: String,
    },

    /// No stored access token.
    #[error("{message}")]
    Unauthenticated {
        /// Text shown to the user.
        message: &'static str,
    },

    /// The backend answered with a failure status.
    #[error("{message}")]
    BackendRejected {
        /// HTTP status code.
        status: u16,
        /// Reason given by the backend, or a generic fallback.
        message: String,
    },

    /// The request did not complete.
    #[error("Network error. Try again.")]
    NetworkFailure {
        /// Underlying transport error, for logs only.
        reason: String,
    },
}

impl VerificationError {
    /// No credential was handed to the verification client.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated {
            message: "Authentication required",
        }
    }

    /// The session holds no access token; the user must log in again.
    #[must_use]
    pub fn login_required() -> Self {
        Self::Unauthenticated {
            message: "Authentication required. Please login again.",
        }
    }
}

/// State of a redirect-verification flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum VerificationOutcome {
    /// No result yet.
    #[default]
    Pending,
    /// Verification failed.
    Error {
        /// Message shown to the user.
        message: String,
    },
    /// The backend confirmed the transaction.
    Success {
        /// Backend confirmation data, unchanged.
        payload: Payload,
    },
}

impl VerificationOutcome {
    /// True once the flow has reached `Error` or `Success`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The error message, if this is an error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// The confirmation payload, if this is a success.
    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }
}

impl From<VerificationError> for VerificationOutcome {
    fn from(e: VerificationError) -> Self {
        Self::Error {
            message: e.to_string(),
        }
    }
}

impl From<Result<Payload, VerificationError>> for VerificationOutcome {
    fn from(result: Result<Payload, VerificationError>) -> Self {
        match result {
            Ok(payload) => Self::Success { payload },
            Err(e) => e.into(),
        }
    }
}
