//! Error types for jeewanjyoti-client.
//!
//! These are infrastructure errors. Outcomes of a verification attempt are
//! reported through [`crate::payment::VerificationError`] instead and never
//! surface here.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jeewanjyoti-client.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client construction or request error.
    #[error("network error: {0}")]
    Network(String),

    /// Session store error.
    #[error("session error: {0}")]
    Session(String),

    /// Flow was used in a way its current state does not allow.
    #[error("flow error: {0}")]
    Flow(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
