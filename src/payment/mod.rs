//! Payment verification after a gateway redirect.
//!
//! The gateway sends the user back to the client with the transaction
//! identifiers in the query string. Before anything is shown as paid, the
//! backend has to confirm the transaction:
//!
//! ```text
//! Redirect received
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ Extract identifiers │── missing ──▶ Error (no request)
//! └─────────┬───────────┘
//!           ▼
//! ┌─────────────────────┐
//! │ Read access token   │── absent ───▶ Error (no request)
//! └─────────┬───────────┘
//!           ▼
//! ┌─────────────────────┐
//! │ Check status hint   │── not done ─▶ Error (no request)
//! └─────────┬───────────┘
//!           ▼
//!   POST verify endpoint
//!           │
//!    ┌──────┴──────┐
//!    │             │
//!   2xx        4xx/5xx, network
//!    │             │
//!    ▼             ▼
//!  Success       Error
//! ```

mod outcome;
mod verifier;

pub use outcome::{Payload, VerificationError, VerificationOutcome};
pub use verifier::{VerificationClient, VerificationClientConfig, Verifier};
