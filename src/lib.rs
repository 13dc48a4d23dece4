//! # jeewanjyoti-client
//!
//! Client-side payment confirmation for JeewanJyoti Digital Care.
//!
//! When a user comes back from the Khalti payment gateway, the transaction
//! has to be confirmed with the JeewanJyoti backend before the appointment or
//! loved-one mapping is shown as paid. This crate provides:
//! - A redirect-verification flow shared by the payment and mapping callbacks
//! - The HTTP verification client behind it
//! - Session token storage, expiry checks and refresh
//!
//! ## Example
//!
//! ```rust,no_run
//! use jeewanjyoti_client::{
//!     ClientConfig, FileSessionStore, FlowBuilder, FlowKind, VerificationClient,
//!     VerificationClientConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let flow_config = config.flow(FlowKind::Mapping).clone();
//!     let client = VerificationClient::new(VerificationClientConfig::from_flow(
//!         &config,
//!         &flow_config,
//!     )?)?;
//!
//!     let flow = FlowBuilder::new(
//!         FlowKind::Mapping,
//!         flow_config,
//!         "?pidx=bZQLD9&purchase_order_id=MAP-17&status=Completed",
//!     )
//!     .credentials(Arc::new(FileSessionStore::new(&config.session_file)))
//!     .verifier(Arc::new(client))
//!     .build()?;
//!
//!     flow.activate()?;
//!     println!("{:?}", flow.wait_terminal().await);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod event;
pub mod flow;
pub mod navigation;
pub mod payment;
pub mod redirect;
pub mod session;

pub use config::{ClientConfig, FlowConfig, FlowKind};
pub use error::{Error, Result};
pub use event::{FlowEvent, FlowEventsChannel};
pub use flow::{FlowBuilder, FlowController};
pub use navigation::{Navigator, RecordingNavigator, TracingNavigator};
pub use payment::{
    Payload, VerificationClient, VerificationClientConfig, VerificationError,
    VerificationOutcome, Verifier,
};
pub use redirect::{extract_params, MissingParams, ParamNames, RedirectParams};
pub use session::{
    Credential, CredentialProvider, FileSessionStore, RefreshOutcome, Session, StaticCredential,
    TokenRefresher,
};
