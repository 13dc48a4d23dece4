//! Redirect-verification flow controller.
//!
//! One controller corresponds to one mount of a payment-callback view. It
//! starts `Pending`, moves exactly once to `Error` or `Success`, and stays
//! there. At most one verification request is sent per controller, and no
//! state is applied after [`FlowController::teardown`].

use crate::config::{FlowConfig, FlowKind};
use crate::error::{Error, Result};
use crate::event::{create_event_channel, FlowEvent, FlowEventsChannel, FlowEventsSender};
use crate::navigation::{Navigator, TracingNavigator};
use crate::payment::{VerificationError, VerificationOutcome, Verifier};
use crate::redirect::extract_params;
use crate::session::CredentialProvider;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Builder for a [`FlowController`].
pub struct FlowBuilder {
    kind: FlowKind,
    config: FlowConfig,
    query: String,
    credentials: Option<Arc<dyn CredentialProvider>>,
    verifier: Option<Arc<dyn Verifier>>,
    navigator: Option<Arc<dyn Navigator>>,
    events_tx: Option<FlowEventsSender>,
}

impl FlowBuilder {
    /// Start building a flow of `kind` for the redirect `query`.
    #[must_use]
    pub fn new(kind: FlowKind, config: FlowConfig, query: impl Into<String>) -> Self {
        Self {
            kind,
            config,
            query: query.into(),
            credentials: None,
            verifier: None,
            navigator: None,
            events_tx: None,
        }
    }

    /// Source of the access token.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Backend verifier.
    #[must_use]
    pub fn verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Navigation capability. Defaults to [`TracingNavigator`].
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Publish events on an existing channel instead of a private one.
    #[must_use]
    pub fn events(mut self, events_tx: FlowEventsSender) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Build the controller. Nothing runs until [`FlowController::activate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the credential provider or verifier is missing.
    pub fn build(self) -> Result<FlowController> {
        let credentials = self
            .credentials
            .ok_or_else(|| Error::Config("flow has no credential provider".to_string()))?;
        let verifier = self
            .verifier
            .ok_or_else(|| Error::Config("flow has no verifier".to_string()))?;
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator));
        let events_tx = self
            .events_tx
            .unwrap_or_else(|| create_event_channel().0);

        let (state_tx, _) = watch::channel(VerificationOutcome::Pending);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(FlowController {
            kind: self.kind,
            config: self.config,
            query: self.query,
            credentials,
            verifier,
            navigator,
            shared: Arc::new(Shared {
                state_tx,
                mounted: Mutex::new(true),
                events_tx,
            }),
            shutdown_tx,
            activated: AtomicBool::new(false),
        })
    }
}

/// State shared with the spawned verification task.
struct Shared {
    state_tx: watch::Sender<VerificationOutcome>,
    /// Cleared by teardown; held while an outcome is applied.
    mounted: Mutex<bool>,
    events_tx: FlowEventsSender,
}

impl Shared {
    /// Apply a terminal outcome unless the flow was torn down or already resolved.
    fn apply(&self, outcome: VerificationOutcome) -> bool {
        let mounted = self.mounted.lock();
        if !*mounted {
            debug!("Flow torn down; discarding verification result");
            let _ = self.events_tx.send(FlowEvent::Discarded);
            return false;
        }
        if self.state_tx.borrow().is_terminal() {
            return false;
        }

        let success = matches!(outcome, VerificationOutcome::Success { .. });
        self.state_tx.send_replace(outcome);
        drop(mounted);

        let _ = self.events_tx.send(FlowEvent::Resolved { success });
        true
    }
}

/// A mounted redirect-verification flow.
pub struct FlowController {
    kind: FlowKind,
    config: FlowConfig,
    query: String,
    credentials: Arc<dyn CredentialProvider>,
    verifier: Arc<dyn Verifier>,
    navigator: Arc<dyn Navigator>,
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    activated: AtomicBool,
}

impl FlowController {
    /// Which flow this is.
    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    /// Route offered once the flow is terminal.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.config.destination
    }

    /// Run the flow. Only the first call does anything.
    ///
    /// Missing identifiers and a missing access token resolve the flow
    /// immediately. Otherwise the verification request is spawned on the
    /// current tokio runtime and this returns without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if a request has to be sent and there is no tokio
    /// runtime to run it on.
    pub fn activate(&self) -> Result<()> {
        if self.activated.swap(true, Ordering::SeqCst) {
            debug!("{} flow already activated", self.kind);
            return Ok(());
        }
        if !*self.shared.mounted.lock() {
            debug!("{} flow torn down before activation", self.kind);
            return Ok(());
        }

        info!("Activating {} verification flow", self.kind);
        let _ = self
            .shared
            .events_tx
            .send(FlowEvent::Activated { flow: self.kind });

        let params = match extract_params(&self.query, &self.config.param_names()) {
            Ok(params) => params,
            Err(missing) => {
                warn!("{missing}");
                let _ = self.shared.events_tx.send(FlowEvent::ParametersMissing {
                    missing: missing.missing.clone(),
                });
                self.shared.apply(
                    VerificationError::MissingParameters {
                        missing: missing.missing,
                    }
                    .into(),
                );
                return Ok(());
            }
        };

        let Some(credential) = self.credentials.access_token() else {
            warn!("No access token stored; {} verification needs a login", self.kind);
            self.shared
                .apply(VerificationError::login_required().into());
            return Ok(());
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                // Leave the flow activatable once a runtime is available.
                self.activated.store(false, Ordering::SeqCst);
                return Err(Error::Flow(format!("activation needs a tokio runtime: {e}")));
            }
        };

        let verifier = Arc::clone(&self.verifier);
        let shared = Arc::clone(&self.shared);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let _ = self.shared.events_tx.send(FlowEvent::VerificationStarted {
            reference_id: params.reference_id.clone(),
        });

        runtime.spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    debug!("Verification of {} cancelled", params.reference_id);
                    let _ = shared.events_tx.send(FlowEvent::Discarded);
                }
                result = verifier.verify(&params, Some(&credential)) => {
                    shared.apply(result.into());
                }
            }
        });

        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> VerificationOutcome {
        self.shared.state_tx.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VerificationOutcome> {
        self.shared.state_tx.subscribe()
    }

    /// Subscribe to flow events.
    #[must_use]
    pub fn subscribe_events(&self) -> FlowEventsChannel {
        self.shared.events_tx.subscribe()
    }

    /// Wait until the flow is terminal.
    ///
    /// Returns `None` if the flow was never activated, or is torn down
    /// before it resolves.
    pub async fn wait_terminal(&self) -> Option<VerificationOutcome> {
        let current = self.state();
        if current.is_terminal() {
            return Some(current);
        }
        if !self.activated.load(Ordering::SeqCst) {
            return None;
        }

        let mut state_rx = self.subscribe();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::select! {
            result = state_rx.wait_for(VerificationOutcome::is_terminal) => {
                result.ok().map(|outcome| (*outcome).clone())
            }
            _ = shutdown_rx.wait_for(|down| *down) => None,
        }
    }

    /// The user action offered in both terminal states.
    ///
    /// # Errors
    ///
    /// Returns an error while the flow is still pending or after teardown.
    pub fn navigate_to_destination(&self) -> Result<()> {
        if !*self.shared.mounted.lock() {
            return Err(Error::Flow("flow was torn down".to_string()));
        }
        if !self.state().is_terminal() {
            return Err(Error::Flow("verification is still pending".to_string()));
        }

        self.navigator.navigate(&self.config.destination);
        let _ = self.shared.events_tx.send(FlowEvent::Navigated {
            destination: self.config.destination.clone(),
        });
        Ok(())
    }

    /// Unmount the flow. A pending request is cancelled and its result
    /// is never applied.
    pub fn teardown(&self) {
        {
            let mut mounted = self.shared.mounted.lock();
            if !*mounted {
                return;
            }
            *mounted = false;
        }

        self.shutdown_tx.send_replace(true);
        let _ = self.shared.events_tx.send(FlowEvent::TornDown);
        debug!("{} flow torn down", self.kind);
    }
}

impl Drop for FlowController {
    fn drop(&mut self) {
        self.teardown();
    }
}
