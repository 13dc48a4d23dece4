//! Flow event system.

use crate::config::FlowKind;
use tokio::sync::broadcast;

/// Events emitted by a redirect-verification flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Flow was activated.
    Activated {
        /// Which flow.
        flow: FlowKind,
    },

    /// Redirect identifiers were missing; no request will be sent.
    ParametersMissing {
        /// Missing parameter names.
        missing: Vec<String>,
    },

    /// Verification handed to the verifier. The verifier may still decide
    /// not to send a request.
    VerificationStarted {
        /// Reference id being verified.
        reference_id: String,
    },

    /// Flow reached a terminal state.
    Resolved {
        /// Whether the terminal state is success.
        success: bool,
    },

    /// A verification result arrived after teardown and was dropped.
    Discarded,

    /// Flow was torn down.
    TornDown,

    /// User was sent to the destination route.
    Navigated {
        /// Destination route.
        destination: String,
    },
}

/// Channel for receiving flow events.
pub type FlowEventsChannel = broadcast::Receiver<FlowEvent>;

/// Sender for flow events.
pub type FlowEventsSender = broadcast::Sender<FlowEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (FlowEventsSender, FlowEventsChannel) {
    broadcast::channel(64)
}
