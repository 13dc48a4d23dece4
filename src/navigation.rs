//! Navigation capability for the post-verification action.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Sends the user to an application route.
pub trait Navigator: Send + Sync {
    /// Navigate to `destination`.
    fn navigate(&self, destination: &str);
}

/// Logs the destination; for hosts without a router.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, destination: &str) {
        info!("Navigate to {destination}");
    }
}

/// Remembers every destination it was asked to visit.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Destinations visited so far, oldest first.
    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        self.visited.lock().push(destination.to_string());
    }
}
