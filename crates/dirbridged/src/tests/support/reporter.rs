//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use dirbridge_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;
use crate::directory::StatsSnapshot;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The listener accepted connections on the endpoint.
    ListenerReady(SocketEndpoint),
    /// The bridge stopped with the final counters.
    ShutdownCompleted(StatsSnapshot),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Endpoint reported by the most recent `listener_ready` event.
    #[must_use]
    pub fn ready_endpoint(&self) -> Option<SocketEndpoint> {
        self.events().into_iter().rev().find_map(|event| match event {
            HealthEvent::ListenerReady(endpoint) => Some(endpoint),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerReady(endpoint.clone()));
    }

    fn shutdown_completed(&self, stats: &StatsSnapshot) {
        self.record(HealthEvent::ShutdownCompleted(*stats));
    }
}
