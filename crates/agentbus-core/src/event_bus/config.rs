//! Event bus configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the bus does when a subscriber's `notify` returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the current top-level post and return the error to its caller.
    #[default]
    Propagate,
    /// Log the error and keep delivering to the remaining subscribers.
    Isolate,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagate"),
            Self::Isolate => write!(f, "isolate"),
        }
    }
}

/// Configuration for the event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Skip the subscriber an event names as its source.
    pub suppress_self_notification: bool,
    /// Handling of subscriber errors.
    pub failure_policy: FailurePolicy,
    /// Upper bound on events queued by re-entrant posts.
    pub max_pending_events: usize,
    /// Whether to keep a log of recent delivery passes.
    pub enable_history: bool,
    /// Maximum number of delivery records retained.
    pub max_history_size: usize,
    /// How long delivery records are retained, in seconds.
    pub history_retention_secs: u64,
}

impl EventBusConfig {
    /// Retention window for delivery records.
    pub fn history_retention(&self) -> Duration {
        Duration::from_secs(self.history_retention_secs)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            suppress_self_notification: true,
            failure_policy: FailurePolicy::Propagate,
            max_pending_events: 10_000,
            enable_history: false,
            max_history_size: 1000,
            history_retention_secs: 300,
        }
    }
}
