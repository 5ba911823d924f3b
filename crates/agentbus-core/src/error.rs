//! Error handling for the event bus
//!
//! Two kinds of failure reach callers:
//! - Contract violations (bad arguments to register/remove/post), reported
//!   before any state changes
//! - Subscriber failures, reported from the top-level `post` that was
//!   delivering when a subscriber returned an error
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::event_bus::{EventType, SubscriberId};

/// Event bus error type
#[derive(Error, Debug)]
pub enum BusError {
    /// A batch operation was given no event types
    #[error("Event type list is empty")]
    EmptyTypeList,

    /// A weak subscriber handle no longer points at a live subscriber
    #[error("Subscriber {subscriber} was dropped before registration")]
    SubscriberDropped {
        /// Identity of the dropped subscriber.
        subscriber: SubscriberId,
    },

    /// Too many events were queued by re-entrant posts
    #[error("Pending event queue is full ({limit} events), dropped {event_type}")]
    QueueOverflow {
        /// The configured queue limit.
        limit: usize,
        /// The event type that was dropped.
        event_type: EventType,
    },

    /// A subscriber returned an error while handling an event
    #[error("Subscriber {subscriber} failed to handle {event_type}: {source}")]
    SubscriberFailed {
        /// The event type being delivered.
        event_type: EventType,
        /// Identity of the failing subscriber.
        subscriber: SubscriberId,
        /// The error returned by the subscriber.
        #[source]
        source: anyhow::Error,
    },
}

impl BusError {
    /// Check if this error was caused by the caller's arguments
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            BusError::EmptyTypeList | BusError::SubscriberDropped { .. }
        )
    }

    /// Check if this error came from a subscriber callback
    pub fn is_subscriber_failure(&self) -> bool {
        matches!(self, BusError::SubscriberFailed { .. })
    }
}

/// Result type using BusError
pub type Result<T> = std::result::Result<T, BusError>;
