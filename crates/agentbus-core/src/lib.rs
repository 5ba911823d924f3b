//! # AgentBus Core
//!
//! Core types and the event bus for AgentBus.
//! Provides the routing table, re-entrant delivery queue, subscriber
//! abstractions and bus error types.

pub mod error;
pub mod event_bus;

pub use error::{BusError, Result};

// Re-export event bus for convenience
pub use event_bus::{
    event_bus, init_event_bus, BusStats, DeliveryRecord, Event, EventBus, EventBusConfig,
    EventType, FailurePolicy, Subscriber, SubscriberId,
};
