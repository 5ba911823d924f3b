//! # Event Bus Module
//!
//! In-process publish/subscribe router that decouples application agents from
//! each other.
//!
//! ## Overview
//!
//! - Publishers post typed events without knowing who listens
//! - Subscribers register per concrete event type and are notified in
//!   registration order
//! - The bus holds only weak references; dropping a subscriber unsubscribes it
//! - Events posted while a delivery is running are queued and delivered in
//!   FIFO order after it, never interleaved
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use agentbus_core::event_bus::{Event, EventBus, Subscriber};
//!
//! #[derive(Debug)]
//! struct ImageSelected {
//!     image_id: u64,
//! }
//! impl Event for ImageSelected {}
//!
//! let bus = EventBus::new();
//! let viewer: Arc<dyn Subscriber> = Arc::new(|event: &dyn Event, _: &EventBus| -> anyhow::Result<()> {
//!     if let Some(selected) = event.downcast_ref::<ImageSelected>() {
//!         println!("showing image {}", selected.image_id);
//!     }
//!     Ok(())
//! });
//!
//! bus.subscribe::<ImageSelected>(&viewer);
//! bus.post(ImageSelected { image_id: 42 }).unwrap();
//!
//! // Stop listening when done
//! bus.remove_subscriber(&viewer);
//! ```

mod bus;
mod config;
mod events;
mod history;
mod subscriber;

pub use bus::*;
pub use config::{EventBusConfig, FailurePolicy};
pub use events::{Event, EventType};
pub use history::DeliveryRecord;
pub use subscriber::{Subscriber, SubscriberId};
