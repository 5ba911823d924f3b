//! # AgentBus
//!
//! Typed, in-process publish/subscribe for decoupling application agents.
//!
//! ## Architecture
//!
//! AgentBus is organized as a workspace with multiple crates:
//!
//! 1. **agentbus-core** - Event bus, event and subscriber traits, errors
//! 2. **agentbus-settings** - Settings file loading and validation
//! 3. **agentbus** - Logging setup, sample agents and the demo binary
//!
//! ## Features
//!
//! - **Typed Routing**: Events are routed by their concrete Rust type
//! - **Ordered Delivery**: Subscribers are notified in registration order
//! - **Re-entrant Posting**: Events posted during delivery are queued FIFO
//! - **Weak Subscriptions**: The bus never keeps a subscriber alive

pub mod agents;

pub use agentbus_core::{
    event_bus, init_event_bus, BusError, BusStats, DeliveryRecord, Event, EventBus,
    EventBusConfig, EventType, FailurePolicy, Subscriber, SubscriberId,
};
pub use agentbus_settings::{LoggingSettings, Settings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, falling back to `settings.level`
/// - Pretty console output, or JSON lines when `settings.json` is set
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_ascii_lowercase()));

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_thread_ids(settings.thread_ids)
            .with_current_span(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(settings.thread_ids)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
