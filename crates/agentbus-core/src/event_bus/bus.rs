//! Event Bus implementation.
//!
//! Provides the core EventBus struct and global instance for
//! application-wide event distribution.

use chrono::{DateTime, Utc};
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use super::config::{EventBusConfig, FailurePolicy};
use super::events::{Event, EventType};
use super::history::{DeliveryRecord, History};
use super::subscriber::{Registration, Subscriber, SubscriberId};
use crate::error::{BusError, Result};

/// Event waiting to be delivered
struct Pending {
    event: Box<dyn Event>,
    reentrant: bool,
}

/// Dispatch state, only touched while holding the dispatch lock
#[derive(Default)]
struct DispatchState {
    dispatching: bool,
    queue: VecDeque<Pending>,
}

/// Running totals across the lifetime of a bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events accepted by `post`.
    pub posted: u64,
    /// Successful and failed `notify` calls.
    pub delivered: u64,
    /// Notifications skipped because the subscriber originated the event.
    pub suppressed: u64,
    /// `notify` calls that returned an error.
    pub failed: u64,
    /// Events discarded by queue overflow or an aborted post.
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    posted: AtomicU64,
    delivered: AtomicU64,
    suppressed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> BusStats {
        BusStats {
            posted: self.posted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Central event bus for routing events to subscribers by event type
///
/// Delivery is synchronous. An event reaches the subscribers registered for
/// its concrete type in registration order. Events posted from inside a
/// subscriber are queued and delivered, oldest first, once the current event
/// has reached every subscriber.
pub struct EventBus {
    /// Subscribers per event type, in registration order
    subscriptions: RwLock<HashMap<EventType, Vec<Registration>>>,
    /// Serializes top-level posts; re-entrant on the dispatching thread
    dispatch: ReentrantMutex<RefCell<DispatchState>>,
    /// Delivery log (optional)
    history: RwLock<History>,
    counters: Counters,
    /// Configuration
    config: EventBusConfig,
}

impl EventBus {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            dispatch: ReentrantMutex::new(RefCell::new(DispatchState::default())),
            history: RwLock::new(History::default()),
            counters: Counters::default(),
            config,
        }
    }

    /// Register `subscriber` for events of `event_type`.
    ///
    /// Returns false if it was already registered for that type.
    pub fn register(&self, subscriber: &Arc<dyn Subscriber>, event_type: EventType) -> bool {
        self.insert(Registration::new(Arc::downgrade(subscriber)), event_type)
    }

    /// Register `subscriber` for events of type `E`.
    pub fn subscribe<E: Event>(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.register(subscriber, EventType::of::<E>())
    }

    /// Register a subscriber through a weak handle.
    pub fn register_weak(
        &self,
        subscriber: Weak<dyn Subscriber>,
        event_type: EventType,
    ) -> Result<bool> {
        let registration = Registration::new(subscriber);
        if !registration.is_alive() {
            return Err(BusError::SubscriberDropped {
                subscriber: registration.id,
            });
        }
        Ok(self.insert(registration, event_type))
    }

    /// Register `subscriber` for every type in `event_types`.
    ///
    /// Returns how many of the registrations were new.
    pub fn register_all(
        &self,
        subscriber: &Arc<dyn Subscriber>,
        event_types: &[EventType],
    ) -> Result<usize> {
        if event_types.is_empty() {
            return Err(BusError::EmptyTypeList);
        }
        Ok(event_types
            .iter()
            .filter(|ty| self.register(subscriber, **ty))
            .count())
    }

    /// Remove `subscriber` from the list for `event_type`.
    ///
    /// Returns true if it was registered.
    pub fn remove(&self, subscriber: &Arc<dyn Subscriber>, event_type: EventType) -> bool {
        self.remove_id(SubscriberId::of(subscriber), event_type)
    }

    /// Remove the subscriber identified by `id` from the list for `event_type`.
    pub fn remove_id(&self, id: SubscriberId, event_type: EventType) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let Some(registrations) = subscriptions.get_mut(&event_type) else {
            return false;
        };

        let removed = registrations.iter().any(|r| r.id == id);
        registrations.retain(|r| r.id != id && r.is_alive());
        if registrations.is_empty() {
            subscriptions.remove(&event_type);
        }
        if removed {
            tracing::debug!("Subscriber {} removed from {}", id, event_type);
        }
        removed
    }

    /// Remove `subscriber` from the list of every type in `event_types`.
    pub fn remove_all(
        &self,
        subscriber: &Arc<dyn Subscriber>,
        event_types: &[EventType],
    ) -> Result<usize> {
        if event_types.is_empty() {
            return Err(BusError::EmptyTypeList);
        }
        let id = SubscriberId::of(subscriber);
        Ok(event_types
            .iter()
            .filter(|ty| self.remove_id(id, **ty))
            .count())
    }

    /// Remove `subscriber` from every event type.
    ///
    /// Returns the number of types it was removed from.
    pub fn remove_subscriber(&self, subscriber: &Arc<dyn Subscriber>) -> usize {
        self.remove_subscriber_id(SubscriberId::of(subscriber))
    }

    /// Remove the subscriber identified by `id` from every event type.
    pub fn remove_subscriber_id(&self, id: SubscriberId) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let mut count = 0;
        subscriptions.retain(|_, registrations| {
            if registrations.iter().any(|r| r.id == id) {
                registrations.retain(|r| r.id != id);
                count += 1;
            }
            registrations.iter().any(Registration::is_alive)
        });
        if count > 0 {
            tracing::debug!("Subscriber {} removed from {} event types", id, count);
        }
        count
    }

    /// Whether at least one live subscriber is registered for exactly `event_type`.
    pub fn has_listener_for(&self, event_type: EventType) -> bool {
        self.subscriptions
            .read()
            .get(&event_type)
            .is_some_and(|registrations| registrations.iter().any(Registration::is_alive))
    }

    /// Number of live subscribers registered for `event_type`.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.subscriptions
            .read()
            .get(&event_type)
            .map_or(0, |registrations| {
                registrations.iter().filter(|r| r.is_alive()).count()
            })
    }

    /// Event types that currently have at least one registration.
    pub fn registered_types(&self) -> Vec<EventType> {
        self.subscriptions.read().keys().copied().collect()
    }

    /// Whether a delivery is in progress.
    ///
    /// Reports true for a delivery running on another thread as well.
    pub fn is_dispatching(&self) -> bool {
        let Some(guard) = self.dispatch.try_lock() else {
            return true;
        };
        let dispatching = guard.borrow().dispatching;
        dispatching
    }

    /// Post an event to its subscribers
    ///
    /// Returns once the event, and every event posted while delivering it, has
    /// been delivered. Called from inside a subscriber, it queues the event and
    /// returns immediately.
    pub fn post<E: Event>(&self, event: E) -> Result<()> {
        self.post_boxed(Box::new(event))
    }

    /// Post an already boxed event.
    pub fn post_boxed(&self, event: Box<dyn Event>) -> Result<()> {
        let guard = self.dispatch.lock();
        {
            let mut state = guard.borrow_mut();
            if state.dispatching {
                return self.enqueue(&mut state, event);
            }
            state.dispatching = true;
        }
        self.counters.posted.fetch_add(1, Ordering::Relaxed);

        let _reset = DispatchReset {
            state: &*guard,
            counters: &self.counters,
        };

        let mut next = Some(Pending {
            event,
            reentrant: false,
        });
        while let Some(pending) = next {
            self.deliver(pending)?;
            next = guard.borrow_mut().queue.pop_front();
        }
        Ok(())
    }

    /// Get recent delivery records (if enabled)
    ///
    /// Returns records since the given instant, or the whole log if None.
    pub fn history(&self, since: Option<DateTime<Utc>>) -> Vec<DeliveryRecord> {
        if !self.config.enable_history {
            return Vec::new();
        }
        self.history.read().since(since)
    }

    /// Clear the delivery log
    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    /// Totals since the bus was created.
    pub fn stats(&self) -> BusStats {
        self.counters.snapshot()
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn insert(&self, registration: Registration, event_type: EventType) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let registrations = subscriptions.entry(event_type).or_default();
        registrations.retain(Registration::is_alive);
        if registrations.iter().any(|r| r.id == registration.id) {
            return false;
        }
        tracing::debug!("Subscriber {} registered for {}", registration.id, event_type);
        registrations.push(registration);
        true
    }

    fn enqueue(&self, state: &mut DispatchState, event: Box<dyn Event>) -> Result<()> {
        let event_type = event.event_type();
        if state.queue.len() >= self.config.max_pending_events {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Pending queue full ({} events), dropping {}",
                self.config.max_pending_events, event_type
            );
            return Err(BusError::QueueOverflow {
                limit: self.config.max_pending_events,
                event_type,
            });
        }
        tracing::trace!("Queued re-entrant {} behind current delivery", event_type);
        self.counters.posted.fetch_add(1, Ordering::Relaxed);
        state.queue.push_back(Pending {
            event,
            reentrant: true,
        });
        Ok(())
    }

    /// Copy the live subscribers for `event_type`, pruning dropped ones
    fn snapshot(&self, event_type: EventType) -> Vec<Registration> {
        let (live, has_dropped) = {
            let subscriptions = self.subscriptions.read();
            let Some(registrations) = subscriptions.get(&event_type) else {
                return Vec::new();
            };
            let live: Vec<Registration> = registrations
                .iter()
                .filter(|r| r.is_alive())
                .cloned()
                .collect();
            let has_dropped = live.len() < registrations.len();
            (live, has_dropped)
        };

        if has_dropped {
            let mut subscriptions = self.subscriptions.write();
            if let Some(registrations) = subscriptions.get_mut(&event_type) {
                registrations.retain(Registration::is_alive);
                if registrations.is_empty() {
                    subscriptions.remove(&event_type);
                }
            }
            tracing::debug!("Pruned dropped subscribers of {}", event_type);
        }
        live
    }

    /// One delivery pass: notify every subscriber in the snapshot
    fn deliver(&self, pending: Pending) -> Result<()> {
        let event = pending.event.as_ref();
        let event_type = event.event_type();
        let span = tracing::debug_span!(
            "deliver",
            event = %event_type,
            reentrant = pending.reentrant
        );
        let _enter = span.enter();

        let source = if self.config.suppress_self_notification {
            event.source()
        } else {
            None
        };

        let mut record = DeliveryRecord::start(event_type.short_name(), pending.reentrant);
        let mut outcome = Ok(());

        for registration in self.snapshot(event_type) {
            if source == Some(registration.id) {
                tracing::trace!("Skipping {}, it originated the event", registration.id);
                record.suppressed += 1;
                continue;
            }
            let Some(subscriber) = registration.upgrade() else {
                continue;
            };

            tracing::trace!("Notifying {}", registration.id);
            record.notified += 1;
            if let Err(err) = subscriber.notify(event, self) {
                record.failed += 1;
                match self.config.failure_policy {
                    FailurePolicy::Isolate => {
                        tracing::warn!(
                            "Subscriber {} failed to handle {}: {:#}",
                            registration.id, event_type, err
                        );
                    }
                    FailurePolicy::Propagate => {
                        outcome = Err(BusError::SubscriberFailed {
                            event_type,
                            subscriber: registration.id,
                            source: err,
                        });
                        break;
                    }
                }
            }
        }

        self.finish(record);
        outcome
    }

    fn finish(&self, record: DeliveryRecord) {
        self.counters
            .delivered
            .fetch_add(record.notified as u64, Ordering::Relaxed);
        self.counters
            .suppressed
            .fetch_add(record.suppressed as u64, Ordering::Relaxed);
        self.counters
            .failed
            .fetch_add(record.failed as u64, Ordering::Relaxed);

        if record.notified == 0 && record.suppressed == 0 {
            tracing::trace!("No subscribers for {}", record.event_type);
        }
        if self.config.enable_history {
            self.history.write().push(record, &self.config);
        }
    }
}

/// Restores the idle dispatch state when a top-level post ends,
/// including by error or unwinding
struct DispatchReset<'a> {
    state: &'a RefCell<DispatchState>,
    counters: &'a Counters,
}

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.dispatching = false;
        let discarded = state.queue.len();
        if discarded > 0 {
            state.queue.clear();
            self.counters
                .dropped
                .fetch_add(discarded as u64, Ordering::Relaxed);
            tracing::debug!("Discarded {} pending events after aborted delivery", discarded);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.subscriptions.read().len())
            .field("config", &self.config)
            .finish()
    }
}

/// Global event bus instance
static EVENT_BUS: OnceLock<EventBus> = OnceLock::new();

/// Get or initialize the global event bus
///
/// Components that are not handed a bus explicitly can share this one.
pub fn event_bus() -> &'static EventBus {
    EVENT_BUS.get_or_init(EventBus::new)
}

/// Initialize the global event bus with custom configuration
///
/// Must be called before any calls to `event_bus()`. Returns the rejected
/// configuration if the event bus has already been initialized.
pub fn init_event_bus(config: EventBusConfig) -> std::result::Result<(), EventBusConfig> {
    EVENT_BUS
        .set(EventBus::with_config(config))
        .map_err(|bus| bus.config.clone())
}

/// Convenience macro to post an event to the global event bus
#[macro_export]
macro_rules! post {
    ($event:expr) => {
        $crate::event_bus::event_bus().post($event)
    };
}
