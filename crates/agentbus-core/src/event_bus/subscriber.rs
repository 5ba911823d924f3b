//! Subscriber capability and identity.

use std::fmt;
use std::sync::{Arc, Weak};

use super::bus::EventBus;
use super::events::Event;

/// Receiver of events posted to an [`EventBus`].
///
/// `notify` runs synchronously on the posting thread. Posting from inside
/// `notify` is allowed; the new event is queued and delivered after the
/// current one has reached every subscriber.
pub trait Subscriber: Send + Sync {
    /// Handle one event.
    fn notify(&self, event: &dyn Event, bus: &EventBus) -> anyhow::Result<()>;
}

impl<F> Subscriber for F
where
    F: Fn(&dyn Event, &EventBus) -> anyhow::Result<()> + Send + Sync,
{
    fn notify(&self, event: &dyn Event, bus: &EventBus) -> anyhow::Result<()> {
        self(event, bus)
    }
}

/// Identity of a subscriber allocation.
///
/// Two handles compare equal when they point at the same subscriber object.
/// Events record the id of their originator so the bus can skip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(usize);

impl SubscriberId {
    /// Id of the object behind `subscriber`.
    pub fn of<T: ?Sized>(subscriber: &Arc<T>) -> Self {
        Self(Arc::as_ptr(subscriber) as *const () as usize)
    }

    /// Id of a subscriber seen through a plain reference.
    ///
    /// Inside `notify`, `SubscriberId::of_ref(self)` equals the id of the
    /// `Arc` the subscriber was registered with.
    pub fn of_ref<T: ?Sized>(subscriber: &T) -> Self {
        Self(subscriber as *const T as *const () as usize)
    }

    /// Id of the object behind a weak handle.
    pub fn of_weak<T: ?Sized>(subscriber: &Weak<T>) -> Self {
        Self(Weak::as_ptr(subscriber) as *const () as usize)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({:#x})", self.0)
    }
}

/// Non-owning table entry.
///
/// The weak handle keeps the allocation (not the subscriber) alive, so the
/// address behind `id` cannot be reused while the entry exists.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) id: SubscriberId,
    pub(crate) subscriber: Weak<dyn Subscriber>,
}

impl Registration {
    pub(crate) fn new(subscriber: Weak<dyn Subscriber>) -> Self {
        Self {
            id: SubscriberId::of_weak(&subscriber),
            subscriber,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.subscriber.strong_count() > 0
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn Subscriber>> {
        self.subscriber.upgrade()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
