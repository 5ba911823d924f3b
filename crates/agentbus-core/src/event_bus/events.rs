//! Event trait and routing keys.
//!
//! Every value posted to the bus implements [`Event`]. The concrete Rust type
//! of the value is the routing key; it is captured as an [`EventType`] so the
//! subscription table can be keyed without reflection.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::subscriber::SubscriberId;

/// A value object announcing that something happened.
///
/// Events are plain data carriers. The only behaviour the bus asks of them is
/// the optional originator returned by [`Event::source`], used to avoid
/// notifying a subscriber about an event it posted itself.
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Subscriber that originated this event, if any.
    fn source(&self) -> Option<SubscriberId> {
        None
    }

    /// Routing key of the concrete event type.
    fn event_type(&self) -> EventType {
        EventType {
            id: TypeId::of::<Self>(),
            name: std::any::type_name::<Self>(),
        }
    }
}

impl dyn Event {
    /// Check whether this event is of concrete type `E`.
    pub fn is<E: Event>(&self) -> bool {
        let any: &dyn Any = self;
        any.is::<E>()
    }

    /// Borrow this event as its concrete type `E`.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        let any: &dyn Any = self;
        any.downcast_ref::<E>()
    }
}

/// Stable identifier of an event type.
///
/// Only types implementing [`Event`] can produce one, which is how the bus
/// restricts subscriptions to recognised event categories.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Key for the event type `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Fully qualified Rust name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

// `name` is derived from `id`; equality and hashing only look at the TypeId.
impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
