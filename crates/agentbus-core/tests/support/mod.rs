#![allow(dead_code)]

use agentbus_core::{Event, EventBus, Subscriber, SubscriberId};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
pub struct Ping {
    pub seq: u32,
    pub source: Option<SubscriberId>,
}

impl Ping {
    pub fn new(seq: u32) -> Self {
        Self { seq, source: None }
    }

    pub fn sent_by(seq: u32, source: SubscriberId) -> Self {
        Self {
            seq,
            source: Some(source),
        }
    }
}

impl Event for Ping {
    fn source(&self) -> Option<SubscriberId> {
        self.source
    }
}

#[derive(Debug)]
pub struct Pong {
    pub seq: u32,
}

impl Event for Pong {}

/// Shared, ordered record of notifications as "name:Event#seq" strings.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn describe(event: &dyn Event) -> String {
    if let Some(ping) = event.downcast_ref::<Ping>() {
        format!("Ping#{}", ping.seq)
    } else if let Some(pong) = event.downcast_ref::<Pong>() {
        format!("Pong#{}", pong.seq)
    } else {
        event.event_type().to_string()
    }
}

/// Subscriber that writes every event it sees to a journal.
pub struct Recorder {
    name: &'static str,
    journal: Journal,
}

impl Recorder {
    pub fn new(name: &'static str, journal: &Journal) -> Arc<dyn Subscriber> {
        Arc::new(Self {
            name,
            journal: Arc::clone(journal),
        })
    }
}

impl Subscriber for Recorder {
    fn notify(&self, event: &dyn Event, _bus: &EventBus) -> anyhow::Result<()> {
        self.journal
            .lock()
            .push(format!("{}:{}", self.name, describe(event)));
        Ok(())
    }
}

/// Subscriber built from a closure that also journals under `name`.
pub fn reacting<F>(name: &'static str, journal: &Journal, react: F) -> Arc<dyn Subscriber>
where
    F: Fn(&dyn Event, &EventBus) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let journal = Arc::clone(journal);
    Arc::new(move |event: &dyn Event, bus: &EventBus| -> anyhow::Result<()> {
        journal.lock().push(format!("{}:{}", name, describe(event)));
        react(event, bus)
    })
}
