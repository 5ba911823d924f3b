//! Bounded log of recent delivery passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use super::config::EventBusConfig;

/// Outcome of one delivery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Unique id of the pass.
    pub id: Uuid,
    /// Short name of the delivered event type.
    pub event_type: String,
    /// When the pass started.
    pub posted_at: DateTime<Utc>,
    /// Subscribers whose `notify` ran.
    pub notified: usize,
    /// Subscribers skipped because they originated the event.
    pub suppressed: usize,
    /// Subscribers whose `notify` returned an error.
    pub failed: usize,
    /// Whether the event was queued by a post made during another pass.
    pub reentrant: bool,
}

impl DeliveryRecord {
    pub(crate) fn start(event_type: &str, reentrant: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.to_string(),
            posted_at: Utc::now(),
            notified: 0,
            suppressed: 0,
            failed: 0,
            reentrant,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct History {
    records: VecDeque<DeliveryRecord>,
}

impl History {
    /// Append a record, maintaining size and age limits
    pub(crate) fn push(&mut self, record: DeliveryRecord, config: &EventBusConfig) {
        let now = record.posted_at;
        self.records.push_back(record);

        // A window too large for chrono never expires anything.
        if let Ok(retention) = chrono::Duration::from_std(config.history_retention()) {
            while self
                .records
                .front()
                .is_some_and(|r| now.signed_duration_since(r.posted_at) > retention)
            {
                self.records.pop_front();
            }
        }

        while self.records.len() > config.max_history_size {
            self.records.pop_front();
        }
    }

    pub(crate) fn since(&self, since: Option<DateTime<Utc>>) -> Vec<DeliveryRecord> {
        match since {
            Some(since) => self
                .records
                .iter()
                .filter(|r| r.posted_at >= since)
                .cloned()
                .collect(),
            None => self.records.iter().cloned().collect(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
