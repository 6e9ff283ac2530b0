//! Dashboard events and the broadcast bus that carries them to SSE clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events pushed to connected browsers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashboardEvent {
    /// A new dataset replaced the previous one
    DatasetReloaded {
        /// Workbook the dataset came from
        source: String,
        records: usize,
        rows_dropped: usize,
        warnings: usize,
        timestamp: DateTime<Utc>,
    },

    /// A reload attempt failed; the previous dataset stays in service
    ReloadFailed {
        source: Option<String>,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl DashboardEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::DatasetReloaded { .. } => "DatasetReloaded",
            DashboardEvent::ReloadFailed { .. } => "ReloadFailed",
        }
    }
}

/// Fan-out of dashboard events over `tokio::sync::broadcast`
///
/// Slow subscribers lag and skip events rather than blocking the sender.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Receiver for every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// Send to all subscribers; having none is fine
    pub fn emit_lossy(&self, event: DashboardEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
