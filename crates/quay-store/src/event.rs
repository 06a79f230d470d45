//! Change notifications scoped to one queue keyspace.

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::key::QueueKey;

/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEventKind {
    /// A new position was written.
    Inserted,
    /// An existing position was overwritten.
    Updated,
    /// A position was removed.
    Deleted,
}

/// A change to one queue position.
///
/// Delivery is at-least-once with no ordering across partitions. Consumers
/// should treat an event as "re-check", not as a state transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEvent {
    /// Kind of change.
    pub kind: QueueEventKind,
    /// Affected position.
    pub key: QueueKey,
    /// Previous value (deletes and updates).
    pub old_value: Option<Bytes>,
    /// New value (inserts and updates).
    pub new_value: Option<Bytes>,
}

impl QueueEvent {
    /// An insert event.
    pub fn inserted(key: QueueKey, value: Bytes) -> Self {
        Self {
            kind: QueueEventKind::Inserted,
            key,
            old_value: None,
            new_value: Some(value),
        }
    }

    /// A delete event.
    pub fn deleted(key: QueueKey, value: Bytes) -> Self {
        Self {
            kind: QueueEventKind::Deleted,
            key,
            old_value: Some(value),
            new_value: None,
        }
    }
}

/// Receives change notifications for one queue keyspace.
///
/// Called on the store's delivery path; implementations must not block.
pub trait StoreListener: Send + Sync {
    /// Handle one change.
    fn on_event(&self, event: &QueueEvent);
}

/// Handle returned by listener registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);
