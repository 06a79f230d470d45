//! Result contracts of the queue processors.

use bytes::Bytes;
use quay_constants::position::APPEND_FAILED_ID;
use serde::Deserialize;
use serde::Serialize;

/// Outcome classification of an offer processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    /// The element was stored.
    Success,
    /// The queue is at its configured size limit.
    FailedCapacity,
    /// The offer failed for another reason (for example id space exhaustion).
    FailedOther,
}

/// Result of an offer processor: status plus the id assigned on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueOfferResult {
    /// Outcome classification.
    pub status: OfferStatus,
    /// Assigned element id, or [`APPEND_FAILED_ID`] when the offer failed.
    pub id: i64,
}

impl QueueOfferResult {
    /// A successful offer at `id`.
    pub const fn success(id: i64) -> Self {
        Self {
            status: OfferStatus::Success,
            id,
        }
    }

    /// An offer rejected because the queue is full.
    pub const fn capacity() -> Self {
        Self {
            status: OfferStatus::FailedCapacity,
            id: APPEND_FAILED_ID,
        }
    }

    /// An offer rejected for any other reason.
    pub const fn other() -> Self {
        Self {
            status: OfferStatus::FailedOther,
            id: APPEND_FAILED_ID,
        }
    }

    /// Whether the element was stored.
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OfferStatus::Success)
    }
}

/// Result of a peek or poll processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePollResult {
    /// The element at the requested end, if any.
    pub value: Option<Bytes>,
}

impl QueuePollResult {
    /// A result carrying an element.
    pub fn found(value: Bytes) -> Self {
        Self { value: Some(value) }
    }

    /// A result for an empty queue.
    pub const fn empty() -> Self {
        Self { value: None }
    }
}

/// One page of a traversal.
///
/// `cursor` is the last id observed and is the exclusive bound of the next
/// fetch. An empty `elements` vector means the traversal is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePage {
    /// Elements in traversal order.
    pub elements: Vec<Bytes>,
    /// Continuation cursor.
    pub cursor: i64,
}

impl QueuePage {
    /// The terminal page.
    pub fn end(cursor: i64) -> Self {
        Self {
            elements: Vec::new(),
            cursor,
        }
    }

    /// Whether this page terminates the traversal.
    pub fn is_end(&self) -> bool {
        self.elements.is_empty()
    }
}
