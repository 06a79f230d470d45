//! Processor descriptors executed atomically inside the store.
//!
//! Each descriptor is invoked against a single [`QueueKey`](crate::QueueKey).
//! The head or tail sentinel the key points at selects which end of the queue
//! the processor works on.

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::error::StoreError;
use crate::result::QueueOfferResult;
use crate::result::QueuePage;
use crate::result::QueuePollResult;

/// Traversal direction of a page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageDirection {
    /// Head to tail (ascending ids).
    Forward,
    /// Tail to head (descending ids).
    Backward,
}

/// Which end of a queue an occurrence search prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEnd {
    /// The match closest to the head.
    Head,
    /// The match closest to the tail.
    Tail,
}

/// Parameters of a page processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Traversal direction.
    pub direction: PageDirection,
    /// Maximum number of elements to return.
    pub page_size: u32,
    /// Exclusive bound: only ids strictly past this one are returned.
    pub cursor: i64,
    /// Remove the returned elements.
    pub destructive: bool,
}

/// Predicate evaluated by the store for filtered invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryFilter {
    /// Entries whose stored payload equals this one.
    ValueEquals(Bytes),
}

impl EntryFilter {
    /// Evaluate the filter against a stored payload.
    pub fn matches(&self, value: &Bytes) -> bool {
        match self {
            EntryFilter::ValueEquals(expected) => expected == value,
        }
    }
}

/// A processor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueProcessor {
    /// Store `value` past the end selected by the key.
    Offer {
        /// Encoded element.
        value: Bytes,
    },
    /// Read the element at the end selected by the key.
    Peek,
    /// Remove and return the element at the end selected by the key.
    Poll,
    /// Fetch one page of a traversal.
    Page(PageRequest),
    /// Remove the single matching entry closest to `end`.
    RemoveOccurrence {
        /// Preferred end.
        end: QueueEnd,
    },
}

impl QueueProcessor {
    /// Short name used in logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            QueueProcessor::Offer { .. } => "offer",
            QueueProcessor::Peek => "peek",
            QueueProcessor::Poll => "poll",
            QueueProcessor::Page(_) => "page",
            QueueProcessor::RemoveOccurrence { .. } => "remove-occurrence",
        }
    }
}

/// Typed result of a processor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessorResult {
    /// Result of [`QueueProcessor::Offer`].
    Offer(QueueOfferResult),
    /// Result of [`QueueProcessor::Peek`] and [`QueueProcessor::Poll`].
    Poll(QueuePollResult),
    /// Result of [`QueueProcessor::Page`].
    Page(QueuePage),
    /// Result of [`QueueProcessor::RemoveOccurrence`].
    Removed(bool),
}

impl ProcessorResult {
    /// Short name used in errors.
    pub const fn kind(&self) -> &'static str {
        match self {
            ProcessorResult::Offer(_) => "offer",
            ProcessorResult::Poll(_) => "poll",
            ProcessorResult::Page(_) => "page",
            ProcessorResult::Removed(_) => "removed",
        }
    }

    /// Unwrap an offer result.
    pub fn into_offer(self) -> Result<QueueOfferResult, StoreError> {
        match self {
            ProcessorResult::Offer(result) => Ok(result),
            other => Err(StoreError::UnexpectedResult {
                expected: "offer",
                actual: other.kind(),
            }),
        }
    }

    /// Unwrap a peek/poll result.
    pub fn into_poll(self) -> Result<QueuePollResult, StoreError> {
        match self {
            ProcessorResult::Poll(result) => Ok(result),
            other => Err(StoreError::UnexpectedResult {
                expected: "poll",
                actual: other.kind(),
            }),
        }
    }

    /// Unwrap a page result.
    pub fn into_page(self) -> Result<QueuePage, StoreError> {
        match self {
            ProcessorResult::Page(page) => Ok(page),
            other => Err(StoreError::UnexpectedResult {
                expected: "page",
                actual: other.kind(),
            }),
        }
    }

    /// Unwrap a removal flag.
    pub fn into_removed(self) -> Result<bool, StoreError> {
        match self {
            ProcessorResult::Removed(removed) => Ok(removed),
            other => Err(StoreError::UnexpectedResult {
                expected: "removed",
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_exact_payload() {
        let filter = EntryFilter::ValueEquals(Bytes::from_static(b"a"));
        assert!(filter.matches(&Bytes::from_static(b"a")));
        assert!(!filter.matches(&Bytes::from_static(b"ab")));
    }

    #[test]
    fn test_wrong_result_kind_is_reported() {
        let err = ProcessorResult::Removed(true).into_offer().unwrap_err();
        assert_eq!(err, StoreError::UnexpectedResult {
            expected: "offer",
            actual: "removed",
        });
    }

    #[test]
    fn test_unwrap_matching_kind() {
        let page = QueuePage::end(5);
        assert_eq!(ProcessorResult::Page(page.clone()).into_page().unwrap(), page);
        assert!(ProcessorResult::Removed(true).into_removed().unwrap());
    }

    #[test]
    fn test_processor_survives_json() {
        let processor = QueueProcessor::Page(PageRequest {
            direction: PageDirection::Backward,
            page_size: 10,
            cursor: 3,
            destructive: true,
        });
        let json = serde_json::to_string(&processor).unwrap();
        let back: QueueProcessor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, processor);
        assert_eq!(back.name(), "page");
    }
}
