//! Structured queue position keys.

use std::fmt;

use quay_constants::position::HEAD_ID;
use quay_constants::position::HEAD_WINDOW_END;
use quay_constants::position::RANDOM_POSITION_WINDOW;
use quay_constants::position::TAIL_ID;
use quay_constants::position::TAIL_WINDOW_START;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

/// Compute the numeric identity of a queue from its name.
///
/// Uses the 31-polynomial string hash over UTF-16 code units with wrapping
/// arithmetic, so the same name maps to the same identity in every process.
///
/// # Example
///
/// ```
/// use quay_store::queue_name_hash;
///
/// assert_eq!(queue_name_hash(""), 0);
/// assert_eq!(queue_name_hash("a"), 97);
/// assert_eq!(queue_name_hash("ab"), 97 * 31 + 98);
/// ```
pub fn queue_name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Where a key points inside its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPosition {
    /// A head sentinel (fixed or random).
    Head,
    /// A tail sentinel (fixed or random).
    Tail,
    /// A concrete element position.
    Element(i64),
}

/// Position of an element inside a queue: `(hash, id)`.
///
/// The `hash` is the queue identity and is the high-order sort component, so
/// all positions of one queue are contiguous in key order and several queues
/// can share one keyspace. Keys order by `hash`, then `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueKey {
    hash: i32,
    id: i64,
}

impl QueueKey {
    /// Create a key for an explicit position.
    #[inline]
    pub const fn new(hash: i32, id: i64) -> Self {
        Self { hash, id }
    }

    /// The fixed head sentinel of the queue with identity `hash`.
    #[inline]
    pub const fn head(hash: i32) -> Self {
        Self::new(hash, HEAD_ID)
    }

    /// The fixed tail sentinel of the queue with identity `hash`.
    #[inline]
    pub const fn tail(hash: i32) -> Self {
        Self::new(hash, TAIL_ID)
    }

    /// A head sentinel picked at random inside the head window.
    pub fn random_head(hash: i32) -> Self {
        let offset = rand::rng().random_range(0..RANDOM_POSITION_WINDOW);
        Self::new(hash, HEAD_ID + offset)
    }

    /// A tail sentinel picked at random inside the tail window.
    pub fn random_tail(hash: i32) -> Self {
        let offset = rand::rng().random_range(0..RANDOM_POSITION_WINDOW);
        Self::new(hash, TAIL_ID - offset)
    }

    /// The head key for a queue, randomized when `randomize` is set.
    pub fn head_for(hash: i32, randomize: bool) -> Self {
        if randomize { Self::random_head(hash) } else { Self::head(hash) }
    }

    /// The tail key for a queue, randomized when `randomize` is set.
    pub fn tail_for(hash: i32, randomize: bool) -> Self {
        if randomize { Self::random_tail(hash) } else { Self::tail(hash) }
    }

    /// Queue identity.
    #[inline]
    pub const fn hash(&self) -> i32 {
        self.hash
    }

    /// Element id (or sentinel id).
    #[inline]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// The key routing component: every position of a queue is associated with
    /// the queue identity so the store co-locates them.
    #[inline]
    pub const fn associated_key(&self) -> i32 {
        self.hash
    }

    /// Classify this key as a head sentinel, tail sentinel or element position.
    pub const fn position(&self) -> KeyPosition {
        if self.id >= HEAD_ID && self.id <= HEAD_WINDOW_END {
            KeyPosition::Head
        } else if self.id >= TAIL_WINDOW_START {
            KeyPosition::Tail
        } else {
            KeyPosition::Element(self.id)
        }
    }

    /// Whether this key is a head or tail sentinel.
    pub const fn is_sentinel(&self) -> bool {
        !matches!(self.position(), KeyPosition::Element(_))
    }

    /// The key of the next position in the same queue.
    pub const fn next(&self) -> Self {
        Self::new(self.hash, self.id.saturating_add(1))
    }

    /// The key of the previous position in the same queue.
    pub const fn prev(&self) -> Self {
        Self::new(self.hash, self.id.saturating_sub(1))
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            KeyPosition::Head => write!(f, "{}:head", self.hash),
            KeyPosition::Tail => write!(f, "{}:tail", self.hash),
            KeyPosition::Element(id) => write!(f, "{}:{}", self.hash, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use quay_constants::position::APPEND_FAILED_ID;
    use quay_constants::position::FIRST_ELEMENT_ID;

    use super::*;

    #[test]
    fn test_name_hash_matches_polynomial() {
        assert_eq!(queue_name_hash("abc"), (97 * 31 + 98) * 31 + 99);
        assert_eq!(queue_name_hash("orders"), queue_name_hash("orders"));
        assert_ne!(queue_name_hash("orders"), queue_name_hash("orders2"));
    }

    #[test]
    fn test_name_hash_wraps_on_long_names() {
        let name = "x".repeat(4096);
        // Must not panic on overflow.
        let _ = queue_name_hash(&name);
    }

    #[test]
    fn test_sentinels_classify() {
        assert_eq!(QueueKey::head(7).position(), KeyPosition::Head);
        assert_eq!(QueueKey::tail(7).position(), KeyPosition::Tail);
        assert_eq!(QueueKey::new(7, FIRST_ELEMENT_ID).position(), KeyPosition::Element(0));
        assert_eq!(QueueKey::new(7, -5).position(), KeyPosition::Element(-5));
        assert!(QueueKey::head(7).is_sentinel());
        assert!(!QueueKey::new(7, 12).is_sentinel());
    }

    #[test]
    fn test_failure_marker_is_not_a_head() {
        assert_eq!(QueueKey::new(1, APPEND_FAILED_ID).position(), KeyPosition::Element(APPEND_FAILED_ID));
    }

    #[test]
    fn test_keys_order_by_hash_then_id() {
        let mut keys = vec![QueueKey::new(2, 0), QueueKey::new(1, 5), QueueKey::new(1, -3)];
        keys.sort();
        assert_eq!(keys, vec![QueueKey::new(1, -3), QueueKey::new(1, 5), QueueKey::new(2, 0)]);
    }

    #[test]
    fn test_associated_key_is_hash() {
        let key = QueueKey::new(42, 9);
        assert_eq!(key.associated_key(), 42);
    }

    #[test]
    fn test_display() {
        assert_eq!(QueueKey::head(3).to_string(), "3:head");
        assert_eq!(QueueKey::tail(3).to_string(), "3:tail");
        assert_eq!(QueueKey::new(3, 10).to_string(), "3:10");
    }

    #[test]
    fn test_serde_json_shape() {
        let json = serde_json::to_string(&QueueKey::new(1, 2)).unwrap();
        assert_eq!(json, r#"{"hash":1,"id":2}"#);
    }

    proptest! {
        #[test]
        fn prop_random_head_stays_in_head_window(hash in any::<i32>()) {
            let key = QueueKey::random_head(hash);
            prop_assert_eq!(key.position(), KeyPosition::Head);
            prop_assert_eq!(key.hash(), hash);
        }

        #[test]
        fn prop_random_tail_stays_in_tail_window(hash in any::<i32>()) {
            let key = QueueKey::random_tail(hash);
            prop_assert_eq!(key.position(), KeyPosition::Tail);
            prop_assert_eq!(key.hash(), hash);
        }
    }
}
