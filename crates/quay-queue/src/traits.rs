//! Queue capability traits.
//!
//! Representation layers are composed by wrapping: a base engine implements
//! these traits directly, and the blocking, delegating and converting wrappers
//! implement them again by forwarding to an inner value.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quay_store::ListenerId;
use quay_store::StoreIdentity;

use crate::error::Result;
use crate::listener::QueueListener;
use crate::stats::QueueStatistics;

/// A stateful cursor over queue elements.
///
/// Methods take `&self`: implementations serialize page fetches internally,
/// so a cursor may be shared between tasks.
#[async_trait]
pub trait QueueCursor: Send + Sync {
    /// Element type.
    type Item: Send;

    /// Whether another element is available. May fetch a page.
    async fn has_next(&self) -> Result<bool>;

    /// The next element, or `None` once the traversal is exhausted.
    async fn next(&self) -> Result<Option<Self::Item>>;
}

/// Operations shared by every named queue or deque.
#[async_trait]
pub trait NamedCollection: Send + Sync {
    /// Client-visible element type.
    type Item: Clone + Send + Sync + 'static;

    /// Externally visible name.
    fn name(&self) -> &str;

    /// Numeric identity of the queue inside its store.
    fn queue_hash(&self) -> i32;

    /// Identity of the backing store collection.
    fn identity(&self) -> StoreIdentity;

    /// Statistics of this wrapper.
    fn statistics(&self) -> Arc<QueueStatistics>;

    /// Whether `value` is the null element.
    fn is_null(&self, value: &Self::Item) -> bool;

    /// Number of elements.
    async fn size(&self) -> Result<u64>;

    /// Whether the queue holds no element.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.size().await? == 0)
    }

    /// Whether an element equal to `value` is present.
    async fn contains(&self, value: &Self::Item) -> Result<bool>;

    /// Remove every element.
    async fn clear(&self) -> Result<()>;

    /// Subscribe to element changes.
    async fn add_listener(&self, listener: Arc<dyn QueueListener<Self::Item>>) -> Result<ListenerId>;

    /// Unsubscribe. Returns `false` if `id` was not registered.
    async fn remove_listener(&self, id: ListenerId) -> Result<bool>;

    /// Release local resources. Data stays in the store.
    async fn release(&self) -> Result<()>;

    /// Destroy the queue and its data.
    async fn destroy(&self) -> Result<()>;

    /// Whether the wrapper is still usable.
    fn is_active(&self) -> bool;
}

/// A FIFO queue.
#[async_trait]
pub trait NamedQueue: NamedCollection {
    /// Append at the tail, returning the assigned id, or
    /// [`APPEND_FAILED_ID`](quay_constants::APPEND_FAILED_ID) if the store
    /// refused the element.
    async fn append(&self, value: Self::Item) -> Result<i64>;

    /// Append at the tail; fails with `QueueFull` if the store refuses it.
    async fn add(&self, value: Self::Item) -> Result<()>;

    /// Append at the tail; `false` if the store refused the element.
    async fn offer(&self, value: Self::Item) -> Result<bool>;

    /// The head element without removing it.
    async fn peek(&self) -> Result<Option<Self::Item>>;

    /// The head element; fails with `NoSuchElement` when empty.
    async fn element(&self) -> Result<Self::Item>;

    /// Remove and return the head element.
    async fn poll(&self) -> Result<Option<Self::Item>>;

    /// Remove and return the head element; fails with `NoSuchElement` when empty.
    async fn remove(&self) -> Result<Self::Item>;

    /// Offer each value in order, stopping at the first rejection.
    ///
    /// Null values are refused before anything is offered. Returns `true` when
    /// every value of a non-empty input was stored.
    async fn add_all(&self, values: Vec<Self::Item>) -> Result<bool>;

    /// Offer every element of `other`, which must not be this queue.
    async fn add_all_from(&self, other: &dyn NamedQueue<Item = Self::Item>) -> Result<bool>;

    /// Non-destructive head-to-tail traversal.
    fn iter(&self) -> Box<dyn QueueCursor<Item = Self::Item>>;

    /// Materialize the queue head to tail.
    async fn to_vec(&self) -> Result<Vec<Self::Item>>;

    /// Destructive head-to-tail traversal of every element.
    fn drain(&self) -> Box<dyn QueueCursor<Item = Self::Item>>;

    /// Destructive head-to-tail traversal of at most `max` elements.
    fn drain_max(&self, max: u64) -> Box<dyn QueueCursor<Item = Self::Item>>;
}

/// A double-ended queue.
#[async_trait]
pub trait NamedDeque: NamedQueue {
    /// Insert at the head, returning the assigned id or the failure sentinel.
    async fn prepend(&self, value: Self::Item) -> Result<i64>;

    /// Insert at the head; fails with `QueueFull` if refused.
    async fn add_first(&self, value: Self::Item) -> Result<()>;

    /// Insert at the tail; fails with `QueueFull` if refused.
    async fn add_last(&self, value: Self::Item) -> Result<()>;

    async fn offer_first(&self, value: Self::Item) -> Result<bool>;

    async fn offer_last(&self, value: Self::Item) -> Result<bool>;

    /// Stack push: same as [`add_first`](Self::add_first).
    async fn push(&self, value: Self::Item) -> Result<()> {
        self.add_first(value).await
    }

    /// Stack pop: same as [`remove_first`](Self::remove_first).
    async fn pop(&self) -> Result<Self::Item> {
        self.remove_first().await
    }

    async fn peek_first(&self) -> Result<Option<Self::Item>>;

    async fn peek_last(&self) -> Result<Option<Self::Item>>;

    /// Head element; fails with `NoSuchElement` when empty.
    async fn get_first(&self) -> Result<Self::Item>;

    /// Tail element; fails with `NoSuchElement` when empty.
    async fn get_last(&self) -> Result<Self::Item>;

    async fn poll_first(&self) -> Result<Option<Self::Item>>;

    async fn poll_last(&self) -> Result<Option<Self::Item>>;

    async fn remove_first(&self) -> Result<Self::Item>;

    async fn remove_last(&self) -> Result<Self::Item>;

    /// Remove the element equal to `value` closest to the head.
    async fn remove_first_occurrence(&self, value: &Self::Item) -> Result<bool>;

    /// Remove the element equal to `value` closest to the tail.
    async fn remove_last_occurrence(&self, value: &Self::Item) -> Result<bool>;

    /// Non-destructive tail-to-head traversal.
    fn descending_iter(&self) -> Box<dyn QueueCursor<Item = Self::Item>>;
}

/// A queue whose insertions and removals can wait.
#[async_trait]
pub trait BlockingQueue: NamedQueue {
    /// Append at the tail, waiting for room.
    ///
    /// Only a capacity rejection waits. Any other refusal fails with
    /// `OfferRejected`.
    async fn put(&self, value: Self::Item) -> Result<()>;

    /// Append at the tail, waiting at most `timeout` for room. `false` on
    /// timeout; refusals other than capacity fail with `OfferRejected`.
    async fn offer_timeout(&self, value: Self::Item, timeout: Duration) -> Result<bool>;

    /// Remove the head element, waiting for one to arrive.
    async fn take(&self) -> Result<Self::Item>;

    /// Remove the head element, waiting at most `timeout`.
    async fn poll_timeout(&self, timeout: Duration) -> Result<Option<Self::Item>>;

    /// Room left before offers block. Queues are unbounded from this layer's view.
    fn remaining_capacity(&self) -> u64 {
        u64::MAX
    }

    /// Move every element into `target`, returning how many moved.
    async fn drain_to(&self, target: &mut Vec<Self::Item>) -> Result<usize>;

    /// Move at most `max` elements into `target`.
    async fn drain_to_max(&self, target: &mut Vec<Self::Item>, max: usize) -> Result<usize>;

    /// Move every element into another queue. Draining into itself is refused.
    ///
    /// If `target` refuses an element, that element is offered back to this
    /// queue's tail and the error is returned. Elements not yet moved stay in
    /// place.
    async fn drain_into(&self, target: &dyn NamedQueue<Item = Self::Item>) -> Result<usize>;

    /// Move at most `max` elements into another queue.
    async fn drain_into_max(&self, target: &dyn NamedQueue<Item = Self::Item>, max: usize) -> Result<usize>;
}

/// A deque whose insertions and removals can wait at either end.
#[async_trait]
pub trait BlockingDeque: BlockingQueue + NamedDeque {
    async fn put_first(&self, value: Self::Item) -> Result<()>;

    async fn put_last(&self, value: Self::Item) -> Result<()>;

    async fn offer_first_timeout(&self, value: Self::Item, timeout: Duration) -> Result<bool>;

    async fn offer_last_timeout(&self, value: Self::Item, timeout: Duration) -> Result<bool>;

    async fn take_first(&self) -> Result<Self::Item>;

    async fn take_last(&self) -> Result<Self::Item>;

    async fn poll_first_timeout(&self, timeout: Duration) -> Result<Option<Self::Item>>;

    async fn poll_last_timeout(&self, timeout: Duration) -> Result<Option<Self::Item>>;
}
