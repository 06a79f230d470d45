//! Cursor-based paged traversal.
//!
//! A [`PagedIterator`] fetches bounded batches through the page processor,
//! keeping the last observed id as the exclusive bound of the next fetch.
//! Fetches are serialized by an async lock, so one iterator can be shared
//! between tasks without returning an element twice.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use quay_store::PageDirection;
use quay_store::PageRequest;
use quay_store::QueueKey;
use quay_store::QueueProcessor;
use quay_store::QueueStore;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::trace;

use crate::codec::ValueCodec;
use crate::error::Result;
use crate::traits::QueueCursor;
use crate::verified;

struct CursorState {
    cursor: i64,
    exhausted: bool,
    remaining: Option<u64>,
    buffered: VecDeque<Bytes>,
}

/// Paged traversal of one queue.
pub struct PagedIterator<S: QueueStore + ?Sized, C: ValueCodec> {
    store: Arc<S>,
    codec: Arc<C>,
    hash: i32,
    direction: PageDirection,
    destructive: bool,
    page_size: u32,
    state: Mutex<CursorState>,
}

impl<S, C> PagedIterator<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    fn new(
        store: Arc<S>,
        codec: Arc<C>,
        hash: i32,
        direction: PageDirection,
        destructive: bool,
        page_size: u32,
        max: Option<u64>,
    ) -> Self {
        Self {
            store,
            codec,
            hash,
            direction,
            destructive,
            page_size: verified::clamp_page_size(page_size),
            state: Mutex::new(CursorState {
                cursor: verified::initial_cursor(direction),
                exhausted: false,
                remaining: max,
                buffered: VecDeque::new(),
            }),
        }
    }

    /// Head-to-tail, non-destructive.
    pub fn forward(store: Arc<S>, codec: Arc<C>, hash: i32, page_size: u32) -> Self {
        Self::new(store, codec, hash, PageDirection::Forward, false, page_size, None)
    }

    /// Tail-to-head, non-destructive.
    pub fn backward(store: Arc<S>, codec: Arc<C>, hash: i32, page_size: u32) -> Self {
        Self::new(store, codec, hash, PageDirection::Backward, false, page_size, None)
    }

    /// Head-to-tail, removing each element before it is returned.
    pub fn drain_forward(store: Arc<S>, codec: Arc<C>, hash: i32, page_size: u32, max: Option<u64>) -> Self {
        Self::new(store, codec, hash, PageDirection::Forward, true, page_size, max)
    }

    /// Tail-to-head, removing each element before it is returned.
    pub fn drain_backward(store: Arc<S>, codec: Arc<C>, hash: i32, page_size: u32, max: Option<u64>) -> Self {
        Self::new(store, codec, hash, PageDirection::Backward, true, page_size, max)
    }

    /// Traversal direction.
    pub fn direction(&self) -> PageDirection {
        self.direction
    }

    /// Whether each element is removed before it is returned.
    pub fn is_destructive(&self) -> bool {
        self.destructive
    }

    /// Make sure `state` has a buffered element, fetching a page if needed.
    async fn fill(&self, state: &mut CursorState) -> Result<bool> {
        if !state.buffered.is_empty() {
            return Ok(true);
        }
        if state.exhausted {
            return Ok(false);
        }
        let page_size = verified::next_page_size(self.page_size, state.remaining);
        if page_size == 0 {
            state.exhausted = true;
            return Ok(false);
        }

        let request = PageRequest {
            direction: self.direction,
            page_size,
            cursor: state.cursor,
            destructive: self.destructive,
        };
        let page = self.store.invoke(QueueKey::head(self.hash), QueueProcessor::Page(request)).await?.into_page()?;

        if page.is_end() {
            debug!(hash = self.hash, direction = ?self.direction, "iterator exhausted");
            state.exhausted = true;
            return Ok(false);
        }

        trace!(hash = self.hash, fetched = page.elements.len(), cursor = page.cursor, "page fetched");
        state.cursor = page.cursor;
        state.remaining = verified::remaining_after(state.remaining, page.elements.len());
        state.buffered.extend(page.elements);
        Ok(true)
    }

    /// Convert into a stream that ends after the last element or the first error.
    pub fn into_stream(self) -> BoxStream<'static, Result<C::Value>> {
        cursor_stream(Box::new(self))
    }
}

#[async_trait]
impl<S, C> QueueCursor for PagedIterator<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    type Item = C::Value;

    async fn has_next(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        self.fill(&mut state).await
    }

    async fn next(&self) -> Result<Option<C::Value>> {
        let mut state = self.state.lock().await;
        if !self.fill(&mut state).await? {
            return Ok(None);
        }
        match state.buffered.pop_front() {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// Turn any cursor into a stream.
pub fn cursor_stream<T: Send + 'static>(cursor: Box<dyn QueueCursor<Item = T>>) -> BoxStream<'static, Result<T>> {
    futures::stream::unfold(Some(cursor), |cursor| async move {
        let cursor = cursor?;
        match cursor.next().await {
            Ok(Some(item)) => Some((Ok(item), Some(cursor))),
            Ok(None) => None,
            Err(error) => Some((Err(error), None)),
        }
    })
    .boxed()
}

/// Collect every remaining element of a cursor.
pub async fn collect<T: Send>(cursor: &dyn QueueCursor<Item = T>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(item) = cursor.next().await? {
        out.push(item);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use quay_testing::DeterministicQueueStore;

    use super::*;
    use crate::codec::BinaryCodec;

    const HASH: i32 = 99;

    async fn seeded(values: &[&'static str]) -> Arc<DeterministicQueueStore> {
        let store = DeterministicQueueStore::new("c", "s");
        for value in values {
            store
                .invoke(QueueKey::tail(HASH), QueueProcessor::Offer {
                    value: Bytes::from_static(value.as_bytes()),
                })
                .await
                .unwrap();
        }
        store
    }

    fn strings(values: Vec<Bytes>) -> Vec<String> {
        values.into_iter().map(|b| String::from_utf8(b.to_vec()).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_forward_across_pages() {
        let store = seeded(&["a", "b", "c", "d", "e"]).await;
        let iter = PagedIterator::forward(store, Arc::new(BinaryCodec), HASH, 2);
        let all = collect(&iter).await.unwrap();
        assert_eq!(strings(all), vec!["a", "b", "c", "d", "e"]);
        // Exhaustion is sticky.
        assert!(!iter.has_next().await.unwrap());
        assert!(iter.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backward_order() {
        let store = seeded(&["a", "b", "c"]).await;
        let iter = PagedIterator::backward(store, Arc::new(BinaryCodec), HASH, 100);
        assert_eq!(strings(collect(&iter).await.unwrap()), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_exhaustion_is_sticky_after_new_elements() {
        let store = seeded(&["a"]).await;
        let iter = PagedIterator::forward(store.clone(), Arc::new(BinaryCodec), HASH, 10);
        assert_eq!(collect(&iter).await.unwrap().len(), 1);
        store
            .invoke(QueueKey::tail(HASH), QueueProcessor::Offer {
                value: Bytes::from_static(b"late"),
            })
            .await
            .unwrap();
        assert!(!iter.has_next().await.unwrap());
    }

    #[tokio::test]
    async fn test_drain_with_budget() {
        let store = seeded(&["a", "b", "c", "d"]).await;
        let iter = PagedIterator::drain_forward(store.clone(), Arc::new(BinaryCodec), HASH, 10, Some(3));
        assert_eq!(strings(collect(&iter).await.unwrap()), vec!["a", "b", "c"]);
        assert_eq!(store.size(HASH).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_drain_removes_before_returning() {
        let store = seeded(&["a", "b"]).await;
        let iter = PagedIterator::drain_backward(store.clone(), Arc::new(BinaryCodec), HASH, 1, None);
        let first = iter.next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"b"));
        assert_eq!(store.ids(HASH).await, vec![0]);
    }

    #[tokio::test]
    async fn test_gapped_ids_are_traversed() {
        let store = DeterministicQueueStore::new("c", "s");
        for id in [3, 10, 11, 500] {
            store.insert_raw(QueueKey::new(HASH, id), Bytes::from(id.to_string())).await;
        }
        let iter = PagedIterator::forward(store, Arc::new(BinaryCodec), HASH, 3);
        assert_eq!(strings(collect(&iter).await.unwrap()), vec!["3", "10", "11", "500"]);
    }

    #[tokio::test]
    async fn test_stream_conversion() {
        let store = seeded(&["x", "y"]).await;
        let iter = PagedIterator::forward(store, Arc::new(BinaryCodec), HASH, 1);
        let values: Vec<Bytes> = iter.into_stream().try_collect().await.unwrap();
        assert_eq!(strings(values), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = seeded(&["x"]).await;
        store.fail_next(quay_store::StoreError::Timeout { duration_ms: 1 });
        let iter = PagedIterator::forward(store, Arc::new(BinaryCodec), HASH, 1);
        let err = iter.next().await.unwrap_err();
        assert!(matches!(err, crate::error::QueueError::Store { .. }));
    }
}
