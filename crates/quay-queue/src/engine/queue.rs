//! FIFO operations.

use async_trait::async_trait;
use quay_constants::position::APPEND_FAILED_ID;
use quay_store::QueueStore;
use tracing::debug;

use super::End;
use super::StoreQueue;
use crate::codec::ValueCodec;
use crate::error::QueueError;
use crate::error::Result;
use crate::iterator::PagedIterator;
use crate::traits::NamedCollection;
use crate::traits::NamedQueue;
use crate::traits::QueueCursor;

#[async_trait]
impl<S, C> NamedQueue for StoreQueue<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    async fn append(&self, value: C::Value) -> Result<i64> {
        let result = self.offer_at(End::Tail, &value, "append").await?;
        Ok(if result.is_success() { result.id } else { APPEND_FAILED_ID })
    }

    async fn add(&self, value: C::Value) -> Result<()> {
        self.add_at(End::Tail, &value, "add").await
    }

    async fn offer(&self, value: C::Value) -> Result<bool> {
        Ok(self.offer_at(End::Tail, &value, "offer").await?.is_success())
    }

    async fn peek(&self) -> Result<Option<C::Value>> {
        self.read_at(End::Head, false).await
    }

    async fn element(&self) -> Result<C::Value> {
        self.require_at(End::Head, false).await
    }

    async fn poll(&self) -> Result<Option<C::Value>> {
        self.read_at(End::Head, true).await
    }

    async fn remove(&self) -> Result<C::Value> {
        self.require_at(End::Head, true).await
    }

    async fn add_all(&self, values: Vec<C::Value>) -> Result<bool> {
        if values.iter().any(|value| self.codec.is_null(value)) {
            return Err(QueueError::NullElement { operation: "add_all" });
        }
        if values.is_empty() {
            return Ok(false);
        }
        for value in values {
            if !self.offer_at(End::Tail, &value, "add_all").await?.is_success() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn add_all_from(&self, other: &dyn NamedQueue<Item = C::Value>) -> Result<bool> {
        if self.is_same_queue(&other.identity(), other.queue_hash()) {
            return Err(QueueError::SelfReference { name: self.name.clone() });
        }
        let values = other.to_vec().await?;
        self.add_all(values).await
    }

    fn iter(&self) -> Box<dyn QueueCursor<Item = C::Value>> {
        Box::new(PagedIterator::forward(
            self.store.clone(),
            self.codec.clone(),
            self.hash,
            self.options.page_size,
        ))
    }

    async fn to_vec(&self) -> Result<Vec<C::Value>> {
        let cursor = self.iter();
        let mut out = Vec::new();
        loop {
            match cursor.next().await {
                Ok(Some(value)) => out.push(value),
                Ok(None) => return Ok(out),
                Err(error) if error.is_representation() => return Err(error),
                Err(error) => {
                    debug!(queue = %self.name, %error, "traversal failed while materializing");
                    return Err(QueueError::ConcurrentModification {
                        name: self.name.clone(),
                        source: Box::new(error),
                    });
                }
            }
        }
    }

    fn drain(&self) -> Box<dyn QueueCursor<Item = C::Value>> {
        Box::new(PagedIterator::drain_forward(
            self.store.clone(),
            self.codec.clone(),
            self.hash,
            self.options.page_size,
            None,
        ))
    }

    fn drain_max(&self, max: u64) -> Box<dyn QueueCursor<Item = C::Value>> {
        Box::new(PagedIterator::drain_forward(
            self.store.clone(),
            self.codec.clone(),
            self.hash,
            self.options.page_size,
            Some(max),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use quay_store::StoreError;
    use quay_testing::DeterministicQueueStore;

    use super::*;
    use crate::codec::BinaryCodec;
    use crate::codec::CodecKind;
    use crate::codec::TypedCodec;
    use crate::engine::BinaryQueue;
    use crate::engine::EngineOptions;
    use crate::engine::TypedQueue;

    fn binary(store: Arc<DeterministicQueueStore>) -> BinaryQueue<DeterministicQueueStore> {
        StoreQueue::new(store, BinaryCodec, EngineOptions::default())
    }

    fn typed(store: Arc<DeterministicQueueStore>) -> TypedQueue<DeterministicQueueStore, String> {
        StoreQueue::new(store, TypedCodec::of(CodecKind::Json), EngineOptions::default())
    }

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[tokio::test]
    async fn test_append_returns_increasing_ids() {
        let queue = binary(DeterministicQueueStore::new("queue$q", "svc"));
        let first = queue.append(b("a")).await.unwrap();
        let second = queue.append(b("b")).await.unwrap();
        assert!(second > first);
        assert_eq!(queue.size().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_append_reports_failure_sentinel() {
        let store = DeterministicQueueStore::with_max_queue_size("queue$q", "svc", 1);
        let queue = binary(store);
        assert_ne!(queue.append(b("a")).await.unwrap(), APPEND_FAILED_ID);
        assert_eq!(queue.append(b("b")).await.unwrap(), APPEND_FAILED_ID);
        assert!(!queue.offer(b("b")).await.unwrap());
        assert!(matches!(queue.add(b("b")).await, Err(QueueError::QueueFull { .. })));
        assert_eq!(queue.statistics().rejected(), 3);
        assert_eq!(queue.statistics().accepted(), 1);
    }

    #[tokio::test]
    async fn test_null_is_rejected_without_store_call() {
        let store = DeterministicQueueStore::new("queue$q", "svc");
        let queue = binary(store.clone());
        // A pending fault would surface if the store were touched.
        store.fail_next(StoreError::Timeout { duration_ms: 1 });
        assert!(matches!(queue.offer(Bytes::new()).await, Err(QueueError::NullElement { .. })));
        assert!(matches!(queue.append(Bytes::new()).await, Err(QueueError::NullElement { .. })));
        assert!(matches!(queue.size().await, Err(QueueError::Store { .. })));
        assert_eq!(queue.size().await.unwrap(), 0);
        assert_eq!(queue.statistics().accepted() + queue.statistics().rejected(), 0);
    }

    #[tokio::test]
    async fn test_peek_poll_element_remove() {
        let queue = typed(DeterministicQueueStore::new("queue$q", "svc"));
        assert_eq!(queue.peek().await.unwrap(), None);
        assert!(matches!(queue.element().await, Err(QueueError::NoSuchElement { .. })));
        assert!(matches!(queue.remove().await, Err(QueueError::NoSuchElement { .. })));

        queue.offer("a".to_string()).await.unwrap();
        queue.offer("b".to_string()).await.unwrap();
        assert_eq!(queue.peek().await.unwrap().as_deref(), Some("a"));
        assert_eq!(queue.element().await.unwrap(), "a");
        assert_eq!(queue.poll().await.unwrap().as_deref(), Some("a"));
        assert_eq!(queue.remove().await.unwrap(), "b");
        assert_eq!(queue.poll().await.unwrap(), None);

        let stats = queue.statistics();
        assert_eq!(stats.hits(), 4);
        assert_eq!(stats.misses(), 4);
    }

    #[tokio::test]
    async fn test_contains_and_clear() {
        let queue = typed(DeterministicQueueStore::new("queue$q", "svc"));
        queue.add("x".to_string()).await.unwrap();
        assert!(queue.contains(&"x".to_string()).await.unwrap());
        assert!(!queue.contains(&"y".to_string()).await.unwrap());
        queue.clear().await.unwrap();
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_add_all_stops_at_first_rejection() {
        let store = DeterministicQueueStore::with_max_queue_size("queue$q", "svc", 2);
        let queue = binary(store);
        assert!(!queue.add_all(vec![b("a"), b("b"), b("c"), b("d")]).await.unwrap());
        assert_eq!(queue.to_vec().await.unwrap(), vec![b("a"), b("b")]);
        assert_eq!(queue.statistics().rejected(), 1);
    }

    #[tokio::test]
    async fn test_add_all_rejects_nulls_up_front() {
        let queue = binary(DeterministicQueueStore::new("queue$q", "svc"));
        let err = queue.add_all(vec![b("a"), Bytes::new()]).await.unwrap_err();
        assert!(matches!(err, QueueError::NullElement { .. }));
        assert!(queue.is_empty().await.unwrap());
        assert!(!queue.add_all(Vec::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_all_from_self_is_refused() {
        let store = DeterministicQueueStore::new("queue$q", "svc");
        let queue = binary(store.clone());
        let same = binary(store);
        queue.add(b("a")).await.unwrap();
        assert!(matches!(queue.add_all_from(&queue).await, Err(QueueError::SelfReference { .. })));
        assert!(matches!(queue.add_all_from(&same).await, Err(QueueError::SelfReference { .. })));
    }

    #[tokio::test]
    async fn test_add_all_from_other_queue() {
        let source = binary(DeterministicQueueStore::new("queue$a", "svc"));
        let target = binary(DeterministicQueueStore::new("queue$b", "svc"));
        source.add_all(vec![b("1"), b("2")]).await.unwrap();
        assert!(target.add_all_from(&source).await.unwrap());
        assert_eq!(target.to_vec().await.unwrap(), vec![b("1"), b("2")]);
        assert_eq!(source.size().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_to_vec_wraps_store_failures() {
        let store = DeterministicQueueStore::new("queue$q", "svc");
        let queue = binary(store.clone());
        queue.add(b("a")).await.unwrap();
        store.fail_next(StoreError::Unavailable { reason: "partition moved".into() });
        let err = queue.to_vec().await.unwrap_err();
        assert!(matches!(err, QueueError::ConcurrentModification { .. }));
    }

    #[tokio::test]
    async fn test_to_vec_keeps_codec_failures() {
        let store = DeterministicQueueStore::new("queue$q", "svc");
        let raw = binary(store.clone());
        raw.add(b("not json")).await.unwrap();
        let queue = typed(store);
        let err = queue.to_vec().await.unwrap_err();
        assert!(matches!(err, QueueError::Json { .. }));
    }

    #[tokio::test]
    async fn test_drain_max_removes_prefix() {
        let queue = binary(DeterministicQueueStore::new("queue$q", "svc"));
        queue.add_all(vec![b("a"), b("b"), b("c")]).await.unwrap();
        let drained = crate::iterator::collect(queue.drain_max(2).as_ref()).await.unwrap();
        assert_eq!(drained, vec![b("a"), b("b")]);
        assert_eq!(queue.to_vec().await.unwrap(), vec![b("c")]);
        let rest = crate::iterator::collect(queue.drain().as_ref()).await.unwrap();
        assert_eq!(rest, vec![b("c")]);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_propagates_unchanged() {
        let store = DeterministicQueueStore::new("queue$q", "svc");
        let queue = binary(store.clone());
        store.fail_next(StoreError::Backend { reason: "boom".into() });
        let err = queue.offer(b("a")).await.unwrap_err();
        match err {
            QueueError::Store { source } => assert_eq!(source, StoreError::Backend { reason: "boom".into() }),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_queue_hash_follows_cache_name() {
        let queue = binary(DeterministicQueueStore::new("queue$orders", "svc"));
        assert_eq!(queue.queue_hash(), quay_store::queue_name_hash("queue$orders"));
        assert_eq!(queue.name(), "queue$orders");
    }
}
