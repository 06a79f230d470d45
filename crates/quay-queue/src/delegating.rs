//! Forwarding wrapper.
//!
//! [`DelegatingQueue`] forwards every call to an inner queue. It can present a
//! different name (the logical queue name rather than the backing cache name)
//! and carry its own statistics handle.

use std::sync::Arc;

use async_trait::async_trait;
use quay_store::ListenerId;
use quay_store::StoreIdentity;

use crate::error::QueueError;
use crate::error::Result;
use crate::listener::QueueListener;
use crate::stats::QueueStatistics;
use crate::traits::NamedCollection;
use crate::traits::NamedDeque;
use crate::traits::NamedQueue;
use crate::traits::QueueCursor;

/// Queue that delegates to another queue.
pub struct DelegatingQueue<Q: ?Sized> {
    inner: Arc<Q>,
    name: Option<String>,
    stats: Option<Arc<QueueStatistics>>,
}

impl<Q: ?Sized> DelegatingQueue<Q> {
    pub fn new(inner: Arc<Q>) -> Self {
        Self {
            inner,
            name: None,
            stats: None,
        }
    }

    /// Present `name` instead of the inner queue's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Report `stats` instead of the inner queue's statistics.
    pub fn with_statistics(mut self, stats: Arc<QueueStatistics>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn inner(&self) -> &Arc<Q> {
        &self.inner
    }
}

impl<Q: NamedCollection + ?Sized + 'static> DelegatingQueue<Q> {
    fn self_reference(&self) -> QueueError {
        QueueError::SelfReference {
            name: self.name().to_string(),
        }
    }
}

#[async_trait]
impl<Q> NamedCollection for DelegatingQueue<Q>
where Q: NamedCollection + ?Sized + 'static
{
    type Item = Q::Item;

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.inner.name())
    }

    fn queue_hash(&self) -> i32 {
        self.inner.queue_hash()
    }

    fn identity(&self) -> StoreIdentity {
        self.inner.identity()
    }

    fn statistics(&self) -> Arc<QueueStatistics> {
        match &self.stats {
            Some(stats) => Arc::clone(stats),
            None => self.inner.statistics(),
        }
    }

    fn is_null(&self, value: &Q::Item) -> bool {
        self.inner.is_null(value)
    }

    async fn size(&self) -> Result<u64> {
        self.inner.size().await
    }

    async fn contains(&self, value: &Q::Item) -> Result<bool> {
        self.inner.contains(value).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    async fn add_listener(&self, listener: Arc<dyn QueueListener<Q::Item>>) -> Result<ListenerId> {
        self.inner.add_listener(listener).await
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<bool> {
        self.inner.remove_listener(id).await
    }

    async fn release(&self) -> Result<()> {
        self.inner.release().await
    }

    async fn destroy(&self) -> Result<()> {
        self.inner.destroy().await
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

#[async_trait]
impl<Q> NamedQueue for DelegatingQueue<Q>
where Q: NamedQueue + ?Sized + 'static
{
    async fn append(&self, value: Q::Item) -> Result<i64> {
        self.inner.append(value).await
    }

    async fn add(&self, value: Q::Item) -> Result<()> {
        self.inner.add(value).await
    }

    async fn offer(&self, value: Q::Item) -> Result<bool> {
        self.inner.offer(value).await
    }

    async fn peek(&self) -> Result<Option<Q::Item>> {
        self.inner.peek().await
    }

    async fn element(&self) -> Result<Q::Item> {
        self.inner.element().await
    }

    async fn poll(&self) -> Result<Option<Q::Item>> {
        self.inner.poll().await
    }

    async fn remove(&self) -> Result<Q::Item> {
        self.inner.remove().await
    }

    async fn add_all(&self, values: Vec<Q::Item>) -> Result<bool> {
        self.inner.add_all(values).await
    }

    async fn add_all_from(&self, other: &dyn NamedQueue<Item = Q::Item>) -> Result<bool> {
        // The inner queue reports its own name; keep ours in the error.
        self.inner.add_all_from(other).await.map_err(|error| match error {
            QueueError::SelfReference { .. } => self.self_reference(),
            other => other,
        })
    }

    fn iter(&self) -> Box<dyn QueueCursor<Item = Q::Item>> {
        self.inner.iter()
    }

    async fn to_vec(&self) -> Result<Vec<Q::Item>> {
        self.inner.to_vec().await
    }

    fn drain(&self) -> Box<dyn QueueCursor<Item = Q::Item>> {
        self.inner.drain()
    }

    fn drain_max(&self, max: u64) -> Box<dyn QueueCursor<Item = Q::Item>> {
        self.inner.drain_max(max)
    }
}

#[async_trait]
impl<Q> NamedDeque for DelegatingQueue<Q>
where Q: NamedDeque + ?Sized + 'static
{
    async fn prepend(&self, value: Q::Item) -> Result<i64> {
        self.inner.prepend(value).await
    }

    async fn add_first(&self, value: Q::Item) -> Result<()> {
        self.inner.add_first(value).await
    }

    async fn add_last(&self, value: Q::Item) -> Result<()> {
        self.inner.add_last(value).await
    }

    async fn offer_first(&self, value: Q::Item) -> Result<bool> {
        self.inner.offer_first(value).await
    }

    async fn offer_last(&self, value: Q::Item) -> Result<bool> {
        self.inner.offer_last(value).await
    }

    async fn peek_first(&self) -> Result<Option<Q::Item>> {
        self.inner.peek_first().await
    }

    async fn peek_last(&self) -> Result<Option<Q::Item>> {
        self.inner.peek_last().await
    }

    async fn get_first(&self) -> Result<Q::Item> {
        self.inner.get_first().await
    }

    async fn get_last(&self) -> Result<Q::Item> {
        self.inner.get_last().await
    }

    async fn poll_first(&self) -> Result<Option<Q::Item>> {
        self.inner.poll_first().await
    }

    async fn poll_last(&self) -> Result<Option<Q::Item>> {
        self.inner.poll_last().await
    }

    async fn remove_first(&self) -> Result<Q::Item> {
        self.inner.remove_first().await
    }

    async fn remove_last(&self) -> Result<Q::Item> {
        self.inner.remove_last().await
    }

    async fn remove_first_occurrence(&self, value: &Q::Item) -> Result<bool> {
        self.inner.remove_first_occurrence(value).await
    }

    async fn remove_last_occurrence(&self, value: &Q::Item) -> Result<bool> {
        self.inner.remove_last_occurrence(value).await
    }

    fn descending_iter(&self) -> Box<dyn QueueCursor<Item = Q::Item>> {
        self.inner.descending_iter()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use quay_testing::DeterministicQueueStore;

    use super::*;
    use crate::codec::BinaryCodec;
    use crate::engine::BinaryQueue;
    use crate::engine::EngineOptions;
    use crate::engine::StoreQueue;

    fn engine(cache: &str) -> Arc<BinaryQueue<DeterministicQueueStore>> {
        Arc::new(StoreQueue::new(DeterministicQueueStore::new(cache, "svc"), BinaryCodec, EngineOptions::default()))
    }

    #[tokio::test]
    async fn test_forwards_to_inner() {
        let inner = engine("queue$orders");
        let queue = DelegatingQueue::new(inner.clone()).with_name("orders");
        assert_eq!(queue.name(), "orders");
        assert_eq!(queue.queue_hash(), inner.queue_hash());

        queue.add_last(Bytes::from_static(b"b")).await.unwrap();
        queue.add_first(Bytes::from_static(b"a")).await.unwrap();
        assert_eq!(inner.to_vec().await.unwrap(), vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"a"));
        assert_eq!(queue.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unnamed_wrapper_uses_inner_name() {
        let queue = DelegatingQueue::new(engine("queue$raw"));
        assert_eq!(queue.name(), "queue$raw");
    }

    #[tokio::test]
    async fn test_statistics_override() {
        let inner = engine("queue$s");
        let stats = Arc::new(QueueStatistics::new());
        let queue = DelegatingQueue::new(inner.clone()).with_statistics(stats.clone());
        assert!(Arc::ptr_eq(&queue.statistics(), &stats));
        assert!(Arc::ptr_eq(&DelegatingQueue::new(inner.clone()).statistics(), &inner.statistics()));
    }

    #[tokio::test]
    async fn test_self_reference_reports_wrapper_name() {
        let inner = engine("queue$loop");
        let queue = DelegatingQueue::new(inner.clone()).with_name("loop");
        match queue.add_all_from(inner.as_ref()).await {
            Err(QueueError::SelfReference { name }) => assert_eq!(name, "loop"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
