//! Element-converting views.
//!
//! A [`ConverterQueue`] presents a queue of `V` as a queue of `T` using a pair
//! of one-way converters. Both directions are applied lazily, per element, on
//! every operation that moves elements across the boundary. Keys are never
//! converted.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use quay_store::ListenerId;
use quay_store::StoreIdentity;

use crate::codec::ValueCodec;
use crate::error::QueueError;
use crate::error::Result;
use crate::listener::ConverterListener;
use crate::listener::QueueListener;
use crate::stats::QueueStatistics;
use crate::traits::NamedCollection;
use crate::traits::NamedDeque;
use crate::traits::NamedQueue;
use crate::traits::QueueCursor;
use crate::verified;

/// One-way element conversion.
///
/// A [`ConverterQueue`] treats a value as null when its internal form is the
/// inner queue's null element. Over a binary queue that is the empty payload:
/// [`ConverterQueue::with_codec`] maps null values to it, and any value that
/// legitimately converts to zero bytes (an empty string through a UTF-8 view)
/// is rejected with `NullElement` as well.
pub trait Convert<A, B>: Send + Sync {
    fn convert(&self, value: A) -> Result<B>;
}

impl<A, B, F> Convert<A, B> for F
where F: Fn(A) -> Result<B> + Send + Sync
{
    fn convert(&self, value: A) -> Result<B> {
        self(value)
    }
}

/// Cursor that converts each element of an inner cursor.
pub struct ConvertingCursor<V, T> {
    inner: Box<dyn QueueCursor<Item = V>>,
    convert: Arc<dyn Convert<V, T>>,
}

impl<V, T> ConvertingCursor<V, T> {
    pub fn new(inner: Box<dyn QueueCursor<Item = V>>, convert: Arc<dyn Convert<V, T>>) -> Self {
        Self { inner, convert }
    }
}

#[async_trait]
impl<V, T> QueueCursor for ConvertingCursor<V, T>
where
    V: Send + 'static,
    T: Send + 'static,
{
    type Item = T;

    async fn has_next(&self) -> Result<bool> {
        self.inner.has_next().await
    }

    async fn next(&self) -> Result<Option<T>> {
        self.inner.next().await?.map(|value| self.convert.convert(value)).transpose()
    }
}

/// Queue of `T` backed by a queue of `Q::Item`.
pub struct ConverterQueue<Q: NamedQueue + ?Sized, T> {
    inner: Arc<Q>,
    to_external: Arc<dyn Convert<Q::Item, T>>,
    to_internal: Arc<dyn Convert<T, Q::Item>>,
}

impl<Q, T> ConverterQueue<Q, T>
where
    Q: NamedQueue + ?Sized + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(inner: Arc<Q>, to_external: Arc<dyn Convert<Q::Item, T>>, to_internal: Arc<dyn Convert<T, Q::Item>>) -> Self {
        Self {
            inner,
            to_external,
            to_internal,
        }
    }

    /// Typed view over a queue of raw payloads.
    pub fn with_codec<C>(inner: Arc<Q>, codec: C) -> Self
    where
        Q: NamedQueue<Item = Bytes>,
        C: ValueCodec<Value = T>,
    {
        let codec = Arc::new(codec);
        let decoder = Arc::clone(&codec);
        let to_external: Arc<dyn Convert<Bytes, T>> = Arc::new(move |bytes: Bytes| decoder.decode(&bytes));
        let to_internal: Arc<dyn Convert<T, Bytes>> = Arc::new(move |value: T| {
            if codec.is_null(&value) {
                return Ok(Bytes::new());
            }
            codec.encode(&value)
        });
        Self::new(inner, to_external, to_internal)
    }

    pub fn inner(&self) -> &Arc<Q> {
        &self.inner
    }

    fn internal(&self, value: T) -> Result<Q::Item> {
        self.to_internal.convert(value)
    }

    fn external(&self, value: Option<Q::Item>) -> Result<Option<T>> {
        value.map(|value| self.to_external.convert(value)).transpose()
    }

    fn converting(&self, cursor: Box<dyn QueueCursor<Item = Q::Item>>) -> Box<dyn QueueCursor<Item = T>> {
        Box::new(ConvertingCursor::new(cursor, Arc::clone(&self.to_external)))
    }
}

#[async_trait]
impl<Q, T> NamedCollection for ConverterQueue<Q, T>
where
    Q: NamedQueue + ?Sized + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn queue_hash(&self) -> i32 {
        self.inner.queue_hash()
    }

    fn identity(&self) -> StoreIdentity {
        self.inner.identity()
    }

    fn statistics(&self) -> Arc<QueueStatistics> {
        self.inner.statistics()
    }

    fn is_null(&self, value: &T) -> bool {
        self.to_internal.convert(value.clone()).is_ok_and(|internal| self.inner.is_null(&internal))
    }

    async fn size(&self) -> Result<u64> {
        self.inner.size().await
    }

    async fn contains(&self, value: &T) -> Result<bool> {
        let internal = self.internal(value.clone())?;
        self.inner.contains(&internal).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    async fn add_listener(&self, listener: Arc<dyn QueueListener<T>>) -> Result<ListenerId> {
        let adapter = Arc::new(ConverterListener::new(Arc::clone(&self.to_external), listener));
        self.inner.add_listener(adapter).await
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
impl<Q, T> NamedQueue for ConverterQueue<Q, T>
where
    Q: NamedQueue + ?Sized + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn append(&self, value: T) -> Result<i64> {
        let internal = self.internal(value)?;
        self.inner.append(internal).await
    }

    async fn add(&self, value: T) -> Result<()> {
        let internal = self.internal(value)?;
        self.inner.add(internal).await
    }

    async fn offer(&self, value: T) -> Result<bool> {
        let internal = self.internal(value)?;
        self.inner.offer(internal).await
    }

    async fn peek(&self) -> Result<Option<T>> {
        let value = self.inner.peek().await?;
        self.external(value)
    }

    async fn element(&self) -> Result<T> {
        let value = self.inner.element().await?;
        self.to_external.convert(value)
    }

    async fn poll(&self) -> Result<Option<T>> {
        let value = self.inner.poll().await?;
        self.external(value)
    }

    async fn remove(&self) -> Result<T> {
        let value = self.inner.remove().await?;
        self.to_external.convert(value)
    }

    async fn add_all(&self, values: Vec<T>) -> Result<bool> {
        let internal = values.into_iter().map(|value| self.internal(value)).collect::<Result<Vec<_>>>()?;
        if internal.iter().any(|value| self.inner.is_null(value)) {
            return Err(QueueError::NullElement { operation: "add_all" });
        }
        self.inner.add_all(internal).await
    }

    async fn add_all_from(&self, other: &dyn NamedQueue<Item = T>) -> Result<bool> {
        if verified::is_same_queue(&self.identity(), self.queue_hash(), &other.identity(), other.queue_hash()) {
            return Err(QueueError::SelfReference {
                name: self.name().to_string(),
            });
        }
        let values = other.to_vec().await?;
        self.add_all(values).await
    }

    fn iter(&self) -> Box<dyn QueueCursor<Item = T>> {
        self.converting(self.inner.iter())
    }

    async fn to_vec(&self) -> Result<Vec<T>> {
        let values = self.inner.to_vec().await?;
        values.into_iter().map(|value| self.to_external.convert(value)).collect()
    }

    fn drain(&self) -> Box<dyn QueueCursor<Item = T>> {
        self.converting(self.inner.drain())
    }

    fn drain_max(&self, max: u64) -> Box<dyn QueueCursor<Item = T>> {
        self.converting(self.inner.drain_max(max))
    }
}

#[async_trait]
impl<Q, T> NamedDeque for ConverterQueue<Q, T>
where
    Q: NamedDeque + ?Sized + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn prepend(&self, value: T) -> Result<i64> {
        let internal = self.internal(value)?;
        self.inner.prepend(internal).await
    }

    async fn add_first(&self, value: T) -> Result<()> {
        let internal = self.internal(value)?;
        self.inner.add_first(internal).await
    }

    async fn add_last(&self, value: T) -> Result<()> {
        let internal = self.internal(value)?;
        self.inner.add_last(internal).await
    }

    async fn offer_first(&self, value: T) -> Result<bool> {
        let internal = self.internal(value)?;
        self.inner.offer_first(internal).await
    }

    async fn offer_last(&self, value: T) -> Result<bool> {
        let internal = self.internal(value)?;
        self.inner.offer_last(internal).await
    }

    async fn peek_first(&self) -> Result<Option<T>> {
        let value = self.inner.peek_first().await?;
        self.external(value)
    }

    async fn peek_last(&self) -> Result<Option<T>> {
        let value = self.inner.peek_last().await?;
        self.external(value)
    }

    async fn get_first(&self) -> Result<T> {
        let value = self.inner.get_first().await?;
        self.to_external.convert(value)
    }

    async fn get_last(&self) -> Result<T> {
        let value = self.inner.get_last().await?;
        self.to_external.convert(value)
    }

    async fn poll_first(&self) -> Result<Option<T>> {
        let value = self.inner.poll_first().await?;
        self.external(value)
    }

    async fn poll_last(&self) -> Result<Option<T>> {
        let value = self.inner.poll_last().await?;
        self.external(value)
    }

    async fn remove_first(&self) -> Result<T> {
        let value = self.inner.remove_first().await?;
        self.to_external.convert(value)
    }

    async fn remove_last(&self) -> Result<T> {
        let value = self.inner.remove_last().await?;
        self.to_external.convert(value)
    }

    async fn remove_first_occurrence(&self, value: &T) -> Result<bool> {
        let internal = self.internal(value.clone())?;
        self.inner.remove_first_occurrence(&internal).await
    }

    async fn remove_last_occurrence(&self, value: &T) -> Result<bool> {
        let internal = self.internal(value.clone())?;
        self.inner.remove_last_occurrence(&internal).await
    }

    fn descending_iter(&self) -> Box<dyn QueueCursor<Item = T>> {
        self.converting(self.inner.descending_iter())
    }
}
