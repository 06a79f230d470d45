//! Base queue engine.
//!
//! Translates each queue operation into one processor invocation against a
//! computed [`QueueKey`], records statistics and maps store outcomes to queue
//! outcomes. Two realizations share the code through [`ValueCodec`]:
//! [`BinaryQueue`] stores payloads untouched, [`TypedQueue`] serializes.
//!
//! Store failures are never retried; they surface as [`QueueError::Store`].

mod deque;
mod queue;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use quay_constants::paging::DEFAULT_PAGE_SIZE;
use quay_store::ListenerId;
use quay_store::QueueKey;
use quay_store::QueueOfferResult;
use quay_store::QueueProcessor;
use quay_store::QueueStore;
use quay_store::StoreIdentity;
use quay_store::queue_name_hash;
use tracing::debug;

use crate::codec::BinaryCodec;
use crate::codec::TypedCodec;
use crate::codec::ValueCodec;
use crate::error::QueueError;
use crate::error::Result;
use crate::listener::CodecListener;
use crate::listener::QueueListener;
use crate::stats::QueueStatistics;
use crate::traits::NamedCollection;
use crate::verified;

/// Which end of the queue an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum End {
    Head,
    Tail,
}

/// Tuning knobs of one engine instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Address random sentinels inside the head/tail windows instead of the
    /// fixed ones, spreading contention at the cost of strict ordering.
    pub randomize_positions: bool,
    /// Page size hint for traversals.
    pub page_size: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            randomize_positions: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Queue and deque over a [`QueueStore`].
///
/// The queue identity is the hash of the backing cache name, so every wrapper
/// opened on the same cache addresses the same elements.
pub struct StoreQueue<S: QueueStore + ?Sized, C: ValueCodec> {
    name: String,
    store: Arc<S>,
    codec: Arc<C>,
    hash: i32,
    options: EngineOptions,
    stats: Arc<QueueStatistics>,
}

/// Engine over raw payloads.
pub type BinaryQueue<S> = StoreQueue<S, BinaryCodec>;

/// Engine over serde values.
pub type TypedQueue<S, T> = StoreQueue<S, TypedCodec<T>>;

impl<S, C> StoreQueue<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    /// Bind a queue to `store`, named after the store's cache.
    pub fn new(store: Arc<S>, codec: C, options: EngineOptions) -> Self {
        let name = store.identity().cache_name;
        Self::with_statistics(name, store, codec, options, Arc::new(QueueStatistics::new()))
    }

    /// Bind a queue with an explicit name and statistics instance.
    pub fn with_statistics(
        name: String,
        store: Arc<S>,
        codec: C,
        options: EngineOptions,
        stats: Arc<QueueStatistics>,
    ) -> Self {
        let hash = queue_name_hash(&store.identity().cache_name);
        debug!(queue = %name, hash, "queue bound");
        Self {
            name,
            store,
            codec: Arc::new(codec),
            hash,
            options,
            stats,
        }
    }

    /// The backing store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Element codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Sentinel and paging options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn head_key(&self) -> QueueKey {
        QueueKey::head_for(self.hash, self.options.randomize_positions)
    }

    fn tail_key(&self) -> QueueKey {
        QueueKey::tail_for(self.hash, self.options.randomize_positions)
    }

    fn key_for(&self, end: End) -> QueueKey {
        match end {
            End::Head => self.head_key(),
            End::Tail => self.tail_key(),
        }
    }

    fn check_not_null(&self, value: &C::Value, operation: &'static str) -> Result<()> {
        if self.codec.is_null(value) {
            return Err(QueueError::NullElement { operation });
        }
        Ok(())
    }

    /// Invoke the offer processor at one end.
    pub(crate) async fn offer_at(&self, end: End, value: &C::Value, operation: &'static str) -> Result<QueueOfferResult> {
        self.check_not_null(value, operation)?;
        let payload = self.codec.encode(value)?;

        let started = Instant::now();
        let result =
            self.store.invoke(self.key_for(end), QueueProcessor::Offer { value: payload }).await?.into_offer()?;
        self.stats.record_offer(started.elapsed(), result.is_success());

        if !result.is_success() {
            debug!(queue = %self.name, status = ?result.status, ?end, "offer rejected");
        }
        Ok(result)
    }

    /// Offer that fails loudly on rejection.
    pub(crate) async fn add_at(&self, end: End, value: &C::Value, operation: &'static str) -> Result<()> {
        let result = self.offer_at(end, value, operation).await?;
        match result.status {
            quay_store::OfferStatus::Success => Ok(()),
            quay_store::OfferStatus::FailedCapacity => Err(QueueError::QueueFull { name: self.name.clone() }),
            quay_store::OfferStatus::FailedOther => Err(QueueError::OfferRejected { name: self.name.clone() }),
        }
    }

    /// Invoke the peek or poll processor at one end.
    pub(crate) async fn read_at(&self, end: End, destructive: bool) -> Result<Option<C::Value>> {
        let processor = if destructive { QueueProcessor::Poll } else { QueueProcessor::Peek };

        let started = Instant::now();
        let result = self.store.invoke(self.key_for(end), processor).await?.into_poll()?;
        self.stats.record_poll(started.elapsed(), result.value.is_some());

        result.value.map(|bytes| self.codec.decode(&bytes)).transpose()
    }

    /// Peek or poll, failing with `NoSuchElement` on an empty queue.
    pub(crate) async fn require_at(&self, end: End, destructive: bool) -> Result<C::Value> {
        self.read_at(end, destructive).await?.ok_or_else(|| QueueError::NoSuchElement { name: self.name.clone() })
    }

    pub(crate) fn is_same_queue(&self, identity: &StoreIdentity, hash: i32) -> bool {
        verified::is_same_queue(&self.store.identity(), self.hash, identity, hash)
    }
}

#[async_trait]
impl<S, C> NamedCollection for StoreQueue<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    type Item = C::Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn queue_hash(&self) -> i32 {
        self.hash
    }

    fn identity(&self) -> StoreIdentity {
        self.store.identity()
    }

    fn statistics(&self) -> Arc<QueueStatistics> {
        Arc::clone(&self.stats)
    }

    fn is_null(&self, value: &C::Value) -> bool {
        self.codec.is_null(value)
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.store.size(self.hash).await?)
    }

    async fn contains(&self, value: &C::Value) -> Result<bool> {
        if self.codec.is_null(value) {
            return Ok(false);
        }
        let payload = self.codec.encode(value)?;
        Ok(self.store.contains_value(self.hash, &payload).await?)
    }

    async fn clear(&self) -> Result<()> {
        Ok(self.store.clear(self.hash).await?)
    }

    async fn add_listener(&self, listener: Arc<dyn QueueListener<C::Value>>) -> Result<ListenerId> {
        let adapter = Arc::new(CodecListener::new(Arc::clone(&self.codec), listener));
        Ok(self.store.add_listener(self.hash, adapter).await?)
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<bool> {
        Ok(self.store.remove_listener(id).await?)
    }

    async fn release(&self) -> Result<()> {
        debug!(queue = %self.name, "queue released");
        Ok(self.store.release().await?)
    }

    async fn destroy(&self) -> Result<()> {
        debug!(queue = %self.name, "queue destroyed");
        Ok(self.store.destroy().await?)
    }

    fn is_active(&self) -> bool {
        self.store.is_active()
    }
}
