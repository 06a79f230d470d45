//! Collection construction.
//!
//! [`QueueBuilder`] maps a logical queue name to its physical cache name,
//! obtains the store handle from a [`QueueSession`] and assembles the wrapper
//! stack: engine, delegating wrapper carrying the logical name, and optionally
//! the blocking wrapper.

use std::sync::Arc;
use std::time::Duration;

use quay_constants::naming::DEFAULT_CACHE_PREFIX;
use quay_constants::paging::DEFAULT_PAGE_SIZE;
use quay_constants::stats::STATS_SNAPSHOT_INTERVAL_MS;
use quay_store::QueueSession;
use quay_store::QueueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::blocking::BlockingWrapper;
use crate::codec::BinaryCodec;
use crate::codec::CodecKind;
use crate::codec::TypedCodec;
use crate::codec::ValueCodec;
use crate::delegating::DelegatingQueue;
use crate::engine::EngineOptions;
use crate::engine::StoreQueue;
use crate::error::Result;
use crate::stats::QueueStatistics;

/// Queue over any session store, exposed under its logical name.
pub type SessionQueue<C> = DelegatingQueue<StoreQueue<dyn QueueStore, C>>;

/// Typed session queue.
pub type TypedSessionQueue<T> = SessionQueue<TypedCodec<T>>;

/// Binary session queue.
pub type BinarySessionQueue = SessionQueue<BinaryCodec>;

/// Blocking typed session queue.
pub type BlockingSessionQueue<T> = BlockingWrapper<TypedSessionQueue<T>>;

/// Blocking binary session queue.
pub type BlockingBinaryQueue = BlockingWrapper<BinarySessionQueue>;

/// Runtime settings applied to every collection a builder creates.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub page_size: u32,
    pub randomize_positions: bool,
    pub cache_prefix: String,
    pub codec: CodecKind,
    pub stats_snapshot_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            randomize_positions: false,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            codec: CodecKind::default(),
            stats_snapshot_interval: Duration::from_millis(STATS_SNAPSHOT_INTERVAL_MS),
        }
    }
}

/// Logical ⇄ physical collection names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNaming {
    prefix: String,
}

impl CollectionNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Cache name backing the logical queue `name`.
    ///
    /// # Example
    ///
    /// ```
    /// use quay_queue::CollectionNaming;
    ///
    /// let naming = CollectionNaming::default();
    /// assert_eq!(naming.physical("orders"), "queue$orders");
    /// assert_eq!(naming.logical("queue$orders"), Some("orders"));
    /// assert_eq!(naming.logical("orders"), None);
    /// ```
    pub fn physical(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Logical name of a cache, or `None` if the cache is not a queue cache.
    pub fn logical<'a>(&self, cache_name: &'a str) -> Option<&'a str> {
        cache_name.strip_prefix(self.prefix.as_str())
    }
}

impl Default for CollectionNaming {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PREFIX)
    }
}

/// Creates queues and deques on top of a session.
pub struct QueueBuilder {
    session: Arc<dyn QueueSession>,
    config: QueueConfig,
    naming: CollectionNaming,
}

impl QueueBuilder {
    pub fn new(session: Arc<dyn QueueSession>) -> Self {
        Self::with_config(session, QueueConfig::default())
    }

    pub fn with_config(session: Arc<dyn QueueSession>, config: QueueConfig) -> Self {
        let naming = CollectionNaming::new(config.cache_prefix.clone());
        Self { session, config, naming }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn naming(&self) -> &CollectionNaming {
        &self.naming
    }

    /// FIFO queue of `T` named `name`.
    pub async fn queue<T>(&self, name: &str) -> Result<Arc<TypedSessionQueue<T>>>
    where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
        self.build(name, TypedCodec::of(self.config.codec), self.config.randomize_positions).await.map(Arc::new)
    }

    /// Deque of `T` named `name`. Deques always address the fixed sentinels.
    pub async fn deque<T>(&self, name: &str) -> Result<Arc<TypedSessionQueue<T>>>
    where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
        self.build(name, TypedCodec::of(self.config.codec), false).await.map(Arc::new)
    }

    /// Blocking FIFO queue of `T`.
    pub async fn blocking_queue<T>(&self, name: &str) -> Result<Arc<BlockingSessionQueue<T>>>
    where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
        let queue = self.queue::<T>(name).await?;
        Ok(Arc::new(BlockingWrapper::new(queue).await?))
    }

    /// Blocking deque of `T`.
    pub async fn blocking_deque<T>(&self, name: &str) -> Result<Arc<BlockingSessionQueue<T>>>
    where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
        let deque = self.deque::<T>(name).await?;
        Ok(Arc::new(BlockingWrapper::new(deque).await?))
    }

    /// FIFO queue of raw payloads.
    pub async fn binary_queue(&self, name: &str) -> Result<Arc<BinarySessionQueue>> {
        self.build(name, BinaryCodec, self.config.randomize_positions).await.map(Arc::new)
    }

    /// Deque of raw payloads.
    pub async fn binary_deque(&self, name: &str) -> Result<Arc<BinarySessionQueue>> {
        self.build(name, BinaryCodec, false).await.map(Arc::new)
    }

    /// Blocking queue of raw payloads.
    pub async fn blocking_binary_queue(&self, name: &str) -> Result<Arc<BlockingBinaryQueue>> {
        let queue = self.binary_queue(name).await?;
        Ok(Arc::new(BlockingWrapper::new(queue).await?))
    }

    /// Blocking deque of raw payloads.
    pub async fn blocking_binary_deque(&self, name: &str) -> Result<Arc<BlockingBinaryQueue>> {
        let deque = self.binary_deque(name).await?;
        Ok(Arc::new(BlockingWrapper::new(deque).await?))
    }

    async fn build<C: ValueCodec>(&self, name: &str, codec: C, randomize_positions: bool) -> Result<SessionQueue<C>> {
        let cache_name = self.naming.physical(name);
        let store = self.session.store(&cache_name).await?;
        let stats = Arc::new(QueueStatistics::with_snapshot_interval(self.config.stats_snapshot_interval));
        let options = EngineOptions {
            randomize_positions,
            page_size: self.config.page_size,
        };
        debug!(
            queue = name,
            cache = %cache_name,
            service = self.session.service_name(),
            randomize_positions,
            "collection built"
        );
        let engine = StoreQueue::with_statistics(cache_name, store, codec, options, Arc::clone(&stats));
        Ok(DelegatingQueue::new(Arc::new(engine)).with_name(name).with_statistics(stats))
    }
}
