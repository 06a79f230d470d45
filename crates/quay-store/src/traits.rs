//! Store and session interfaces.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::event::ListenerId;
use crate::event::StoreListener;
use crate::key::QueueKey;
use crate::processor::EntryFilter;
use crate::processor::ProcessorResult;
use crate::processor::QueueProcessor;

/// Identity of a physical collection: cache name plus owning service.
///
/// Two wrappers with the same identity (and the same queue hash) address the
/// same elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreIdentity {
    /// Physical cache name.
    pub cache_name: String,
    /// Name of the service hosting the cache.
    pub service_name: String,
}

impl StoreIdentity {
    /// Create an identity.
    pub fn new(cache_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            service_name: service_name.into(),
        }
    }
}

impl fmt::Display for StoreIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_name, self.cache_name)
    }
}

/// A partitioned map addressed by [`QueueKey`].
///
/// Every method is atomic with respect to a single key. Implementations own
/// partitioning and replication; callers see only these primitives.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Identity of the collection this handle addresses.
    fn identity(&self) -> StoreIdentity;

    /// Execute `processor` atomically at `key`.
    async fn invoke(&self, key: QueueKey, processor: QueueProcessor) -> Result<ProcessorResult, StoreError>;

    /// Execute `processor` against the entries of queue `hash` that match
    /// `filter`, returning the result for each entry it ran on.
    async fn invoke_filtered(
        &self,
        hash: i32,
        filter: EntryFilter,
        processor: QueueProcessor,
    ) -> Result<Vec<(QueueKey, ProcessorResult)>, StoreError>;

    /// Number of elements held by queue `hash`.
    async fn size(&self, hash: i32) -> Result<u64, StoreError>;

    /// Remove every element of queue `hash`.
    async fn clear(&self, hash: i32) -> Result<(), StoreError>;

    /// Whether queue `hash` holds an element equal to `value`.
    async fn contains_value(&self, hash: i32, value: &Bytes) -> Result<bool, StoreError>;

    /// Subscribe to changes of queue `hash`.
    async fn add_listener(&self, hash: i32, listener: Arc<dyn StoreListener>) -> Result<ListenerId, StoreError>;

    /// Unsubscribe. Returns `false` when `id` was not registered.
    async fn remove_listener(&self, id: ListenerId) -> Result<bool, StoreError>;

    /// Release this local handle. Data stays in the store.
    async fn release(&self) -> Result<(), StoreError>;

    /// Destroy the collection and all of its data.
    async fn destroy(&self) -> Result<(), StoreError>;

    /// Whether the handle is still usable.
    fn is_active(&self) -> bool;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: QueueStore + ?Sized> QueueStore for Arc<T> {
    fn identity(&self) -> StoreIdentity {
        (**self).identity()
    }

    async fn invoke(&self, key: QueueKey, processor: QueueProcessor) -> Result<ProcessorResult, StoreError> {
        (**self).invoke(key, processor).await
    }

    async fn invoke_filtered(
        &self,
        hash: i32,
        filter: EntryFilter,
        processor: QueueProcessor,
    ) -> Result<Vec<(QueueKey, ProcessorResult)>, StoreError> {
        (**self).invoke_filtered(hash, filter, processor).await
    }

    async fn size(&self, hash: i32) -> Result<u64, StoreError> {
        (**self).size(hash).await
    }

    async fn clear(&self, hash: i32) -> Result<(), StoreError> {
        (**self).clear(hash).await
    }

    async fn contains_value(&self, hash: i32, value: &Bytes) -> Result<bool, StoreError> {
        (**self).contains_value(hash, value).await
    }

    async fn add_listener(&self, hash: i32, listener: Arc<dyn StoreListener>) -> Result<ListenerId, StoreError> {
        (**self).add_listener(hash, listener).await
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<bool, StoreError> {
        (**self).remove_listener(id).await
    }

    async fn release(&self) -> Result<(), StoreError> {
        (**self).release().await
    }

    async fn destroy(&self) -> Result<(), StoreError> {
        (**self).destroy().await
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

/// Resolves physical cache names to store handles.
///
/// Repeated calls with the same name return handles to the same collection.
#[async_trait]
pub trait QueueSession: Send + Sync {
    /// Name of the service that hosts the caches.
    fn service_name(&self) -> &str;

    /// Get (or create) the collection named `cache_name`.
    async fn store(&self, cache_name: &str) -> Result<Arc<dyn QueueStore>, StoreError>;
}
