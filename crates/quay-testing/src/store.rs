use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use quay_constants::position::FIRST_ELEMENT_ID;
use quay_constants::position::HEAD_WINDOW_END;
use quay_constants::position::TAIL_WINDOW_START;
use quay_store::EntryFilter;
use quay_store::KeyPosition;
use quay_store::ListenerId;
use quay_store::PageDirection;
use quay_store::PageRequest;
use quay_store::ProcessorResult;
use quay_store::QueueEnd;
use quay_store::QueueEvent;
use quay_store::QueueKey;
use quay_store::QueueOfferResult;
use quay_store::QueuePage;
use quay_store::QueuePollResult;
use quay_store::QueueProcessor;
use quay_store::QueueStore;
use quay_store::StoreError;
use quay_store::StoreIdentity;
use quay_store::StoreListener;
use tokio::sync::RwLock;
use tracing::debug;

type Entries = BTreeMap<QueueKey, Bytes>;

struct Registration {
    id: ListenerId,
    hash: i32,
    listener: Arc<dyn StoreListener>,
}

/// A deterministic in-memory queue store for testing.
///
/// All processors run under one write lock, so every invocation is atomic.
/// Optional per-queue byte limits produce capacity failures the same way a
/// size-limited backing map would, and [`fail_next`](Self::fail_next) injects
/// a collaborator failure into the next operation.
pub struct DeterministicQueueStore {
    identity: StoreIdentity,
    data: RwLock<Entries>,
    listeners: Mutex<Vec<Registration>>,
    next_listener_id: AtomicU64,
    max_queue_bytes: Option<u64>,
    injected_fault: Mutex<Option<StoreError>>,
    active: AtomicBool,
    destroyed: AtomicBool,
}

impl DeterministicQueueStore {
    /// Create an unbounded store wrapped in `Arc`.
    pub fn new(cache_name: &str, service_name: &str) -> Arc<Self> {
        Arc::new(Self::new_inner(StoreIdentity::new(cache_name, service_name), None))
    }

    /// Create a store that limits every queue to `max_bytes` of payload.
    pub fn with_max_queue_size(cache_name: &str, service_name: &str, max_bytes: u64) -> Arc<Self> {
        Arc::new(Self::new_inner(StoreIdentity::new(cache_name, service_name), Some(max_bytes)))
    }

    fn new_inner(identity: StoreIdentity, max_queue_bytes: Option<u64>) -> Self {
        Self {
            identity,
            data: RwLock::new(BTreeMap::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            max_queue_bytes,
            injected_fault: Mutex::new(None),
            active: AtomicBool::new(true),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Make the next store operation fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        *self.injected_fault.lock() = Some(error);
    }

    /// Element ids currently held by queue `hash`, in key order.
    pub async fn ids(&self, hash: i32) -> Vec<i64> {
        let data = self.data.read().await;
        data.range(queue_range(hash)).map(|(key, _)| key.id()).collect()
    }

    /// Write a raw entry, bypassing the processors. Used to build gapped queues.
    pub async fn insert_raw(&self, key: QueueKey, value: Bytes) {
        let event = QueueEvent::inserted(key, value.clone());
        self.data.write().await.insert(key, value);
        self.dispatch(vec![event]);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether [`destroy`](QueueStore::destroy) was called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Reactivate a released (not destroyed) store.
    pub(crate) fn reactivate(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.active.store(true, Ordering::Release);
        true
    }

    fn check_usable(&self) -> Result<(), StoreError> {
        if let Some(error) = self.injected_fault.lock().take() {
            debug!(cache = %self.identity.cache_name, %error, "injected store fault");
            return Err(error);
        }
        if self.is_destroyed() {
            return Err(StoreError::Destroyed {
                cache_name: self.identity.cache_name.clone(),
            });
        }
        if !self.active.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable {
                reason: format!("cache '{}' has been released", self.identity.cache_name),
            });
        }
        Ok(())
    }

    fn dispatch(&self, events: Vec<QueueEvent>) {
        if events.is_empty() {
            return;
        }
        // Snapshot so listeners may (un)register from inside a callback.
        let targets: Vec<(i32, Arc<dyn StoreListener>)> =
            self.listeners.lock().iter().map(|r| (r.hash, Arc::clone(&r.listener))).collect();
        for event in &events {
            for (hash, listener) in &targets {
                if *hash == event.key.hash() {
                    listener.on_event(event);
                }
            }
        }
    }

    fn offer(&self, data: &mut Entries, key: QueueKey, value: Bytes, events: &mut Vec<QueueEvent>) -> QueueOfferResult {
        let hash = key.hash();
        let mut range = data.range(queue_range(hash));
        let id = match key.position() {
            KeyPosition::Tail => match range.next_back() {
                Some((last, _)) => last.id().checked_add(1),
                None => Some(FIRST_ELEMENT_ID),
            },
            KeyPosition::Head => match range.next() {
                Some((first, _)) => first.id().checked_sub(1),
                None => Some(FIRST_ELEMENT_ID),
            },
            KeyPosition::Element(_) => None,
        };
        let Some(id) = id.filter(|id| *id > HEAD_WINDOW_END && *id < TAIL_WINDOW_START) else {
            return QueueOfferResult::other();
        };

        if let Some(max) = self.max_queue_bytes {
            let used: u64 = data.range(queue_range(hash)).map(|(_, v)| v.len() as u64).sum();
            if used.saturating_add(value.len() as u64) > max {
                return QueueOfferResult::capacity();
            }
        }

        let element = QueueKey::new(hash, id);
        data.insert(element, value.clone());
        events.push(QueueEvent::inserted(element, value));
        QueueOfferResult::success(id)
    }

    fn end_key(data: &Entries, key: QueueKey) -> Option<QueueKey> {
        let mut range = data.range(queue_range(key.hash()));
        let found = match key.position() {
            KeyPosition::Head => range.next(),
            KeyPosition::Tail => range.next_back(),
            KeyPosition::Element(_) => None,
        };
        found.map(|(k, _)| *k)
    }

    fn page(data: &mut Entries, hash: i32, request: PageRequest, events: &mut Vec<QueueEvent>) -> QueuePage {
        let limit = request.page_size as usize;
        let keys: Vec<QueueKey> = match request.direction {
            PageDirection::Forward => data
                .range((Bound::Excluded(QueueKey::new(hash, request.cursor)), Bound::Included(QueueKey::new(hash, i64::MAX))))
                .take(limit)
                .map(|(k, _)| *k)
                .collect(),
            PageDirection::Backward => data
                .range((Bound::Included(QueueKey::new(hash, i64::MIN)), Bound::Excluded(QueueKey::new(hash, request.cursor))))
                .rev()
                .take(limit)
                .map(|(k, _)| *k)
                .collect(),
        };
        let Some(last) = keys.last() else {
            return QueuePage::end(request.cursor);
        };
        let cursor = last.id();

        let mut elements = Vec::with_capacity(keys.len());
        for key in keys {
            if request.destructive {
                if let Some(value) = data.remove(&key) {
                    events.push(QueueEvent::deleted(key, value.clone()));
                    elements.push(value);
                }
            } else if let Some(value) = data.get(&key) {
                elements.push(value.clone());
            }
        }
        QueuePage { elements, cursor }
    }
}

fn queue_range(hash: i32) -> std::ops::RangeInclusive<QueueKey> {
    QueueKey::new(hash, i64::MIN)..=QueueKey::new(hash, i64::MAX)
}

#[async_trait]
impl QueueStore for DeterministicQueueStore {
    fn identity(&self) -> StoreIdentity {
        self.identity.clone()
    }

    async fn invoke(&self, key: QueueKey, processor: QueueProcessor) -> Result<ProcessorResult, StoreError> {
        self.check_usable()?;
        if !key.is_sentinel() {
            return Err(StoreError::InvalidPosition {
                key: key.to_string(),
                operation: processor.name(),
            });
        }

        let mut events = Vec::new();
        let result = {
            let mut data = self.data.write().await;
            match processor {
                QueueProcessor::Offer { value } => ProcessorResult::Offer(self.offer(&mut data, key, value, &mut events)),
                QueueProcessor::Peek => {
                    let value = Self::end_key(&data, key).and_then(|k| data.get(&k).cloned());
                    ProcessorResult::Poll(QueuePollResult { value })
                }
                QueueProcessor::Poll => match Self::end_key(&data, key) {
                    Some(found) => {
                        let value = data.remove(&found);
                        if let Some(ref v) = value {
                            events.push(QueueEvent::deleted(found, v.clone()));
                        }
                        ProcessorResult::Poll(QueuePollResult { value })
                    }
                    None => ProcessorResult::Poll(QueuePollResult::empty()),
                },
                QueueProcessor::Page(request) => {
                    ProcessorResult::Page(Self::page(&mut data, key.hash(), request, &mut events))
                }
                QueueProcessor::RemoveOccurrence { .. } => {
                    return Err(StoreError::InvalidPosition {
                        key: key.to_string(),
                        operation: "remove-occurrence",
                    });
                }
            }
        };

        self.dispatch(events);
        Ok(result)
    }

    async fn invoke_filtered(
        &self,
        hash: i32,
        filter: EntryFilter,
        processor: QueueProcessor,
    ) -> Result<Vec<(QueueKey, ProcessorResult)>, StoreError> {
        self.check_usable()?;
        let QueueProcessor::RemoveOccurrence { end } = processor else {
            return Err(StoreError::Backend {
                reason: format!("filtered {} is not supported", processor.name()),
            });
        };

        let mut events = Vec::new();
        let results = {
            let mut data = self.data.write().await;
            let mut matching = data.range(queue_range(hash)).filter(|(_, v)| filter.matches(v));
            let selected = match end {
                QueueEnd::Head => matching.next(),
                QueueEnd::Tail => matching.next_back(),
            }
            .map(|(k, _)| *k);

            match selected.and_then(|key| data.remove(&key).map(|value| (key, value))) {
                Some((key, value)) => {
                    events.push(QueueEvent::deleted(key, value));
                    vec![(key, ProcessorResult::Removed(true))]
                }
                None => Vec::new(),
            }
        };

        self.dispatch(events);
        Ok(results)
    }

    async fn size(&self, hash: i32) -> Result<u64, StoreError> {
        self.check_usable()?;
        Ok(self.data.read().await.range(queue_range(hash)).count() as u64)
    }

    async fn clear(&self, hash: i32) -> Result<(), StoreError> {
        self.check_usable()?;
        let events: Vec<QueueEvent> = {
            let mut data = self.data.write().await;
            let keys: Vec<QueueKey> = data.range(queue_range(hash)).map(|(k, _)| *k).collect();
            keys.into_iter()
                .filter_map(|key| data.remove(&key).map(|value| QueueEvent::deleted(key, value)))
                .collect()
        };
        self.dispatch(events);
        Ok(())
    }

    async fn contains_value(&self, hash: i32, value: &Bytes) -> Result<bool, StoreError> {
        self.check_usable()?;
        Ok(self.data.read().await.range(queue_range(hash)).any(|(_, v)| v == value))
    }

    async fn add_listener(&self, hash: i32, listener: Arc<dyn StoreListener>) -> Result<ListenerId, StoreError> {
        self.check_usable()?;
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration { id, hash, listener });
        debug!(cache = %self.identity.cache_name, hash, listener = id.0, "listener registered");
        Ok(id)
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<bool, StoreError> {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        Ok(listeners.len() != before)
    }

    async fn release(&self) -> Result<(), StoreError> {
        self.active.store(false, Ordering::Release);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), StoreError> {
        self.destroyed.store(true, Ordering::Release);
        self.active.store(false, Ordering::Release);
        self.data.write().await.clear();
        self.listeners.lock().clear();
        debug!(cache = %self.identity.cache_name, "store destroyed");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use quay_constants::position::APPEND_FAILED_ID;

    use super::*;

    const HASH: i32 = 17;

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    async fn offer(store: &DeterministicQueueStore, key: QueueKey, value: &'static str) -> QueueOfferResult {
        store.invoke(key, QueueProcessor::Offer { value: b(value) }).await.unwrap().into_offer().unwrap()
    }

    struct Recorder(Mutex<Vec<QueueEvent>>);

    impl StoreListener for Recorder {
        fn on_event(&self, event: &QueueEvent) {
            self.0.lock().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_offer_assigns_ids_from_both_ends() {
        let store = DeterministicQueueStore::new("c", "s");
        assert_eq!(offer(&store, QueueKey::tail(HASH), "a").await.id, 0);
        assert_eq!(offer(&store, QueueKey::tail(HASH), "b").await.id, 1);
        assert_eq!(offer(&store, QueueKey::head(HASH), "z").await.id, -1);
        assert_eq!(store.ids(HASH).await, vec![-1, 0, 1]);
    }

    #[tokio::test]
    async fn test_random_sentinels_address_the_same_ends() {
        let store = DeterministicQueueStore::new("c", "s");
        offer(&store, QueueKey::random_tail(HASH), "a").await;
        offer(&store, QueueKey::random_tail(HASH), "b").await;
        let polled = store.invoke(QueueKey::random_head(HASH), QueueProcessor::Poll).await.unwrap();
        assert_eq!(polled.into_poll().unwrap().value, Some(b("a")));
    }

    #[tokio::test]
    async fn test_capacity_limit_and_recovery() {
        let store = DeterministicQueueStore::with_max_queue_size("c", "s", 4);
        assert!(offer(&store, QueueKey::tail(HASH), "ab").await.is_success());
        assert!(offer(&store, QueueKey::tail(HASH), "cd").await.is_success());
        let rejected = offer(&store, QueueKey::tail(HASH), "e").await;
        assert_eq!(rejected.status, quay_store::OfferStatus::FailedCapacity);
        assert_eq!(rejected.id, APPEND_FAILED_ID);

        store.invoke(QueueKey::head(HASH), QueueProcessor::Poll).await.unwrap();
        assert!(offer(&store, QueueKey::tail(HASH), "e").await.is_success());
    }

    #[tokio::test]
    async fn test_offer_at_exhausted_tail_fails_other() {
        let store = DeterministicQueueStore::new("c", "s");
        store.insert_raw(QueueKey::new(HASH, TAIL_WINDOW_START - 1), b("x")).await;
        let result = offer(&store, QueueKey::tail(HASH), "y").await;
        assert_eq!(result.status, quay_store::OfferStatus::FailedOther);
    }

    #[tokio::test]
    async fn test_queues_are_isolated_by_hash() {
        let store = DeterministicQueueStore::new("c", "s");
        offer(&store, QueueKey::tail(1), "a").await;
        offer(&store, QueueKey::tail(2), "b").await;
        assert_eq!(store.size(1).await.unwrap(), 1);
        assert_eq!(store.size(2).await.unwrap(), 1);
        store.clear(1).await.unwrap();
        assert_eq!(store.size(1).await.unwrap(), 0);
        assert_eq!(store.size(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_page_forward_backward_and_destructive() {
        let store = DeterministicQueueStore::new("c", "s");
        for v in ["a", "b", "c"] {
            offer(&store, QueueKey::tail(HASH), v).await;
        }
        let request = PageRequest {
            direction: PageDirection::Forward,
            page_size: 2,
            cursor: quay_constants::HEAD_ID,
            destructive: false,
        };
        let page = store.invoke(QueueKey::head(HASH), QueueProcessor::Page(request)).await.unwrap().into_page().unwrap();
        assert_eq!(page.elements, vec![b("a"), b("b")]);
        assert_eq!(page.cursor, 1);

        let backward = PageRequest {
            direction: PageDirection::Backward,
            page_size: 10,
            cursor: quay_constants::TAIL_ID,
            destructive: true,
        };
        let page = store.invoke(QueueKey::head(HASH), QueueProcessor::Page(backward)).await.unwrap().into_page().unwrap();
        assert_eq!(page.elements, vec![b("c"), b("b"), b("a")]);
        assert_eq!(store.size(HASH).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_occurrence_picks_requested_end() {
        let store = DeterministicQueueStore::new("c", "s");
        for v in ["x", "y", "x"] {
            offer(&store, QueueKey::tail(HASH), v).await;
        }
        let removed = store
            .invoke_filtered(HASH, EntryFilter::ValueEquals(b("x")), QueueProcessor::RemoveOccurrence { end: QueueEnd::Tail })
            .await
            .unwrap();
        assert_eq!(removed, vec![(QueueKey::new(HASH, 2), ProcessorResult::Removed(true))]);
        assert_eq!(store.ids(HASH).await, vec![0, 1]);

        let none = store
            .invoke_filtered(HASH, EntryFilter::ValueEquals(b("q")), QueueProcessor::RemoveOccurrence { end: QueueEnd::Head })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_listener_sees_scoped_events() {
        let store = DeterministicQueueStore::new("c", "s");
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let id = store.add_listener(HASH, recorder.clone()).await.unwrap();

        offer(&store, QueueKey::tail(HASH), "a").await;
        offer(&store, QueueKey::tail(HASH + 1), "other").await;
        store.invoke(QueueKey::head(HASH), QueueProcessor::Poll).await.unwrap();

        let kinds: Vec<_> = recorder.0.lock().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![quay_store::QueueEventKind::Inserted, quay_store::QueueEventKind::Deleted]);

        assert!(store.remove_listener(id).await.unwrap());
        assert!(!store.remove_listener(id).await.unwrap());
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let store = DeterministicQueueStore::new("c", "s");
        store.fail_next(StoreError::Timeout { duration_ms: 5 });
        let err = store.size(HASH).await.unwrap_err();
        assert_eq!(err, StoreError::Timeout { duration_ms: 5 });
        assert_eq!(store.size(HASH).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_element_keys_are_rejected() {
        let store = DeterministicQueueStore::new("c", "s");
        let err = store.invoke(QueueKey::new(HASH, 3), QueueProcessor::Peek).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPosition { .. }));
    }

    #[tokio::test]
    async fn test_release_and_destroy() {
        let store = DeterministicQueueStore::new("c", "s");
        offer(&store, QueueKey::tail(HASH), "a").await;
        store.release().await.unwrap();
        assert!(!store.is_active());
        assert!(matches!(store.size(HASH).await, Err(StoreError::Unavailable { .. })));
        assert!(store.reactivate());
        assert_eq!(store.size(HASH).await.unwrap(), 1);

        store.destroy().await.unwrap();
        assert!(matches!(store.size(HASH).await, Err(StoreError::Destroyed { .. })));
        assert!(!store.reactivate());
    }
}
