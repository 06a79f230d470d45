//! Blocking wait/signal layer.
//!
//! [`BlockingWrapper`] adds `put`/`take` style operations to any queue. It
//! owns one async lock and two signals, `not_empty` and `not_full`, driven by
//! store change notifications: an insertion wakes takers, a removal wakes
//! putters. A woken caller always re-checks the queue from scratch.
//!
//! Waiters register for a signal before attempting the operation, so a
//! notification that lands between a failed attempt and the wait is not lost.
//! Only a capacity rejection waits for room; any other refusal fails at once.
//! Once interrupted, the wrapper fails every blocking call before touching the
//! queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use quay_store::ListenerId;
use quay_store::QueueEventKind;
use quay_store::StoreIdentity;
use tokio::sync::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::error::QueueError;
use crate::error::Result;
use crate::listener::QueueEventView;
use crate::listener::QueueListener;
use crate::stats::QueueStatistics;
use crate::traits::BlockingDeque;
use crate::traits::BlockingQueue;
use crate::traits::NamedCollection;
use crate::traits::NamedDeque;
use crate::traits::NamedQueue;
use crate::traits::QueueCursor;
use crate::verified;

#[derive(Default)]
struct Signals {
    not_empty: Notify,
    not_full: Notify,
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    NotEmpty,
    NotFull,
}

/// Turns element changes into wake-ups. Never decodes payloads.
struct SignalListener {
    signals: Arc<Signals>,
}

impl<V> QueueListener<V> for SignalListener {
    fn on_event(&self, event: &dyn QueueEventView<V>) {
        match event.kind() {
            QueueEventKind::Inserted => self.signals.not_empty.notify_waiters(),
            QueueEventKind::Deleted => self.signals.not_full.notify_waiters(),
            QueueEventKind::Updated => {}
        }
    }
}

/// Blocking queue/deque over any [`NamedQueue`].
pub struct BlockingWrapper<Q: NamedQueue + ?Sized> {
    inner: Arc<Q>,
    lock: Mutex<()>,
    signals: Arc<Signals>,
    listener: SyncMutex<Option<ListenerId>>,
    cancel: CancellationToken,
}

impl<Q> BlockingWrapper<Q>
where Q: NamedQueue + ?Sized + 'static
{
    /// Wrap `inner` and subscribe to its change notifications.
    pub async fn new(inner: Arc<Q>) -> Result<Self> {
        Self::with_cancellation(inner, CancellationToken::new()).await
    }

    /// Wrap `inner`; cancelling `cancel` interrupts every blocked call.
    pub async fn with_cancellation(inner: Arc<Q>, cancel: CancellationToken) -> Result<Self> {
        let signals = Arc::new(Signals::default());
        let listener = Arc::new(SignalListener {
            signals: Arc::clone(&signals),
        });
        let id = inner.add_listener(listener).await?;
        debug!(queue = %inner.name(), listener = id.0, "blocking wrapper subscribed");
        Ok(Self {
            inner,
            lock: Mutex::new(()),
            signals,
            listener: SyncMutex::new(Some(id)),
            cancel,
        })
    }

    /// The wrapped queue.
    pub fn inner(&self) -> &Arc<Q> {
        &self.inner
    }

    /// Token that interrupts blocked calls when cancelled.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Interrupt every blocked call. The wrapper stays interrupted.
    pub fn interrupt(&self) {
        self.cancel.cancel();
    }

    fn notify(&self, signal: Signal) -> &Notify {
        match signal {
            Signal::NotEmpty => &self.signals.not_empty,
            Signal::NotFull => &self.signals.not_full,
        }
    }

    async fn unsubscribe(&self) -> Result<()> {
        let id = self.listener.lock().take();
        if let Some(id) = id {
            self.inner.remove_listener(id).await?;
            debug!(queue = %self.inner.name(), listener = id.0, "blocking wrapper unsubscribed");
        }
        Ok(())
    }

    /// Run `attempt` under the lock until it yields a value, the deadline
    /// passes (`Ok(None)`) or the wrapper is interrupted.
    async fn wait_until<T, F, Fut>(
        &self,
        signal: Signal,
        timeout: Option<Duration>,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<Option<T>>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>>> + Send,
    {
        let notify = self.notify(signal);
        let mut remaining = timeout;
        let mut waited = false;

        loop {
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let _guard = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => return Err(QueueError::Interrupted { operation }),
                    guard = self.lock.lock() => guard,
                };
                if let Some(value) = attempt().await? {
                    return Ok(Some(value));
                }
            }

            if !waited {
                debug!(queue = %self.inner.name(), operation, ?signal, ?timeout, "blocking wait started");
                waited = true;
            }

            match remaining {
                Some(budget) if budget.is_zero() => {
                    debug!(queue = %self.inner.name(), operation, "blocking wait timed out");
                    return Ok(None);
                }
                Some(budget) => {
                    let started = Instant::now();
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => {
                            debug!(queue = %self.inner.name(), operation, "blocking wait interrupted");
                            return Err(QueueError::Interrupted { operation });
                        }
                        () = &mut notified => {}
                        () = tokio::time::sleep(budget) => {}
                    }
                    remaining = Some(verified::remaining_wait(budget, started.elapsed()));
                }
                None => {
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => {
                            debug!(queue = %self.inner.name(), operation, "blocking wait interrupted");
                            return Err(QueueError::Interrupted { operation });
                        }
                        () = &mut notified => {}
                    }
                }
            }
        }
    }

    async fn drain_cursor_to(&self, cursor: Box<dyn QueueCursor<Item = Q::Item>>, target: &mut Vec<Q::Item>) -> Result<usize> {
        let mut moved = 0;
        while let Some(value) = cursor.next().await? {
            target.push(value);
            moved += 1;
        }
        Ok(moved)
    }

    /// Move elements one at a time from the head into `target`.
    ///
    /// At most one element is out of the source at any time. If `target`
    /// refuses it, the element is offered back to the source tail and the
    /// error is returned; everything not yet moved stays in the source.
    async fn drain_queue_into(&self, target: &dyn NamedQueue<Item = Q::Item>, max: Option<usize>) -> Result<usize> {
        if verified::is_same_queue(&self.inner.identity(), self.inner.queue_hash(), &target.identity(), target.queue_hash()) {
            return Err(QueueError::SelfReference {
                name: self.inner.name().to_string(),
            });
        }
        let mut moved = 0;
        while max.is_none_or(|max| moved < max) {
            let Some(value) = self.inner.poll().await? else {
                break;
            };
            if let Err(error) = target.add(value.clone()).await {
                self.restore(value, target.name()).await;
                return Err(error);
            }
            moved += 1;
        }
        Ok(moved)
    }

    async fn restore(&self, value: Q::Item, target: &str) {
        match self.inner.offer(value).await {
            Ok(true) => debug!(queue = %self.inner.name(), target, "undelivered element returned to source"),
            Ok(false) => warn!(queue = %self.inner.name(), target, "source refused undelivered element"),
            Err(error) => warn!(queue = %self.inner.name(), target, %error, "failed to return undelivered element"),
        }
    }
}

/// A stored element, a capacity rejection to wait out, or a hard failure.
fn stored_or_full(result: Result<()>) -> Result<Option<()>> {
    match result {
        Ok(()) => Ok(Some(())),
        Err(QueueError::QueueFull { .. }) => Ok(None),
        Err(error) => Err(error),
    }
}

#[async_trait]
impl<Q> NamedCollection for BlockingWrapper<Q>
where Q: NamedQueue + ?Sized + 'static
{
    type Item = Q::Item;

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
        self.unsubscribe().await?;
        self.inner.release().await
    }

    async fn destroy(&self) -> Result<()> {
        self.unsubscribe().await?;
        self.inner.destroy().await
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

#[async_trait]
impl<Q> NamedQueue for BlockingWrapper<Q>
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
        self.inner.add_all_from(other).await
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
impl<Q> BlockingQueue for BlockingWrapper<Q>
where Q: NamedQueue + ?Sized + 'static
{
    async fn put(&self, value: Q::Item) -> Result<()> {
        let (inner, value) = (&self.inner, &value);
        self.wait_until(Signal::NotFull, None, "put", move || async move {
            stored_or_full(inner.add(value.clone()).await)
        })
        .await?;
        Ok(())
    }

    async fn offer_timeout(&self, value: Q::Item, timeout: Duration) -> Result<bool> {
        let (inner, value) = (&self.inner, &value);
        let stored = self
            .wait_until(Signal::NotFull, Some(timeout), "offer", move || async move {
                stored_or_full(inner.add(value.clone()).await)
            })
            .await?;
        Ok(stored.is_some())
    }

    async fn take(&self) -> Result<Q::Item> {
        let inner = &self.inner;
        let taken = self.wait_until(Signal::NotEmpty, None, "take", move || async move { inner.poll().await }).await?;
        taken.ok_or_else(|| QueueError::NoSuchElement {
            name: self.inner.name().to_string(),
        })
    }

    async fn poll_timeout(&self, timeout: Duration) -> Result<Option<Q::Item>> {
        let inner = &self.inner;
        self.wait_until(Signal::NotEmpty, Some(timeout), "poll", move || async move { inner.poll().await }).await
    }

    async fn drain_to(&self, target: &mut Vec<Q::Item>) -> Result<usize> {
        self.drain_cursor_to(self.inner.drain(), target).await
    }

    async fn drain_to_max(&self, target: &mut Vec<Q::Item>, max: usize) -> Result<usize> {
        self.drain_cursor_to(self.inner.drain_max(max as u64), target).await
    }

    async fn drain_into(&self, target: &dyn NamedQueue<Item = Q::Item>) -> Result<usize> {
        self.drain_queue_into(target, None).await
    }

    async fn drain_into_max(&self, target: &dyn NamedQueue<Item = Q::Item>, max: usize) -> Result<usize> {
        self.drain_queue_into(target, Some(max)).await
    }
}

#[async_trait]
impl<Q> NamedDeque for BlockingWrapper<Q>
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

#[async_trait]
impl<Q> BlockingDeque for BlockingWrapper<Q>
where Q: NamedDeque + ?Sized + 'static
{
    async fn put_first(&self, value: Q::Item) -> Result<()> {
        let (inner, value) = (&self.inner, &value);
        self.wait_until(Signal::NotFull, None, "put_first", move || async move {
            stored_or_full(inner.add_first(value.clone()).await)
        })
        .await?;
        Ok(())
    }

    async fn put_last(&self, value: Q::Item) -> Result<()> {
        let (inner, value) = (&self.inner, &value);
        self.wait_until(Signal::NotFull, None, "put_last", move || async move {
            stored_or_full(inner.add_last(value.clone()).await)
        })
        .await?;
        Ok(())
    }

    async fn offer_first_timeout(&self, value: Q::Item, timeout: Duration) -> Result<bool> {
        let (inner, value) = (&self.inner, &value);
        let stored = self
            .wait_until(Signal::NotFull, Some(timeout), "offer_first", move || async move {
                stored_or_full(inner.add_first(value.clone()).await)
            })
            .await?;
        Ok(stored.is_some())
    }

    async fn offer_last_timeout(&self, value: Q::Item, timeout: Duration) -> Result<bool> {
        let (inner, value) = (&self.inner, &value);
        let stored = self
            .wait_until(Signal::NotFull, Some(timeout), "offer_last", move || async move {
                stored_or_full(inner.add_last(value.clone()).await)
            })
            .await?;
        Ok(stored.is_some())
    }

    async fn take_first(&self) -> Result<Q::Item> {
        let inner = &self.inner;
        let taken =
            self.wait_until(Signal::NotEmpty, None, "take_first", move || async move { inner.poll_first().await }).await?;
        taken.ok_or_else(|| QueueError::NoSuchElement {
            name: self.inner.name().to_string(),
        })
    }

    async fn take_last(&self) -> Result<Q::Item> {
        let inner = &self.inner;
        let taken =
            self.wait_until(Signal::NotEmpty, None, "take_last", move || async move { inner.poll_last().await }).await?;
        taken.ok_or_else(|| QueueError::NoSuchElement {
            name: self.inner.name().to_string(),
        })
    }

    async fn poll_first_timeout(&self, timeout: Duration) -> Result<Option<Q::Item>> {
        let inner = &self.inner;
        self.wait_until(Signal::NotEmpty, Some(timeout), "poll_first", move || async move { inner.poll_first().await })
            .await
    }

    async fn poll_last_timeout(&self, timeout: Duration) -> Result<Option<Q::Item>> {
        let inner = &self.inner;
        self.wait_until(Signal::NotEmpty, Some(timeout), "poll_last", move || async move { inner.poll_last().await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use quay_constants::position::TAIL_WINDOW_START;
    use quay_store::QueueKey;
    use quay_testing::DeterministicQueueStore;

    use super::*;
    use crate::codec::BinaryCodec;
    use crate::engine::BinaryQueue;
    use crate::engine::EngineOptions;
    use crate::engine::StoreQueue;

    type Blocking = BlockingWrapper<BinaryQueue<DeterministicQueueStore>>;

    async fn blocking(store: Arc<DeterministicQueueStore>) -> Arc<Blocking> {
        let queue = Arc::new(StoreQueue::new(store, BinaryCodec, EngineOptions::default()));
        Arc::new(BlockingWrapper::new(queue).await.unwrap())
    }

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[tokio::test]
    async fn test_take_wakes_on_put() {
        let queue = blocking(DeterministicQueueStore::new("queue$b", "svc")).await;
        let taker = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.put(b("z")).await.unwrap();

        let taken = tokio::time::timeout(Duration::from_secs(5), taker).await.unwrap().unwrap().unwrap();
        assert_eq!(taken, b("z"));
    }

    #[tokio::test]
    async fn test_poll_timeout_expires_on_empty_queue() {
        let queue = blocking(DeterministicQueueStore::new("queue$b", "svc")).await;
        let started = Instant::now();
        let polled = queue.poll_timeout(Duration::from_millis(50)).await.unwrap();
        assert!(polled.is_none());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_poll_timeout_returns_present_element_immediately() {
        let queue = blocking(DeterministicQueueStore::new("queue$b", "svc")).await;
        queue.offer(b("a")).await.unwrap();
        assert_eq!(queue.poll_timeout(Duration::ZERO).await.unwrap(), Some(b("a")));
    }

    #[tokio::test]
    async fn test_offer_waits_for_room() {
        let store = DeterministicQueueStore::with_max_queue_size("queue$b", "svc", 1);
        let queue = blocking(store).await;
        queue.put(b("a")).await.unwrap();
        assert!(!queue.offer_timeout(b("b"), Duration::from_millis(20)).await.unwrap());

        let putter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.offer_timeout(b("b"), Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.poll().await.unwrap(), Some(b("a")));
        assert!(putter.await.unwrap().unwrap());
        assert_eq!(queue.to_vec().await.unwrap(), vec![b("b")]);
    }

    #[tokio::test]
    async fn test_interrupt_unblocks_take() {
        let queue = blocking(DeterministicQueueStore::new("queue$b", "svc")).await;
        let taker = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.interrupt();
        let err = taker.await.unwrap().unwrap_err();
        assert!(matches!(err, QueueError::Interrupted { operation: "take" }));
    }

    #[tokio::test]
    async fn test_put_fails_fast_on_non_capacity_rejection() {
        let store = DeterministicQueueStore::new("queue$b", "svc");
        let queue = blocking(store.clone()).await;
        store.insert_raw(QueueKey::new(queue.queue_hash(), TAIL_WINDOW_START - 1), b("last")).await;

        let started = Instant::now();
        let put = tokio::time::timeout(Duration::from_secs(5), queue.put(b("x"))).await.unwrap();
        assert!(matches!(put, Err(QueueError::OfferRejected { .. })));
        let offered = queue.offer_timeout(b("x"), Duration::from_secs(5)).await;
        assert!(matches!(offered, Err(QueueError::OfferRejected { .. })));
        let put_last = tokio::time::timeout(Duration::from_secs(5), queue.put_last(b("x"))).await.unwrap();
        assert!(matches!(put_last, Err(QueueError::OfferRejected { .. })));
        assert!(started.elapsed() < Duration::from_secs(1));

        queue.put_first(b("head")).await.unwrap();
        assert_eq!(queue.to_vec().await.unwrap(), vec![b("head"), b("last")]);
    }

    #[tokio::test]
    async fn test_interrupted_wrapper_fails_every_blocking_call() {
        let queue = blocking(DeterministicQueueStore::new("queue$b", "svc")).await;
        queue.interrupt();
        for _ in 0..50 {
            queue.offer(b("a")).await.unwrap();
            assert!(matches!(queue.take().await, Err(QueueError::Interrupted { operation: "take" })));
        }
        assert!(matches!(queue.put(b("b")).await, Err(QueueError::Interrupted { operation: "put" })));
        assert!(matches!(
            queue.poll_last_timeout(Duration::from_secs(1)).await,
            Err(QueueError::Interrupted { operation: "poll_last" })
        ));
        assert_eq!(queue.size().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_drain_into_refused_target_keeps_elements() {
        let queue = blocking(DeterministicQueueStore::new("queue$src", "svc")).await;
        queue.add_all(vec![b("1"), b("2"), b("3"), b("4"), b("5")]).await.unwrap();
        let target = StoreQueue::new(
            DeterministicQueueStore::with_max_queue_size("queue$dst", "svc", 1),
            BinaryCodec,
            EngineOptions::default(),
        );

        let err = queue.drain_into(&target).await.unwrap_err();
        assert!(matches!(err, QueueError::QueueFull { .. }));
        assert_eq!(target.to_vec().await.unwrap(), vec![b("1")]);
        assert_eq!(queue.to_vec().await.unwrap(), vec![b("3"), b("4"), b("5"), b("2")]);
    }

    #[tokio::test]
    async fn test_drain_to_and_self_rejection() {
        let store = DeterministicQueueStore::new("queue$b", "svc");
        let queue = blocking(store.clone()).await;
        queue.add_all(vec![b("1"), b("2"), b("3")]).await.unwrap();

        let mut sink = Vec::new();
        assert_eq!(queue.drain_to_max(&mut sink, 2).await.unwrap(), 2);
        assert_eq!(sink, vec![b("1"), b("2")]);

        let err = queue.drain_into(queue.as_ref()).await.unwrap_err();
        assert!(matches!(err, QueueError::SelfReference { .. }));

        let other = StoreQueue::new(DeterministicQueueStore::new("queue$other", "svc"), BinaryCodec, EngineOptions::default());
        assert_eq!(queue.drain_into(&other).await.unwrap(), 1);
        assert_eq!(other.to_vec().await.unwrap(), vec![b("3")]);
        assert!(queue.is_empty().await.unwrap());
        assert_eq!(queue.remaining_capacity(), u64::MAX);
    }

    #[tokio::test]
    async fn test_release_unsubscribes() {
        let store = DeterministicQueueStore::new("queue$b", "svc");
        let queue = blocking(store.clone()).await;
        assert_eq!(store.listener_count(), 1);
        queue.release().await.unwrap();
        assert_eq!(store.listener_count(), 0);
        assert!(!queue.is_active());
    }

    #[tokio::test]
    async fn test_deque_ends() {
        let queue = blocking(DeterministicQueueStore::new("queue$b", "svc")).await;
        queue.put_last(b("m")).await.unwrap();
        queue.put_first(b("f")).await.unwrap();
        queue.put_last(b("l")).await.unwrap();
        assert_eq!(queue.take_last().await.unwrap(), b("l"));
        assert_eq!(queue.take_first().await.unwrap(), b("f"));
        assert_eq!(queue.poll_last_timeout(Duration::from_millis(5)).await.unwrap(), Some(b("m")));
        assert_eq!(queue.poll_first_timeout(Duration::from_millis(5)).await.unwrap(), None);
        assert!(queue.offer_first_timeout(b("x"), Duration::from_millis(5)).await.unwrap());
        assert!(queue.offer_last_timeout(b("y"), Duration::from_millis(5)).await.unwrap());
        assert_eq!(queue.to_vec().await.unwrap(), vec![b("x"), b("y")]);
    }
}
