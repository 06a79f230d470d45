//! Element-level change listeners.
//!
//! Store notifications carry raw payloads. The adapters here expose them as
//! typed events that decode or convert only when a value is actually read.

use std::sync::Arc;

use quay_store::QueueEvent;
use quay_store::QueueEventKind;
use quay_store::QueueKey;
use quay_store::StoreListener;

use crate::codec::ValueCodec;
use crate::converter::Convert;
use crate::error::Result;

/// A change to one queue element, viewed as type `V`.
pub trait QueueEventView<V>: Send + Sync {
    fn kind(&self) -> QueueEventKind;

    fn key(&self) -> QueueKey;

    /// Value before the change, decoded on demand.
    fn old_value(&self) -> Result<Option<V>>;

    /// Value after the change, decoded on demand.
    fn new_value(&self) -> Result<Option<V>>;
}

/// Receives element changes for one queue.
///
/// Runs on the store's delivery path and must not block.
pub trait QueueListener<V>: Send + Sync {
    fn on_event(&self, event: &dyn QueueEventView<V>);
}

/// A raw store event decoded through a codec.
pub struct CodecEvent<'a, C> {
    event: &'a QueueEvent,
    codec: &'a C,
}

impl<'a, C: ValueCodec> CodecEvent<'a, C> {
    pub fn new(event: &'a QueueEvent, codec: &'a C) -> Self {
        Self { event, codec }
    }
}

impl<C: ValueCodec> QueueEventView<C::Value> for CodecEvent<'_, C> {
    fn kind(&self) -> QueueEventKind {
        self.event.kind
    }

    fn key(&self) -> QueueKey {
        self.event.key
    }

    fn old_value(&self) -> Result<Option<C::Value>> {
        self.event.old_value.as_ref().map(|bytes| self.codec.decode(bytes)).transpose()
    }

    fn new_value(&self) -> Result<Option<C::Value>> {
        self.event.new_value.as_ref().map(|bytes| self.codec.decode(bytes)).transpose()
    }
}

/// Adapts a typed [`QueueListener`] to the store's raw listener interface.
pub struct CodecListener<C: ValueCodec> {
    codec: Arc<C>,
    inner: Arc<dyn QueueListener<C::Value>>,
}

impl<C: ValueCodec> CodecListener<C> {
    pub fn new(codec: Arc<C>, inner: Arc<dyn QueueListener<C::Value>>) -> Self {
        Self { codec, inner }
    }
}

impl<C: ValueCodec> StoreListener for CodecListener<C> {
    fn on_event(&self, event: &QueueEvent) {
        self.inner.on_event(&CodecEvent::new(event, self.codec.as_ref()));
    }
}

/// An event whose values pass through a one-way converter when read.
pub struct ConverterEvent<'a, V, T> {
    inner: &'a dyn QueueEventView<V>,
    convert: &'a dyn Convert<V, T>,
}

impl<V, T> QueueEventView<T> for ConverterEvent<'_, V, T>
where
    V: Send + Sync,
    T: Send + Sync,
{
    fn kind(&self) -> QueueEventKind {
        self.inner.kind()
    }

    fn key(&self) -> QueueKey {
        self.inner.key()
    }

    fn old_value(&self) -> Result<Option<T>> {
        self.inner.old_value()?.map(|value| self.convert.convert(value)).transpose()
    }

    fn new_value(&self) -> Result<Option<T>> {
        self.inner.new_value()?.map(|value| self.convert.convert(value)).transpose()
    }
}

/// Presents a listener of `T` as a listener of `V`.
pub struct ConverterListener<V, T> {
    convert: Arc<dyn Convert<V, T>>,
    inner: Arc<dyn QueueListener<T>>,
}

impl<V, T> ConverterListener<V, T> {
    pub fn new(convert: Arc<dyn Convert<V, T>>, inner: Arc<dyn QueueListener<T>>) -> Self {
        Self { convert, inner }
    }
}

impl<V, T> QueueListener<V> for ConverterListener<V, T>
where
    V: Send + Sync,
    T: Send + Sync,
{
    fn on_event(&self, event: &dyn QueueEventView<V>) {
        let converted = ConverterEvent {
            inner: event,
            convert: self.convert.as_ref(),
        };
        self.inner.on_event(&converted);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use super::*;
    use crate::codec::BinaryCodec;
    use crate::error::QueueError;

    struct Capture(Mutex<Vec<(QueueEventKind, Option<String>)>>);

    impl QueueListener<String> for Capture {
        fn on_event(&self, event: &dyn QueueEventView<String>) {
            let value = match event.kind() {
                QueueEventKind::Deleted => event.old_value().ok().flatten(),
                _ => event.new_value().ok().flatten(),
            };
            self.0.lock().push((event.kind(), value));
        }
    }

    #[test]
    fn test_converter_listener_translates_payloads() {
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        let convert: Arc<dyn Convert<Bytes, String>> = Arc::new(|bytes: Bytes| -> Result<String> {
            String::from_utf8(bytes.to_vec()).map_err(|e| QueueError::Conversion { reason: e.to_string() })
        });
        let typed = Arc::new(ConverterListener::new(convert, capture.clone()));
        let raw = CodecListener::new(Arc::new(BinaryCodec), typed);

        let key = QueueKey::new(1, 0);
        raw.on_event(&QueueEvent::inserted(key, Bytes::from_static(b"hi")));
        raw.on_event(&QueueEvent::deleted(key, Bytes::from_static(b"hi")));

        let seen = capture.0.lock().clone();
        assert_eq!(seen, vec![
            (QueueEventKind::Inserted, Some("hi".to_string())),
            (QueueEventKind::Deleted, Some("hi".to_string())),
        ]);
    }

    struct Counting(AtomicUsize);

    impl QueueListener<String> for Counting {
        fn on_event(&self, _event: &dyn QueueEventView<String>) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_values_are_converted_lazily() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let convert: Arc<dyn Convert<Bytes, String>> = Arc::new(move |_bytes: Bytes| -> Result<String> {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(String::new())
        });
        let listener = Arc::new(Counting(AtomicUsize::new(0)));
        let adapter = ConverterListener::new(convert, listener.clone());
        let raw = CodecListener::new(Arc::new(BinaryCodec), Arc::new(adapter));

        raw.on_event(&QueueEvent::inserted(QueueKey::new(1, 0), Bytes::from_static(b"x")));
        assert_eq!(listener.0.load(Ordering::Relaxed), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }
}
