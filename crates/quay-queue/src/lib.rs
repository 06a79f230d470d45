//! Distributed FIFO queues and deques over a partitioned key-value store.
//!
//! Elements of one queue live in the store under keys `(hash, id)`, where
//! `hash` identifies the queue and `id` orders its elements. Two reserved
//! sentinel ids mark the head and tail; every operation is a single processor
//! invocation at one of them, executed atomically by the partition that owns
//! the queue.
//!
//! Layers, innermost first:
//!
//! - [`StoreQueue`]: the engine, over raw payloads ([`BinaryQueue`]) or serde
//!   values ([`TypedQueue`])
//! - [`PagedIterator`]: cursor-based paged traversal and draining
//! - [`DelegatingQueue`] / [`ConverterQueue`]: renaming and element conversion
//! - [`BlockingWrapper`]: `put`/`take` with timeouts and interruption
//! - [`QueueBuilder`]: assembles the stack for a logical queue name
//!
//! All operations are `async` and return [`Result`] with [`QueueError`].

mod blocking;
mod builder;
mod codec;
mod converter;
mod delegating;
mod engine;
mod error;
mod iterator;
mod listener;
mod stats;
mod traits;
pub mod verified;

pub use blocking::BlockingWrapper;
pub use builder::BinarySessionQueue;
pub use builder::BlockingBinaryQueue;
pub use builder::BlockingSessionQueue;
pub use builder::CollectionNaming;
pub use builder::QueueBuilder;
pub use builder::QueueConfig;
pub use builder::SessionQueue;
pub use builder::TypedSessionQueue;
pub use codec::BinaryCodec;
pub use codec::CodecKind;
pub use codec::JsonCodec;
pub use codec::PostcardCodec;
pub use codec::TypedCodec;
pub use codec::ValueCodec;
pub use converter::Convert;
pub use converter::ConverterQueue;
pub use converter::ConvertingCursor;
pub use delegating::DelegatingQueue;
pub use engine::BinaryQueue;
pub use engine::EngineOptions;
pub use engine::StoreQueue;
pub use engine::TypedQueue;
pub use error::QueueError;
pub use error::Result;
pub use iterator::PagedIterator;
pub use iterator::collect;
pub use iterator::cursor_stream;
pub use listener::CodecEvent;
pub use listener::CodecListener;
pub use listener::ConverterEvent;
pub use listener::ConverterListener;
pub use listener::QueueEventView;
pub use listener::QueueListener;
pub use stats::HistogramSnapshot;
pub use stats::LatencyHistogram;
pub use stats::Meter;
pub use stats::MeterSnapshot;
pub use stats::QueueStatistics;
pub use traits::BlockingDeque;
pub use traits::BlockingQueue;
pub use traits::NamedCollection;
pub use traits::NamedDeque;
pub use traits::NamedQueue;
pub use traits::QueueCursor;
