//! Boundary contract between quay queues and the partitioned store.
//!
//! The store itself (partitioning, replication, persistence) lives outside this
//! workspace. This crate only names what the queue layer needs from it:
//!
//! - [`QueueKey`]: structured `(hash, id)` position keys and the reserved
//!   head/tail sentinel keys
//! - [`QueueProcessor`] / [`ProcessorResult`]: processor descriptors invoked
//!   atomically against a single key, and their typed results
//! - [`QueueEvent`] / [`StoreListener`]: change notifications scoped to a queue
//! - [`QueueStore`] / [`QueueSession`]: the store handle and the session that
//!   resolves physical cache names to store handles
//!
//! Every store operation is single-key atomic; this layer never observes
//! partial execution of a processor.

mod error;
mod event;
mod key;
mod processor;
mod result;
mod traits;

pub use error::StoreError;
pub use event::ListenerId;
pub use event::QueueEvent;
pub use event::QueueEventKind;
pub use event::StoreListener;
pub use key::KeyPosition;
pub use key::QueueKey;
pub use key::queue_name_hash;
pub use processor::EntryFilter;
pub use processor::PageDirection;
pub use processor::PageRequest;
pub use processor::ProcessorResult;
pub use processor::QueueEnd;
pub use processor::QueueProcessor;
pub use result::OfferStatus;
pub use result::QueueOfferResult;
pub use result::QueuePage;
pub use result::QueuePollResult;
pub use traits::QueueSession;
pub use traits::QueueStore;
pub use traits::StoreIdentity;
