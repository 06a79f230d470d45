//! Testing infrastructure for quay.
//!
//! Provides [`DeterministicQueueStore`], an in-memory implementation of
//! [`QueueStore`](quay_store::QueueStore) that executes every processor
//! contract atomically, and [`DeterministicSession`], which resolves cache
//! names to shared stores.
//!
//! Notifications are delivered synchronously on the mutating task after the
//! data lock is released, so a test observes them before the mutating call
//! returns.

mod session;
mod store;

pub use session::DeterministicSession;
pub use store::DeterministicQueueStore;
