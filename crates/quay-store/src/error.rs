//! Errors surfaced by the partitioned store.

use snafu::Snafu;

/// Failures reported by a [`QueueStore`](crate::QueueStore).
///
/// The queue layer never retries these; they propagate to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The store (or the partition owning the key) is not reachable.
    #[snafu(display("store unavailable: {reason}"))]
    Unavailable {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// The invocation did not complete in time.
    #[snafu(display("store invocation timed out after {duration_ms}ms"))]
    Timeout {
        /// How long the caller waited.
        duration_ms: u64,
    },

    /// A processor returned a result of the wrong shape.
    #[snafu(display("unexpected processor result: expected {expected}, got {actual}"))]
    UnexpectedResult {
        /// Result kind the caller asked for.
        expected: &'static str,
        /// Result kind the store returned.
        actual: &'static str,
    },

    /// A processor was invoked at a key that cannot host it.
    #[snafu(display("invalid position {key} for {operation}"))]
    InvalidPosition {
        /// Display form of the offending key.
        key: String,
        /// Processor that was rejected.
        operation: &'static str,
    },

    /// The backing collection was destroyed.
    #[snafu(display("collection '{cache_name}' has been destroyed"))]
    Destroyed {
        /// Physical cache name.
        cache_name: String,
    },

    /// Any other backend failure.
    #[snafu(display("store backend error: {reason}"))]
    Backend {
        /// Human-readable description of the failure.
        reason: String,
    },
}
