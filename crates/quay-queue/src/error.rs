//! Queue-level errors.

use quay_store::StoreError;
use snafu::Snafu;

/// Errors returned by queue and deque operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QueueError {
    /// A null element was passed where a value is required.
    #[snafu(display("null elements are not permitted ({operation})"))]
    NullElement {
        /// Rejected operation.
        operation: &'static str,
    },

    /// The queue has no element to return.
    #[snafu(display("queue '{name}' is empty"))]
    NoSuchElement {
        /// Queue name.
        name: String,
    },

    /// The queue is at capacity and the operation does not tolerate rejection.
    #[snafu(display("queue '{name}' is full"))]
    QueueFull {
        /// Queue name.
        name: String,
    },

    /// The store refused the element for a reason other than capacity.
    #[snafu(display("queue '{name}' rejected the element"))]
    OfferRejected {
        /// Queue name.
        name: String,
    },

    /// A bulk operation named the queue itself as its source or target.
    #[snafu(display("queue '{name}' cannot be combined with itself"))]
    SelfReference {
        /// Queue name.
        name: String,
    },

    /// The queue changed underneath a materializing traversal.
    #[snafu(display("queue '{name}' was modified during traversal: {source}"))]
    ConcurrentModification {
        /// Queue name.
        name: String,
        /// The failure observed mid-traversal.
        source: Box<QueueError>,
    },

    /// A blocking call was cancelled.
    #[snafu(display("{operation} was interrupted"))]
    Interrupted {
        /// Interrupted operation.
        operation: &'static str,
    },

    /// JSON encoding or decoding failed.
    #[snafu(display("json codec error: {source}"))]
    Json {
        /// The underlying error.
        source: serde_json::Error,
    },

    /// Postcard encoding or decoding failed.
    #[snafu(display("postcard codec error: {source}"))]
    Postcard {
        /// The underlying error.
        source: postcard::Error,
    },

    /// A value converter refused its input.
    #[snafu(display("conversion failed: {reason}"))]
    Conversion {
        /// Description of what went wrong.
        reason: String,
    },

    /// Underlying store error.
    #[snafu(display("store error: {source}"))]
    Store {
        /// The underlying error.
        source: StoreError,
    },
}

impl QueueError {
    /// Whether this is an element representation failure (codec or converter).
    pub fn is_representation(&self) -> bool {
        matches!(self, QueueError::Json { .. } | QueueError::Postcard { .. } | QueueError::Conversion { .. })
    }
}

impl From<StoreError> for QueueError {
    fn from(source: StoreError) -> Self {
        QueueError::Store { source }
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(source: serde_json::Error) -> Self {
        QueueError::Json { source }
    }
}

impl From<postcard::Error> for QueueError {
    fn from(source: postcard::Error) -> Self {
        QueueError::Postcard { source }
    }
}

/// Convenience alias.
pub type Result<T, E = QueueError> = std::result::Result<T, E>;
