//! Logical-to-physical collection naming.

/// Prefix prepended to a logical queue name to form its physical cache name.
pub const DEFAULT_CACHE_PREFIX: &str = "queue$";

/// Service name used when a session does not name one explicitly.
pub const DEFAULT_SERVICE_NAME: &str = "quay-queues";
