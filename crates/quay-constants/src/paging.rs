//! Page size bounds for paged iteration.

/// Number of elements fetched per page when no hint is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page a single page-fetch invocation may request.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Smallest page a single page-fetch invocation may request.
pub const MIN_PAGE_SIZE: u32 = 1;
