//! Reserved element ids.
//!
//! Every queue position is a `(hash, id)` pair. The extremes of the `i64` id
//! space are reserved: the lowest value is the failure marker returned by
//! `append`/`prepend`, followed by a window of head sentinels; the highest
//! window holds the tail sentinels. Element ids are always assigned strictly
//! between the two windows.

/// Id returned by `append` and `prepend` when the store rejected the element.
pub const APPEND_FAILED_ID: i64 = i64::MIN;

/// Id of the head sentinel position.
pub const HEAD_ID: i64 = i64::MIN + 1;

/// Id of the tail sentinel position.
pub const TAIL_ID: i64 = i64::MAX;

/// Width of the window next to each sentinel used by random head/tail keys.
pub const RANDOM_POSITION_WINDOW: i64 = 1024;

/// Highest id in the head sentinel window (inclusive).
pub const HEAD_WINDOW_END: i64 = HEAD_ID + RANDOM_POSITION_WINDOW - 1;

/// Lowest id in the tail sentinel window (inclusive).
pub const TAIL_WINDOW_START: i64 = TAIL_ID - RANDOM_POSITION_WINDOW + 1;

/// Id assigned to the first element offered to an empty queue.
pub const FIRST_ELEMENT_ID: i64 = 0;
