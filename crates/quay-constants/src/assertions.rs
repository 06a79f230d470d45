//! Compile-time constant assertions.
//!
//! Each assertion verifies a relationship between constants that must hold
//! for queue positions and paging to stay well-formed.

use super::paging::*;
use super::position::*;
use super::stats::*;

// ============================================================================
// Position Windows
// ============================================================================

// The failure marker sits below the head window.
const _: () = assert!(APPEND_FAILED_ID < HEAD_ID);

// Sentinel windows must not overlap and must leave room for element ids.
const _: () = assert!(RANDOM_POSITION_WINDOW > 0);
const _: () = assert!(HEAD_WINDOW_END < FIRST_ELEMENT_ID);
const _: () = assert!(FIRST_ELEMENT_ID < TAIL_WINDOW_START);
const _: () = assert!(HEAD_WINDOW_END < TAIL_WINDOW_START);

// ============================================================================
// Paging
// ============================================================================

const _: () = assert!(MIN_PAGE_SIZE > 0);
const _: () = assert!(DEFAULT_PAGE_SIZE >= MIN_PAGE_SIZE);
const _: () = assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);

// ============================================================================
// Statistics
// ============================================================================

const _: () = assert!(STATS_SNAPSHOT_INTERVAL_MS > 0);
const _: () = assert!(HISTOGRAM_RESERVOIR_SIZE > 0);
const _: () = assert!(METER_TICK_INTERVAL_SECS > 0);
