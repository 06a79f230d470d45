//! Pure computation functions for the queue engine.
//!
//! Deterministic and side-effect free: time and sizes are passed in
//! explicitly, arithmetic saturates.

use std::time::Duration;

use quay_constants::paging::MAX_PAGE_SIZE;
use quay_constants::paging::MIN_PAGE_SIZE;
use quay_constants::position::HEAD_ID;
use quay_constants::position::TAIL_ID;
use quay_store::PageDirection;
use quay_store::StoreIdentity;

/// Clamp a configured page size into the supported range.
#[inline]
pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Size of the next page fetch: the page hint, bounded by the remaining budget.
///
/// Returns 0 when the budget is spent.
///
/// # Example
///
/// ```
/// use quay_queue::verified::next_page_size;
///
/// assert_eq!(next_page_size(100, None), 100);
/// assert_eq!(next_page_size(100, Some(7)), 7);
/// assert_eq!(next_page_size(100, Some(0)), 0);
/// ```
#[inline]
pub fn next_page_size(page_size_hint: u32, remaining: Option<u64>) -> u32 {
    let hint = clamp_page_size(page_size_hint);
    match remaining {
        None => hint,
        Some(budget) => u32::try_from(budget).map_or(hint, |budget| budget.min(hint)),
    }
}

/// Initial cursor for a traversal: the sentinel at the far end of the direction.
#[inline]
pub fn initial_cursor(direction: PageDirection) -> i64 {
    match direction {
        PageDirection::Forward => HEAD_ID,
        PageDirection::Backward => TAIL_ID,
    }
}

/// Budget left after a page of `taken` elements.
#[inline]
pub fn remaining_after(remaining: Option<u64>, taken: usize) -> Option<u64> {
    remaining.map(|budget| budget.saturating_sub(taken as u64))
}

/// Wait budget left after waiting `elapsed`.
#[inline]
pub fn remaining_wait(budget: Duration, elapsed: Duration) -> Duration {
    budget.saturating_sub(elapsed)
}

/// Whether two wrappers address the same elements.
#[inline]
pub fn is_same_queue(a: &StoreIdentity, a_hash: i32, b: &StoreIdentity, b_hash: i32) -> bool {
    a_hash == b_hash && a == b
}
