//! Centralized constants for quay queues.
//!
//! Constants are grouped by concern:
//!
//! - [`position`]: reserved element ids (head/tail sentinels, random windows)
//! - [`paging`]: page size bounds for paged iteration and drains
//! - [`stats`]: statistics refresh and reservoir sizing
//! - [`naming`]: default logical-to-physical naming policy
//!
//! ```
//! use quay_constants::position::APPEND_FAILED_ID;
//! use quay_constants::paging::DEFAULT_PAGE_SIZE;
//!
//! assert_eq!(APPEND_FAILED_ID, i64::MIN);
//! assert!(DEFAULT_PAGE_SIZE > 0);
//! ```

mod assertions;
pub mod naming;
pub mod paging;
pub mod position;
pub mod stats;

pub use paging::DEFAULT_PAGE_SIZE;
pub use paging::MAX_PAGE_SIZE;
pub use position::APPEND_FAILED_ID;
pub use position::HEAD_ID;
pub use position::RANDOM_POSITION_WINDOW;
pub use position::TAIL_ID;
