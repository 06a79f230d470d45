//! quay: distributed FIFO/LIFO queues and deques on a partitioned key-value
//! store.
//!
//! This facade re-exports the member crates and adds the process-level
//! pieces: layered [`config`] and the [`telemetry`] bootstrap.
//!
//! ```ignore
//! let config = quay::config::QuayConfig::load(None)?;
//! let builder = quay::QueueBuilder::with_config(session, config.queue_config());
//! let jobs = builder.blocking_queue::<Job>("jobs").await?;
//! jobs.put(job).await?;
//! ```

pub mod config;
pub mod telemetry;

pub use quay_constants as constants;
pub use quay_queue::*;
pub use quay_store as store;
