//! Per-queue statistics.
//!
//! Every queue wrapper owns one [`QueueStatistics`]. Counters are lock-free;
//! offer and poll latencies feed independent histogram/meter pairs.

mod histogram;
mod meter;

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

pub use histogram::HistogramSnapshot;
pub use histogram::LatencyHistogram;
pub use meter::Meter;
pub use meter::MeterSnapshot;
use quay_constants::stats::STATS_SNAPSHOT_INTERVAL_MS;

/// Counters, meters and latency histograms for one queue wrapper.
pub struct QueueStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    offer_latency: LatencyHistogram,
    offer_meter: Meter,
    poll_latency: LatencyHistogram,
    poll_meter: Meter,
}

impl Default for QueueStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStatistics {
    /// Statistics with the default snapshot refresh interval.
    pub fn new() -> Self {
        Self::with_snapshot_interval(Duration::from_millis(STATS_SNAPSHOT_INTERVAL_MS))
    }

    /// Statistics whose histogram snapshots refresh every `interval`.
    pub fn with_snapshot_interval(interval: Duration) -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            offer_latency: LatencyHistogram::new(interval),
            offer_meter: Meter::new(),
            poll_latency: LatencyHistogram::new(interval),
            poll_meter: Meter::new(),
        }
    }

    /// Record a completed offer.
    pub fn record_offer(&self, elapsed: Duration, accepted: bool) {
        self.offer_latency.record(elapsed);
        self.offer_meter.mark(1);
        if accepted {
            self.accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed peek or poll.
    pub fn record_poll(&self, elapsed: Duration, hit: bool) {
        self.poll_latency.record(elapsed);
        self.poll_meter.mark(1);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Polls and peeks that returned an element.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Polls and peeks that found the queue empty.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Offers the store accepted.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Offers the store rejected.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn offer_latency(&self) -> HistogramSnapshot {
        self.offer_latency.snapshot()
    }

    pub fn poll_latency(&self) -> HistogramSnapshot {
        self.poll_latency.snapshot()
    }

    pub fn offer_rate(&self) -> MeterSnapshot {
        self.offer_meter.snapshot()
    }

    pub fn poll_rate(&self) -> MeterSnapshot {
        self.poll_meter.snapshot()
    }
}

impl fmt::Display for QueueStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "accepted={} rejected={} hits={} misses={}",
            self.accepted(),
            self.rejected(),
            self.hits(),
            self.misses()
        )?;
        writeln!(f, "offer rate: {}", self.offer_rate())?;
        writeln!(f, "offer latency: {}", self.offer_latency())?;
        writeln!(f, "poll rate: {}", self.poll_rate())?;
        write!(f, "poll latency: {}", self.poll_latency())
    }
}

impl fmt::Debug for QueueStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueStatistics")
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .field("accepted", &self.accepted())
            .field("rejected", &self.rejected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_outcomes() {
        let stats = QueueStatistics::new();
        stats.record_offer(Duration::from_micros(10), true);
        stats.record_offer(Duration::from_micros(10), true);
        stats.record_offer(Duration::from_micros(10), false);
        stats.record_poll(Duration::from_micros(5), true);
        stats.record_poll(Duration::from_micros(5), false);

        assert_eq!(stats.accepted(), 2);
        assert_eq!(stats.rejected(), 1);
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.offer_rate().count, 3);
        assert_eq!(stats.poll_latency().count, 2);
    }

    #[test]
    fn test_summary_mentions_every_section() {
        let stats = QueueStatistics::new();
        stats.record_offer(Duration::from_millis(1), true);
        let summary = stats.to_string();
        for needle in ["accepted=1", "offer rate:", "offer latency:", "poll rate:", "poll latency:", "ops/sec", "ms"] {
            assert!(summary.contains(needle), "missing {needle} in {summary}");
        }
    }
}
