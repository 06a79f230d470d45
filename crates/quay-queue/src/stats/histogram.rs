//! Latency histogram over a uniform reservoir sample.

use std::fmt;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Mutex;
use quay_constants::stats::HISTOGRAM_RESERVOIR_SIZE;
use rand::Rng;

/// Point-in-time latency distribution, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramSnapshot {
    /// Total number of recorded samples (not only those kept in the reservoir).
    pub count: u64,
    /// Smallest sampled value.
    pub min: u64,
    /// Largest sampled value.
    pub max: u64,
    /// Mean of the sampled values.
    pub mean: f64,
    /// 50th percentile.
    pub p50: u64,
    /// 75th percentile.
    pub p75: u64,
    /// 95th percentile.
    pub p95: u64,
    /// 99th percentile.
    pub p99: u64,
}

fn nanos_to_ms(nanos: f64) -> f64 {
    nanos / 1_000_000.0
}

impl HistogramSnapshot {
    fn from_samples(count: u64, samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let sum: u128 = sorted.iter().map(|v| u128::from(*v)).sum();

        Self {
            count,
            min: sorted.first().copied().unwrap_or(0),
            max: sorted.last().copied().unwrap_or(0),
            mean: sum as f64 / sorted.len() as f64,
            p50: percentile(&sorted, 0.50),
            p75: percentile(&sorted, 0.75),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        }
    }

    /// Mean latency in milliseconds.
    pub fn mean_ms(&self) -> f64 {
        nanos_to_ms(self.mean)
    }

    /// Median latency in milliseconds.
    pub fn p50_ms(&self) -> f64 {
        nanos_to_ms(self.p50 as f64)
    }

    /// 99th percentile latency in milliseconds.
    pub fn p99_ms(&self) -> f64 {
        nanos_to_ms(self.p99 as f64)
    }

    /// Maximum latency in milliseconds.
    pub fn max_ms(&self) -> f64 {
        nanos_to_ms(self.max as f64)
    }
}

impl fmt::Display for HistogramSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={} mean={:.3}ms p50={:.3}ms p75={:.3}ms p95={:.3}ms p99={:.3}ms max={:.3}ms",
            self.count,
            self.mean_ms(),
            self.p50_ms(),
            nanos_to_ms(self.p75 as f64),
            nanos_to_ms(self.p95 as f64),
            self.p99_ms(),
            self.max_ms()
        )
    }
}

/// Calculate percentile from sorted values.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

struct Reservoir {
    samples: Vec<u64>,
    count: u64,
}

impl Reservoir {
    fn update(&mut self, value: u64) {
        self.count = self.count.saturating_add(1);
        if self.samples.len() < HISTOGRAM_RESERVOIR_SIZE {
            self.samples.push(value);
            return;
        }
        let slot = rand::rng().random_range(0..self.count);
        if let Ok(slot) = usize::try_from(slot)
            && slot < self.samples.len()
        {
            self.samples[slot] = value;
        }
    }
}

/// Thread-safe latency histogram.
///
/// Samples are kept in a fixed-size uniform reservoir. Snapshots are
/// recomputed lazily, at most once per refresh interval; callers in between
/// get the cached snapshot.
pub struct LatencyHistogram {
    reservoir: Mutex<Reservoir>,
    cached: Mutex<Option<(Instant, HistogramSnapshot)>>,
    refresh_interval: Duration,
}

impl LatencyHistogram {
    /// Create a histogram whose snapshots refresh every `refresh_interval`.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            reservoir: Mutex::new(Reservoir {
                samples: Vec::with_capacity(HISTOGRAM_RESERVOIR_SIZE),
                count: 0,
            }),
            cached: Mutex::new(None),
            refresh_interval,
        }
    }

    /// Record one duration.
    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.reservoir.lock().update(nanos);
    }

    /// Current snapshot, refreshed if the cached one is stale.
    pub fn snapshot(&self) -> HistogramSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> HistogramSnapshot {
        let mut cached = self.cached.lock();
        if let Some((taken, snapshot)) = *cached
            && now.saturating_duration_since(taken) < self.refresh_interval
        {
            return snapshot;
        }
        let snapshot = {
            let reservoir = self.reservoir.lock();
            HistogramSnapshot::from_samples(reservoir.count, &reservoir.samples)
        };
        *cached = Some((now, snapshot));
        snapshot
    }
}
