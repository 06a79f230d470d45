//! Throughput meter with exponentially decaying moving averages.

use std::fmt;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Mutex;
use quay_constants::stats::METER_TICK_INTERVAL_SECS;

const TICK_INTERVAL: Duration = Duration::from_secs(METER_TICK_INTERVAL_SECS);

/// One exponentially weighted moving average, in events per second.
#[derive(Debug, Clone, Copy)]
struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-(METER_TICK_INTERVAL_SECS as f64) / (minutes * 60.0)).exp();
        Self {
            alpha,
            rate: 0.0,
            initialized: false,
        }
    }

    fn tick(&mut self, uncounted: u64) {
        let instant_rate = uncounted as f64 / METER_TICK_INTERVAL_SECS as f64;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Apply `ticks` idle ticks at once.
    fn decay(&mut self, ticks: u64) {
        if !self.initialized || ticks == 0 {
            return;
        }
        let exponent = i32::try_from(ticks).unwrap_or(i32::MAX);
        self.rate *= (1.0 - self.alpha).powi(exponent);
    }
}

struct MeterState {
    count: u64,
    uncounted: u64,
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl MeterState {
    fn tick_if_necessary(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = elapsed.as_secs() / METER_TICK_INTERVAL_SECS;
        if ticks == 0 {
            return;
        }
        self.last_tick += TICK_INTERVAL * u32::try_from(ticks).unwrap_or(u32::MAX);

        let uncounted = std::mem::take(&mut self.uncounted);
        for ewma in [&mut self.m1, &mut self.m5, &mut self.m15] {
            ewma.tick(uncounted);
            ewma.decay(ticks - 1);
        }
    }
}

/// Point-in-time view of a [`Meter`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterSnapshot {
    /// Events marked since creation.
    pub count: u64,
    /// Events per second since creation.
    pub mean_rate: f64,
    /// One-minute moving average, events per second.
    pub one_minute_rate: f64,
    /// Five-minute moving average, events per second.
    pub five_minute_rate: f64,
    /// Fifteen-minute moving average, events per second.
    pub fifteen_minute_rate: f64,
}

impl fmt::Display for MeterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={} mean={:.3}ops/sec 1m={:.3}ops/sec 5m={:.3}ops/sec 15m={:.3}ops/sec",
            self.count, self.mean_rate, self.one_minute_rate, self.five_minute_rate, self.fifteen_minute_rate
        )
    }
}

/// Thread-safe event rate meter.
///
/// Tracks the all-time mean rate and 1/5/15-minute decaying rates, updated
/// in fixed ticks whenever the meter is marked or read.
pub struct Meter {
    started: Instant,
    state: Mutex<MeterState>,
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Meter {
    /// Create a meter starting now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub(crate) fn starting_at(started: Instant) -> Self {
        Self {
            started,
            state: Mutex::new(MeterState {
                count: 0,
                uncounted: 0,
                last_tick: started,
                m1: Ewma::over_minutes(1.0),
                m5: Ewma::over_minutes(5.0),
                m15: Ewma::over_minutes(15.0),
            }),
        }
    }

    /// Record `n` events.
    pub fn mark(&self, n: u64) {
        self.mark_at(n, Instant::now());
    }

    pub(crate) fn mark_at(&self, n: u64, now: Instant) {
        let mut state = self.state.lock();
        state.tick_if_necessary(now);
        state.count = state.count.saturating_add(n);
        state.uncounted = state.uncounted.saturating_add(n);
    }

    /// Events marked since creation.
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Current rates.
    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut state = self.state.lock();
        state.tick_if_necessary(now);
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let mean_rate = if elapsed > 0.0 { state.count as f64 / elapsed } else { 0.0 };
        MeterSnapshot {
            count: state.count,
            mean_rate,
            one_minute_rate: state.m1.rate,
            five_minute_rate: state.m5.rate,
            fifteen_minute_rate: state.m15.rate,
        }
    }
}
