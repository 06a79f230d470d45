//! Statistics refresh and sizing.

/// Minimum interval between two histogram snapshot recomputations (1 second).
pub const STATS_SNAPSHOT_INTERVAL_MS: u64 = 1_000;

/// Number of latency samples retained by each histogram reservoir.
pub const HISTOGRAM_RESERVOIR_SIZE: usize = 1028;

/// Interval at which meters fold pending marks into their moving averages.
pub const METER_TICK_INTERVAL_SECS: u64 = 5;
