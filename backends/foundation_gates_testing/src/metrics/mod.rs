//! Latency and throughput of gate operations.

pub mod reporter;

pub use reporter::PerformanceReport;

use core::time::Duration;

/// Timing collected by [`crate::StressHarness::run_with_metrics`].
///
/// Latencies are per operation in nanoseconds and include the time spent
/// blocked at the gate, so they measure admission delay as much as the cost
/// of the lock itself.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub latencies: Vec<u64>,
    /// Operations per second
    pub throughput: f64,
    pub operations: usize,
    pub duration: Duration,
}

impl Metrics {
    #[must_use]
    pub const fn new(operations: usize, duration: Duration) -> Self {
        Self {
            latencies: Vec::new(),
            throughput: 0.0,
            operations,
            duration,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_throughput(mut self) -> Self {
        let secs = self.duration.as_secs_f64();
        self.throughput = if secs > 0.0 {
            self.operations as f64 / secs
        } else {
            0.0
        };
        self
    }

    /// Stores the latencies sorted so percentiles are a lookup.
    #[must_use]
    pub fn with_latencies(mut self, mut latencies: Vec<u64>) -> Self {
        latencies.sort_unstable();
        self.latencies = latencies;
        self
    }

    #[must_use]
    pub fn min_latency(&self) -> Option<u64> {
        self.latencies.first().copied()
    }

    #[must_use]
    pub fn max_latency(&self) -> Option<u64> {
        self.latencies.last().copied()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_latency(&self) -> Option<f64> {
        if self.latencies.is_empty() {
            return None;
        }
        let sum: u128 = self.latencies.iter().map(|value| u128::from(*value)).sum();
        Some(sum as f64 / self.latencies.len() as f64)
    }

    /// Latency at `percentile` (0.0 to 1.0), nearest-rank.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn percentile_latency(&self, percentile: f64) -> Option<u64> {
        if self.latencies.is_empty() || !(0.0..=1.0).contains(&percentile) {
            return None;
        }
        let rank = ((self.latencies.len() as f64) * percentile).ceil() as usize;
        let index = rank.saturating_sub(1).min(self.latencies.len() - 1);
        Some(self.latencies[index])
    }

    #[must_use]
    pub fn median_latency(&self) -> Option<u64> {
        self.percentile_latency(0.5)
    }

    #[must_use]
    pub fn p99_latency(&self) -> Option<u64> {
        self.percentile_latency(0.99)
    }
}
