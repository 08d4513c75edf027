//! Human-readable stress reports.

use core::fmt::{self, Write};

use super::Metrics;
use crate::stress::StressResult;

/// A titled summary of one stress run.
pub struct PerformanceReport {
    title: String,
    result: StressResult,
    metrics: Metrics,
}

impl PerformanceReport {
    #[must_use]
    pub fn new(title: impl Into<String>, result: StressResult, metrics: Metrics) -> Self {
        Self {
            title: title.into(),
            result,
            metrics,
        }
    }

    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub const fn result(&self) -> &StressResult {
        &self.result
    }

    fn render(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "=== {} ===", self.title)?;
        writeln!(out, "Threads: {}", self.result.thread_count)?;
        writeln!(
            out,
            "Operations: {} ({} failed)",
            self.result.total_operations(),
            self.result.failures
        )?;
        writeln!(out, "Duration: {:?}", self.metrics.duration)?;
        writeln!(out, "Throughput: {:.2} ops/sec", self.metrics.throughput)?;

        if self.metrics.latencies.is_empty() {
            return Ok(());
        }
        writeln!(out, "\nLatency (ns):")?;
        let rows = [
            ("Min", self.metrics.min_latency()),
            ("Median", self.metrics.median_latency()),
            ("P99", self.metrics.p99_latency()),
            ("Max", self.metrics.max_latency()),
        ];
        for (label, value) in rows {
            if let Some(value) = value {
                writeln!(out, "  {label}: {value}")?;
            }
        }
        if let Some(avg) = self.metrics.avg_latency() {
            writeln!(out, "  Avg: {avg:.0}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}
