//! Stress framework for the admission gates.
//!
//! A [`StressHarness`] spawns worker threads that call one operation
//! repeatedly. The operation returns `true` when the gate's invariant held
//! for that iteration, so a correct gate produces zero failures no matter
//! how the threads interleave.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::metrics::Metrics;

pub mod config;
pub mod gates;

pub use config::StressConfig;

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressResult {
    /// Iterations whose invariant check held
    pub successes: usize,
    /// Iterations that observed a violation or gave up waiting
    pub failures: usize,
    pub duration: Duration,
    pub thread_count: usize,
}

impl StressResult {
    #[must_use]
    pub const fn new(
        successes: usize,
        failures: usize,
        duration: Duration,
        thread_count: usize,
    ) -> Self {
        Self {
            successes,
            failures,
            duration,
            thread_count,
        }
    }

    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.successes + self.failures
    }

    /// Returns the success rate as a value between 0.0 and 1.0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_operations() == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_operations() as f64
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn operations_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.total_operations() as f64 / secs
        }
    }
}

/// Runs an operation on many threads against shared gate state.
pub struct StressHarness {
    config: StressConfig,
}

impl StressHarness {
    #[must_use]
    pub const fn new(config: StressConfig) -> Self {
        Self { config }
    }

    /// Runs `operation(thread_id, iteration)` on every worker until its
    /// iterations are done or the configured duration elapses.
    ///
    /// # Examples
    ///
    /// ```
    /// use foundation_gates::GuardedCountPool;
    /// use foundation_gates_testing::stress::{StressConfig, StressHarness};
    /// use std::sync::Arc;
    ///
    /// let pool = Arc::new(GuardedCountPool::new(2).unwrap());
    /// let harness = StressHarness::new(StressConfig::new().threads(4).iterations(50));
    ///
    /// let result = harness.run(move |_thread_id, _iteration| {
    ///     let permit = pool.admit().unwrap();
    ///     drop(permit);
    ///     true
    /// });
    /// assert_eq!(result.successes, 200);
    /// ```
    ///
    /// # Panics
    ///
    /// Re-raises the panic of any worker that panicked.
    pub fn run<F>(self, operation: F) -> StressResult
    where
        F: Fn(usize, usize) -> bool + Send + Sync + 'static,
    {
        self.execute(operation, false).0
    }

    /// Like [`Self::run`], also timing every operation.
    ///
    /// # Panics
    ///
    /// Re-raises the panic of any worker that panicked.
    pub fn run_with_metrics<F>(self, operation: F) -> (StressResult, Metrics)
    where
        F: Fn(usize, usize) -> bool + Send + Sync + 'static,
    {
        let (result, latencies) = self.execute(operation, true);
        let metrics = Metrics::new(result.total_operations(), result.duration)
            .with_latencies(latencies)
            .with_throughput();
        (result, metrics)
    }

    fn execute<F>(self, operation: F, timed: bool) -> (StressResult, Vec<u64>)
    where
        F: Fn(usize, usize) -> bool + Send + Sync + 'static,
    {
        let start = Instant::now();
        let operation = Arc::new(operation);

        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));
        let stop_flag = Arc::new(AtomicBool::new(false));

        if let Some(duration) = self.config.get_duration() {
            let stop_flag_clone = Arc::clone(&stop_flag);
            thread::spawn(move || {
                thread::sleep(duration);
                stop_flag_clone.store(true, Ordering::Release);
            });
        }

        let mut handles = Vec::with_capacity(self.config.get_thread_count());
        for thread_id in 0..self.config.get_thread_count() {
            let operation = Arc::clone(&operation);
            let successes = Arc::clone(&successes);
            let failures = Arc::clone(&failures);
            let stop_flag = Arc::clone(&stop_flag);
            let iterations = self.config.get_iterations();

            handles.push(thread::spawn(move || {
                let mut latencies = Vec::new();
                for iteration in 0..iterations {
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }

                    let began = Instant::now();
                    let held = operation(thread_id, iteration);
                    if timed {
                        latencies.push(
                            u64::try_from(began.elapsed().as_nanos()).unwrap_or(u64::MAX),
                        );
                    }

                    if held {
                        successes.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
                latencies
            }));
        }

        let mut latencies = Vec::new();
        for handle in handles {
            match handle.join() {
                Ok(worker_latencies) => latencies.extend(worker_latencies),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }

        let result = StressResult::new(
            successes.load(Ordering::Relaxed),
            failures.load(Ordering::Relaxed),
            start.elapsed(),
            self.config.get_thread_count(),
        );
        tracing::debug!(
            successes = result.successes,
            failures = result.failures,
            "stress run finished"
        );
        (result, latencies)
    }
}
