//! Stress run configuration.

use core::time::Duration;

/// How many threads hit a gate, how often, and for how long.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    thread_count: usize,
    iterations: usize,
    /// Stops every worker early once elapsed.
    duration: Option<Duration>,
    /// Upper bound on any single blocking gate call.
    wait_timeout: Duration,
}

impl StressConfig {
    /// Defaults: 4 threads, 1000 iterations each, no time limit, and a
    /// 2 second bound on each blocking call.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            thread_count: 4,
            iterations: 1000,
            duration: None,
            wait_timeout: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub const fn threads(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    #[must_use]
    pub const fn iterations(mut self, count: usize) -> Self {
        self.iterations = count;
        self
    }

    /// Sets the maximum duration for the run; threads stop early once it
    /// is reached.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub const fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Some(Duration::from_secs(secs));
        self
    }

    /// Bounds each blocking `enter`/`put`/`take`/handshake; a call that
    /// times out counts as a failure instead of hanging the run.
    #[must_use]
    pub const fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn get_thread_count(&self) -> usize {
        self.thread_count
    }

    #[must_use]
    pub const fn get_iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub const fn get_duration(&self) -> Option<Duration> {
        self.duration
    }

    #[must_use]
    pub const fn get_wait_timeout(&self) -> Duration {
        self.wait_timeout
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::new()
    }
}
