//! How long, and under which interruption, a gate operation may block.

use core::time::Duration;
use std::time::Instant;

use super::CancelToken;
use crate::errors::{GateError, GateResult};

/// Default interval at which a cancellable wait re-checks its token.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Options for a blocking gate operation.
///
/// Defaults: no deadline, no cancel token (block until admitted), and a
/// 5ms token poll interval.
///
/// ```
/// use foundation_gates::{CancelToken, WaitOptions};
/// use std::time::Duration;
///
/// let token = CancelToken::new();
/// let options = WaitOptions::new()
///     .timeout(Duration::from_millis(250))
///     .cancel_token(token.clone());
/// assert!(options.get_deadline().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct WaitOptions {
    deadline: Option<Instant>,
    token: Option<CancelToken>,
    poll_interval: Duration,
}

impl WaitOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Gives up after `duration` from now.
    #[must_use]
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.deadline = Some(Instant::now() + duration);
        self
    }

    /// Gives up at `deadline`.
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Gives up once `token` is cancelled.
    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets how often a cancellable wait wakes to look at its token.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn get_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn get_token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn get_poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// True when neither a deadline nor a token can interrupt the wait.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.deadline.is_none() && self.token.is_none()
    }

    /// Reports why the wait should stop now, if it should.
    pub(crate) fn interruption(&self, now: Instant) -> Option<WaitStatus> {
        if self.token.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(WaitStatus::Cancelled);
        }
        match self.deadline {
            Some(deadline) if now >= deadline => Some(WaitStatus::TimedOut),
            _ => None,
        }
    }

    /// How long the next sleep may last; `None` means sleep until notified.
    pub(crate) fn next_slice(&self, now: Instant) -> Option<Duration> {
        let until_deadline = self
            .deadline
            .map(|deadline| deadline.saturating_duration_since(now));
        match (self.token.is_some(), until_deadline) {
            (false, None) => None,
            (false, Some(remaining)) => Some(remaining),
            (true, None) => Some(self.poll_interval),
            (true, Some(remaining)) => Some(remaining.min(self.poll_interval)),
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a guarded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The admission predicate holds and the caller still owns the lock.
    Ready,
    Cancelled,
    TimedOut,
}

impl WaitStatus {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Maps an interrupted wait into the matching [`GateError`].
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Cancelled`] or [`GateError::TimedOut`].
    pub fn into_result(self) -> GateResult<()> {
        self.into_error().map_or(Ok(()), Err)
    }

    /// The error an interrupted wait reports; `None` when it is `Ready`.
    #[must_use]
    pub fn into_error(self) -> Option<GateError> {
        match self {
            Self::Ready => None,
            Self::Cancelled => Some(GateError::Cancelled),
            Self::TimedOut => Some(GateError::TimedOut),
        }
    }
}
