//! Unit admission bounded by an occupant count.

use serde::Serialize;

use crate::errors::{GateError, GateResult, InvalidRequest};
use crate::primitives::{Monitor, NotifyDirective, QueueId, WaitOptions, WaitStatus};

const WAITERS: QueueId = QueueId(0);

#[derive(Debug)]
struct CountState {
    occupied_count: usize,
    waiting: usize,
}

/// Point-in-time view of a [`GuardedCountPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountSnapshot {
    pub capacity_count: usize,
    pub occupied_count: usize,
}

/// `GuardedCountPool` admits at most `capacity_count` callers at once.
///
/// All waiters want exactly one slot, so a `leave` wakes a single waiter and
/// only when the pool was full before it (otherwise nobody can be waiting
/// for that slot). A waiter admitted while more slots are free and more
/// waiters are queued passes the wake on, so two leaves landing before the
/// first woken waiter runs still admit two waiters.
///
/// ```
/// use foundation_gates::GuardedCountPool;
///
/// let pool = GuardedCountPool::new(2).unwrap();
/// pool.enter().unwrap();
/// pool.enter().unwrap();
/// assert!(pool.try_enter().unwrap_err().would_block());
/// pool.leave().unwrap();
/// assert_eq!(pool.snapshot().occupied_count, 1);
/// ```
#[derive(Debug)]
pub struct GuardedCountPool {
    monitor: Monitor<CountState>,
    capacity_count: usize,
}

impl GuardedCountPool {
    /// # Errors
    ///
    /// Returns [`InvalidRequest::ZeroCapacity`] when `capacity_count` is zero.
    pub fn new(capacity_count: usize) -> GateResult<Self> {
        if capacity_count == 0 {
            return Err(InvalidRequest::ZeroCapacity("capacity_count").into());
        }
        Ok(Self {
            monitor: Monitor::new(
                CountState {
                    occupied_count: 0,
                    waiting: 0,
                },
                1,
            ),
            capacity_count,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity_count
    }

    /// Blocks until a slot is free, then takes it.
    ///
    /// # Errors
    ///
    /// Never fails when called without wait options; kept fallible for
    /// symmetry with [`Self::enter_with`].
    pub fn enter(&self) -> GateResult<()> {
        self.enter_with(&WaitOptions::new())
    }

    /// Like [`Self::enter`], but gives up on cancellation or deadline.
    ///
    /// # Errors
    ///
    /// [`GateError::Cancelled`] or [`GateError::TimedOut`]; the pool is
    /// unchanged on error.
    pub fn enter_with(&self, options: &WaitOptions) -> GateResult<()> {
        let capacity = self.capacity_count;

        let mut guard = self.monitor.lock();
        guard.waiting += 1;
        let (mut state, status) = self
            .monitor
            .wait_until(guard, WAITERS, options, |state| {
                state.occupied_count < capacity
            });
        state.waiting -= 1;

        if status != WaitStatus::Ready {
            // A wake consumed by this caller is handed to the next waiter.
            let pass_on = state.occupied_count < capacity && state.waiting > 0;
            drop(state);
            if pass_on {
                self.monitor.notify(WAITERS, NotifyDirective::One);
            }
            crate::warn!(?status, "count wait interrupted");
            return status.into_result();
        }

        state.occupied_count += 1;
        let pass_on = state.occupied_count < capacity && state.waiting > 0;
        crate::debug!(occupied = state.occupied_count, "count admitted");
        drop(state);

        if pass_on {
            self.monitor.notify(WAITERS, NotifyDirective::One);
        }
        Ok(())
    }

    /// Takes a slot only if one is free right now.
    ///
    /// # Errors
    ///
    /// [`GateError::WouldBlock`] when the pool is full.
    pub fn try_enter(&self) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if state.occupied_count >= self.capacity_count {
            return Err(GateError::WouldBlock);
        }
        state.occupied_count += 1;
        Ok(())
    }

    /// Frees a slot, waking one waiter if the pool was full.
    ///
    /// # Errors
    ///
    /// [`InvalidRequest::UnbalancedLeave`] when nobody is inside.
    pub fn leave(&self) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if state.occupied_count == 0 {
            return Err(InvalidRequest::UnbalancedLeave("occupied_count").into());
        }
        let was_full = state.occupied_count == self.capacity_count;
        state.occupied_count -= 1;
        drop(state);

        if was_full {
            self.monitor.notify(WAITERS, NotifyDirective::One);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`Self::enter_with`].
    pub fn admit_with(&self, options: &WaitOptions) -> GateResult<CountPermit<'_>> {
        self.enter_with(options)?;
        Ok(CountPermit { pool: self })
    }

    /// # Errors
    ///
    /// Same as [`Self::enter`].
    pub fn admit(&self) -> GateResult<CountPermit<'_>> {
        self.admit_with(&WaitOptions::new())
    }

    #[must_use]
    pub fn snapshot(&self) -> CountSnapshot {
        self.monitor.inspect(|state| CountSnapshot {
            capacity_count: self.capacity_count,
            occupied_count: state.occupied_count,
        })
    }
}

/// A slot held in a [`GuardedCountPool`]; freed on drop.
#[derive(Debug)]
pub struct CountPermit<'a> {
    pool: &'a GuardedCountPool,
}

impl Drop for CountPermit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.pool.leave() {
            crate::error!(?err, "count permit release failed");
        }
    }
}
