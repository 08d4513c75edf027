//! Weighted admission bounded by a total capacity.

use serde::Serialize;

use crate::errors::{GateError, GateResult, InvalidRequest};
use crate::primitives::{Monitor, NotifyDirective, QueueId, WaitOptions, WaitStatus};

const WAITERS: QueueId = QueueId(0);

#[derive(Debug)]
struct CapacityState {
    occupied_weight: usize,
    occupants: usize,
}

/// Point-in-time view of a [`GuardedCapacityPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacitySnapshot {
    pub capacity_weight: usize,
    pub occupied_weight: usize,
    /// Callers currently admitted.
    pub occupants: usize,
}

/// `GuardedCapacityPool` admits callers by weight while the sum of admitted
/// weights stays within `capacity_weight`.
///
/// Every `leave` broadcasts: the freed weight may admit a lighter waiter even
/// while a heavier one still does not fit, and waking a single waiter could
/// pick the heavy one and leave the light one asleep.
///
/// ```
/// use foundation_gates::GuardedCapacityPool;
///
/// let trampoline = GuardedCapacityPool::new(300).unwrap();
/// trampoline.enter(120).unwrap();
/// trampoline.enter(150).unwrap();
/// assert!(trampoline.try_enter(40).unwrap_err().would_block());
///
/// trampoline.leave(120).unwrap();
/// trampoline.enter(40).unwrap();
/// assert_eq!(trampoline.snapshot().occupied_weight, 190);
/// ```
#[derive(Debug)]
pub struct GuardedCapacityPool {
    monitor: Monitor<CapacityState>,
    capacity_weight: usize,
}

impl GuardedCapacityPool {
    /// # Errors
    ///
    /// Returns [`InvalidRequest::ZeroCapacity`] when `capacity_weight` is zero.
    pub fn new(capacity_weight: usize) -> GateResult<Self> {
        if capacity_weight == 0 {
            return Err(InvalidRequest::ZeroCapacity("capacity_weight").into());
        }
        Ok(Self {
            monitor: Monitor::new(
                CapacityState {
                    occupied_weight: 0,
                    occupants: 0,
                },
                1,
            ),
            capacity_weight,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity_weight
    }

    fn validate(&self, weight: usize) -> GateResult<()> {
        if weight == 0 {
            return Err(InvalidRequest::ZeroWeight.into());
        }
        if weight > self.capacity_weight {
            return Err(InvalidRequest::WeightExceedsCapacity {
                weight,
                capacity: self.capacity_weight,
            }
            .into());
        }
        Ok(())
    }

    fn fits(&self, state: &CapacityState, weight: usize) -> bool {
        weight <= self.capacity_weight - state.occupied_weight
    }

    /// Blocks until `weight` fits, then adds it.
    ///
    /// # Errors
    ///
    /// [`InvalidRequest::ZeroWeight`] or
    /// [`InvalidRequest::WeightExceedsCapacity`], reported without blocking.
    pub fn enter(&self, weight: usize) -> GateResult<()> {
        self.enter_with(weight, &WaitOptions::new())
    }

    /// Like [`Self::enter`], but gives up on cancellation or deadline.
    ///
    /// # Errors
    ///
    /// Invalid weights, [`GateError::Cancelled`] or [`GateError::TimedOut`];
    /// the pool is unchanged on every error.
    pub fn enter_with(&self, weight: usize, options: &WaitOptions) -> GateResult<()> {
        self.validate(weight)?;

        let guard = self.monitor.lock();
        let (mut state, status) =
            self.monitor
                .wait_until(guard, WAITERS, options, |state| self.fits(state, weight));
        if status != WaitStatus::Ready {
            crate::warn!(weight, ?status, "capacity wait interrupted");
            return status.into_result();
        }

        state.occupied_weight += weight;
        state.occupants += 1;
        crate::debug!(
            weight,
            occupied = state.occupied_weight,
            "capacity admitted"
        );
        Ok(())
    }

    /// Adds `weight` only if it fits right now.
    ///
    /// # Errors
    ///
    /// Invalid weights or [`GateError::WouldBlock`].
    pub fn try_enter(&self, weight: usize) -> GateResult<()> {
        self.validate(weight)?;
        let mut state = self.monitor.lock();
        if !self.fits(&state, weight) {
            return Err(GateError::WouldBlock);
        }
        state.occupied_weight += weight;
        state.occupants += 1;
        Ok(())
    }

    /// Subtracts `weight` and wakes every waiter to re-check its fit.
    ///
    /// # Errors
    ///
    /// Invalid weights, or [`InvalidRequest::UnbalancedLeave`] when `weight`
    /// was never admitted; the pool is unchanged on error.
    pub fn leave(&self, weight: usize) -> GateResult<()> {
        self.validate(weight)?;

        let mut state = self.monitor.lock();
        if state.occupants == 0 || state.occupied_weight < weight {
            return Err(InvalidRequest::UnbalancedLeave("occupied_weight").into());
        }
        state.occupied_weight -= weight;
        state.occupants -= 1;
        drop(state);

        self.monitor.notify(WAITERS, NotifyDirective::All);
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`Self::enter_with`].
    pub fn admit_with(&self, weight: usize, options: &WaitOptions) -> GateResult<CapacityPermit<'_>> {
        self.enter_with(weight, options)?;
        Ok(CapacityPermit { pool: self, weight })
    }

    /// # Errors
    ///
    /// Same as [`Self::enter`].
    pub fn admit(&self, weight: usize) -> GateResult<CapacityPermit<'_>> {
        self.admit_with(weight, &WaitOptions::new())
    }

    #[must_use]
    pub fn snapshot(&self) -> CapacitySnapshot {
        self.monitor.inspect(|state| CapacitySnapshot {
            capacity_weight: self.capacity_weight,
            occupied_weight: state.occupied_weight,
            occupants: state.occupants,
        })
    }
}

/// Weight held in a [`GuardedCapacityPool`]; released on drop.
#[derive(Debug)]
pub struct CapacityPermit<'a> {
    pool: &'a GuardedCapacityPool,
    weight: usize,
}

impl CapacityPermit<'_> {
    #[must_use]
    pub fn weight(&self) -> usize {
        self.weight
    }
}

impl Drop for CapacityPermit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.pool.leave(self.weight) {
            crate::error!(?err, "capacity permit release failed");
        }
    }
}
