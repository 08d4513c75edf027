//! Weight, count and category rules folded into one admission decision.
//!
//! All three predicates are evaluated in the same critical section. Stacking
//! a category gate, a capacity pool and a count pool as separate sections
//! would let two callers each pass the first gate and then deadlock on the
//! second when release order does not mirror acquire order.

use serde::Serialize;

use super::category::{Category, Occupancy};
use crate::errors::{GateError, GateResult, InvalidRequest};
use crate::primitives::{Monitor, NotifyDirective, WaitOptions, WaitStatus};

#[derive(Debug)]
struct CombinedState {
    occupancy: Occupancy,
    occupied_weight: usize,
}

/// Point-in-time view of a [`CombinedGate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedSnapshot {
    pub capacity_weight: usize,
    pub capacity_count: usize,
    pub occupied_weight: usize,
    pub occupied_count: usize,
    /// Occupants inside, indexed by category.
    pub occupants: Vec<usize>,
    pub active: Option<Category>,
}

/// `CombinedGate` admits `(category, weight)` only when the category is
/// compatible with whoever is inside, the category is below
/// `capacity_count`, and the shared weight stays within `capacity_weight`.
///
/// Each category waits on its own queue. A `leave` always wakes the same
/// category (a heavy occupant leaving may let several lighter ones in) and,
/// when it was the last occupant, every other category as well.
///
/// ```
/// use foundation_gates::{Category, CombinedGate};
///
/// let trampoline = CombinedGate::new(300, 5, 2).unwrap();
/// let girls = Category::new(1);
///
/// for _ in 0..5 {
///     trampoline.enter(girls, 50).unwrap();
/// }
/// let snapshot = trampoline.snapshot();
/// assert_eq!(snapshot.occupied_count, 5);
/// assert_eq!(snapshot.occupied_weight, 250);
/// ```
#[derive(Debug)]
pub struct CombinedGate {
    monitor: Monitor<CombinedState>,
    capacity_weight: usize,
    capacity_count: usize,
    categories: usize,
}

impl CombinedGate {
    /// # Errors
    ///
    /// [`InvalidRequest::ZeroCapacity`] for a zero weight or count capacity,
    /// [`InvalidRequest::ZeroCategories`] for zero categories.
    pub fn new(capacity_weight: usize, capacity_count: usize, categories: usize) -> GateResult<Self> {
        if capacity_weight == 0 {
            return Err(InvalidRequest::ZeroCapacity("capacity_weight").into());
        }
        if capacity_count == 0 {
            return Err(InvalidRequest::ZeroCapacity("capacity_count").into());
        }
        if categories == 0 {
            return Err(InvalidRequest::ZeroCategories.into());
        }
        Ok(Self {
            monitor: Monitor::new(
                CombinedState {
                    occupancy: Occupancy::new(categories),
                    occupied_weight: 0,
                },
                categories,
            ),
            capacity_weight,
            capacity_count,
            categories,
        })
    }

    #[must_use]
    pub fn capacity_weight(&self) -> usize {
        self.capacity_weight
    }

    #[must_use]
    pub fn capacity_count(&self) -> usize {
        self.capacity_count
    }

    #[must_use]
    pub fn categories(&self) -> usize {
        self.categories
    }

    fn validate(&self, category: Category, weight: usize) -> GateResult<Category> {
        let category = category.validate(self.categories)?;
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
        Ok(category)
    }

    fn admissible(&self, state: &CombinedState, category: Category, weight: usize) -> bool {
        state.occupancy.compatible(category)
            && state.occupancy.of(category) < self.capacity_count
            && weight <= self.capacity_weight - state.occupied_weight
    }

    /// Blocks until all three rules admit the caller, then records it.
    ///
    /// # Errors
    ///
    /// [`GateError::InvalidRequest`] for an unknown category, a zero weight,
    /// or a weight above `capacity_weight`; reported without blocking.
    pub fn enter(&self, category: Category, weight: usize) -> GateResult<()> {
        self.enter_with(category, weight, &WaitOptions::new())
    }

    /// Like [`Self::enter`], but gives up on cancellation or deadline.
    ///
    /// # Errors
    ///
    /// Invalid requests, [`GateError::Cancelled`] or [`GateError::TimedOut`];
    /// the gate is unchanged on every error.
    pub fn enter_with(
        &self,
        category: Category,
        weight: usize,
        options: &WaitOptions,
    ) -> GateResult<()> {
        let category = self.validate(category, weight)?;

        let guard = self.monitor.lock();
        let (mut state, status) =
            self.monitor
                .wait_until(guard, category.queue(), options, |state| {
                    self.admissible(state, category, weight)
                });
        if status != WaitStatus::Ready {
            crate::warn!(
                category = category.index(),
                weight,
                ?status,
                "combined wait interrupted"
            );
            return status.into_result();
        }

        state.occupancy.admit(category);
        state.occupied_weight += weight;
        crate::debug!(
            category = category.index(),
            weight,
            occupied_weight = state.occupied_weight,
            occupied_count = state.occupancy.of(category),
            "combined admitted"
        );
        Ok(())
    }

    /// Enters only if all three rules admit the caller right now.
    ///
    /// # Errors
    ///
    /// Invalid requests or [`GateError::WouldBlock`].
    pub fn try_enter(&self, category: Category, weight: usize) -> GateResult<()> {
        let category = self.validate(category, weight)?;
        let mut state = self.monitor.lock();
        if !self.admissible(&state, category, weight) {
            return Err(GateError::WouldBlock);
        }
        state.occupancy.admit(category);
        state.occupied_weight += weight;
        Ok(())
    }

    /// Releases the caller's weight and slot, then wakes its own category and,
    /// if it was the last one inside, every other category.
    ///
    /// # Errors
    ///
    /// Invalid requests, or [`InvalidRequest::UnbalancedLeave`] when no such
    /// occupant is inside; the gate is unchanged on error.
    pub fn leave(&self, category: Category, weight: usize) -> GateResult<()> {
        let category = self.validate(category, weight)?;

        let mut state = self.monitor.lock();
        if state.occupancy.of(category) == 0 || state.occupied_weight < weight {
            return Err(InvalidRequest::UnbalancedLeave("combined occupancy").into());
        }
        state.occupied_weight -= weight;
        let remaining = state.occupancy.release(category)?;
        drop(state);

        self.monitor.notify(category.queue(), NotifyDirective::All);
        if remaining == 0 {
            for other in (0..self.categories).filter(|other| *other != category.index()) {
                self.monitor
                    .notify(Category::new(other).queue(), NotifyDirective::All);
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`Self::enter_with`].
    pub fn admit_with(
        &self,
        category: Category,
        weight: usize,
        options: &WaitOptions,
    ) -> GateResult<CombinedPermit<'_>> {
        self.enter_with(category, weight, options)?;
        Ok(CombinedPermit {
            gate: self,
            category,
            weight,
        })
    }

    /// # Errors
    ///
    /// Same as [`Self::enter`].
    pub fn admit(&self, category: Category, weight: usize) -> GateResult<CombinedPermit<'_>> {
        self.admit_with(category, weight, &WaitOptions::new())
    }

    #[must_use]
    pub fn snapshot(&self) -> CombinedSnapshot {
        self.monitor.inspect(|state| CombinedSnapshot {
            capacity_weight: self.capacity_weight,
            capacity_count: self.capacity_count,
            occupied_weight: state.occupied_weight,
            occupied_count: state.occupancy.total(),
            occupants: state.occupancy.counts(),
            active: state.occupancy.active(),
        })
    }
}

/// Occupancy held in a [`CombinedGate`]; released on drop.
#[derive(Debug)]
pub struct CombinedPermit<'a> {
    gate: &'a CombinedGate,
    category: Category,
    weight: usize,
}

impl CombinedPermit<'_> {
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn weight(&self) -> usize {
        self.weight
    }
}

impl Drop for CombinedPermit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.gate.leave(self.category, self.weight) {
            crate::error!(?err, "combined permit release failed");
        }
    }
}
