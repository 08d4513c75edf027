//! Mutual exclusion between categories of occupants.
//!
//! Any number of occupants of one category may be inside together, but two
//! categories are never inside at the same time. The trampoline separates two
//! categories; the museum generalises the same rule to three visiting groups.

use serde::Serialize;

use crate::errors::{GateError, GateResult, InvalidRequest};
use crate::primitives::{Monitor, NotifyDirective, QueueId, WaitOptions, WaitStatus};

/// A label from a gate's closed set of categories, addressed by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Category(usize);

impl Category {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    pub(crate) const fn queue(self) -> QueueId {
        QueueId(self.0)
    }

    /// Rejects indices outside `0..categories`.
    pub(crate) fn validate(self, categories: usize) -> GateResult<Self> {
        if self.0 < categories {
            Ok(self)
        } else {
            Err(InvalidRequest::UnknownCategory {
                category: self.0,
                categories,
            }
            .into())
        }
    }
}

impl From<usize> for Category {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Per-category occupancy shared by [`CategoryGate`] and the combined gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occupancy {
    occupants: Vec<usize>,
}

impl Occupancy {
    pub(crate) fn new(categories: usize) -> Self {
        Self {
            occupants: vec![0; categories],
        }
    }

    pub(crate) fn of(&self, category: Category) -> usize {
        self.occupants[category.index()]
    }

    /// True when no other category has anyone inside.
    pub(crate) fn compatible(&self, category: Category) -> bool {
        self.occupants
            .iter()
            .enumerate()
            .all(|(index, count)| index == category.index() || *count == 0)
    }

    pub(crate) fn active(&self) -> Option<Category> {
        self.occupants
            .iter()
            .position(|count| *count > 0)
            .map(Category::new)
    }

    pub(crate) fn total(&self) -> usize {
        self.occupants.iter().sum()
    }

    pub(crate) fn admit(&mut self, category: Category) {
        self.occupants[category.index()] += 1;
    }

    /// Removes one occupant; returns the category's remaining count.
    pub(crate) fn release(&mut self, category: Category) -> GateResult<usize> {
        let count = &mut self.occupants[category.index()];
        if *count == 0 {
            return Err(InvalidRequest::UnbalancedLeave("category occupants").into());
        }
        *count -= 1;
        Ok(*count)
    }

    pub(crate) fn counts(&self) -> Vec<usize> {
        self.occupants.clone()
    }
}

/// Point-in-time view of a [`CategoryGate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySnapshot {
    /// Occupants inside, indexed by category.
    pub occupants: Vec<usize>,
    /// The category currently inside, if any.
    pub active: Option<Category>,
}

/// `CategoryGate` blocks a caller while anyone of a different category is
/// inside.
///
/// When the last occupant of a category leaves, every waiter of every other
/// category is woken: clearing the gate may admit many of them at once. No
/// category has priority, so a continuously replenished category can keep
/// the others waiting.
///
/// ```
/// use foundation_gates::{Category, CategoryGate};
///
/// let museum = CategoryGate::new(3).unwrap();
/// let english = Category::new(0);
///
/// museum.enter(english).unwrap();
/// museum.enter(english).unwrap();
/// assert!(museum.try_enter(Category::new(1)).unwrap_err().would_block());
///
/// museum.leave(english).unwrap();
/// museum.leave(english).unwrap();
/// museum.enter(Category::new(1)).unwrap();
/// ```
#[derive(Debug)]
pub struct CategoryGate {
    monitor: Monitor<Occupancy>,
    categories: usize,
}

impl CategoryGate {
    /// Creates a gate over `categories` labels, one wait queue each.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest::ZeroCategories`] when `categories` is zero.
    pub fn new(categories: usize) -> GateResult<Self> {
        if categories == 0 {
            return Err(InvalidRequest::ZeroCategories.into());
        }
        Ok(Self {
            monitor: Monitor::new(Occupancy::new(categories), categories),
            categories,
        })
    }

    #[must_use]
    pub fn categories(&self) -> usize {
        self.categories
    }

    /// Blocks until no other category is inside, then enters.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidRequest`] for an unknown category.
    pub fn enter(&self, category: Category) -> GateResult<()> {
        self.enter_with(category, &WaitOptions::new())
    }

    /// Like [`Self::enter`], but gives up on cancellation or deadline.
    ///
    /// # Errors
    ///
    /// [`GateError::InvalidRequest`], [`GateError::Cancelled`] or
    /// [`GateError::TimedOut`]; the gate is unchanged on every error.
    pub fn enter_with(&self, category: Category, options: &WaitOptions) -> GateResult<()> {
        let category = category.validate(self.categories)?;

        let guard = self.monitor.lock();
        let (mut state, status) =
            self.monitor
                .wait_until(guard, category.queue(), options, |state| {
                    state.compatible(category)
                });
        if status != WaitStatus::Ready {
            crate::warn!(category = category.index(), ?status, "category wait interrupted");
            return status.into_result();
        }

        state.admit(category);
        crate::debug!(
            category = category.index(),
            occupants = state.of(category),
            "category admitted"
        );
        Ok(())
    }

    /// Enters only if no other category is inside right now.
    ///
    /// # Errors
    ///
    /// [`GateError::WouldBlock`] when another category is inside.
    pub fn try_enter(&self, category: Category) -> GateResult<()> {
        let category = category.validate(self.categories)?;
        let mut state = self.monitor.lock();
        if !state.compatible(category) {
            return Err(GateError::WouldBlock);
        }
        state.admit(category);
        Ok(())
    }

    /// Leaves; the last occupant of a category wakes all other categories.
    ///
    /// # Errors
    ///
    /// [`InvalidRequest::UnknownCategory`] or
    /// [`InvalidRequest::UnbalancedLeave`] when nobody of `category` is inside.
    pub fn leave(&self, category: Category) -> GateResult<()> {
        let category = category.validate(self.categories)?;

        let mut state = self.monitor.lock();
        let remaining = state.release(category)?;
        drop(state);

        if remaining == 0 {
            crate::debug!(category = category.index(), "category emptied");
            for other in (0..self.categories).filter(|other| *other != category.index()) {
                self.monitor
                    .notify(Category::new(other).queue(), NotifyDirective::All);
            }
        }
        Ok(())
    }

    /// Enters and returns a permit that leaves on drop.
    ///
    /// # Errors
    ///
    /// Same as [`Self::enter_with`].
    pub fn admit_with(
        &self,
        category: Category,
        options: &WaitOptions,
    ) -> GateResult<CategoryPermit<'_>> {
        self.enter_with(category, options)?;
        Ok(CategoryPermit {
            gate: self,
            category,
        })
    }

    /// # Errors
    ///
    /// Same as [`Self::enter`].
    pub fn admit(&self, category: Category) -> GateResult<CategoryPermit<'_>> {
        self.admit_with(category, &WaitOptions::new())
    }

    #[must_use]
    pub fn snapshot(&self) -> CategorySnapshot {
        self.monitor.inspect(|state| CategorySnapshot {
            occupants: state.counts(),
            active: state.active(),
        })
    }
}

/// Occupancy held in a [`CategoryGate`]; leaves when dropped.
#[derive(Debug)]
pub struct CategoryPermit<'a> {
    gate: &'a CategoryGate,
    category: Category,
}

impl CategoryPermit<'_> {
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }
}

impl Drop for CategoryPermit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.gate.leave(self.category) {
            crate::error!(?err, "category permit release failed");
        }
    }
}
