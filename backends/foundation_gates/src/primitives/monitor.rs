//! The guarded-wait primitive every gate is built on.
//!
//! A [`Monitor`] is one mutex over the gate's state plus a fixed set of wait
//! queues. A caller holding the lock waits on one queue until a predicate
//! over the state becomes true; the lock is released while sleeping and the
//! predicate is re-checked after every wake, so spurious or stale wake-ups
//! never admit anyone.
//!
//! ```
//! use foundation_gates::primitives::{Monitor, NotifyDirective, QueueId};
//! use foundation_gates::WaitOptions;
//!
//! const SLOTS: QueueId = QueueId(0);
//!
//! let monitor = Monitor::new(2usize, 1);
//! let guard = monitor.lock();
//! let (mut free, status) = monitor.wait_until(guard, SLOTS, &WaitOptions::new(), |free| *free > 0);
//! assert!(status.is_ready());
//! *free -= 1;
//! drop(free);
//! monitor.notify(SLOTS, NotifyDirective::One);
//! ```

use core::fmt;
use std::time::Instant;

use super::condvar::{CondVar, CondVarMutex, CondVarMutexGuard};
use super::wait::{WaitOptions, WaitStatus};

/// Index of one wait queue inside a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueId(pub usize);

/// Whether a wake reaches one waiter or all of them.
///
/// Broadcast when the freed resource may satisfy waiters with different
/// requirements; signal one when every waiter on the queue is
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDirective {
    One,
    All,
}

pub struct Monitor<S> {
    state: CondVarMutex<S>,
    queues: Box<[CondVar]>,
}

impl<S> Monitor<S> {
    /// Creates a monitor over `state` with `queues` wait queues (at least one).
    pub fn new(state: S, queues: usize) -> Self {
        Self {
            state: CondVarMutex::new(state),
            queues: (0..queues.max(1)).map(|_| CondVar::new()).collect(),
        }
    }

    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Enters the critical section.
    ///
    /// A poisoned lock is recovered: gates only mutate their counters in
    /// short sections that cannot panic halfway, so the state behind a
    /// poisoned lock is still consistent.
    pub fn lock(&self) -> CondVarMutexGuard<'_, S> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Blocks on `queue` until `ready` holds for the guarded state, the
    /// caller's token is cancelled, or its deadline passes.
    ///
    /// `ready` is evaluated before any interruption is considered, so a
    /// caller whose predicate already holds is always admitted. On
    /// `Cancelled`/`TimedOut` the guard is handed back untouched for the
    /// gate to undo whatever waiting bookkeeping it did.
    ///
    /// # Panics
    ///
    /// Panics if `queue` is not one of this monitor's queues.
    pub fn wait_until<'a, F>(
        &'a self,
        mut guard: CondVarMutexGuard<'a, S>,
        queue: QueueId,
        options: &WaitOptions,
        mut ready: F,
    ) -> (CondVarMutexGuard<'a, S>, WaitStatus)
    where
        F: FnMut(&S) -> bool,
    {
        let condvar = &self.queues[queue.0];
        loop {
            if ready(&*guard) {
                return (guard, WaitStatus::Ready);
            }

            let now = Instant::now();
            if let Some(status) = options.interruption(now) {
                return (guard, status);
            }

            guard = match options.next_slice(now) {
                None => match condvar.wait(guard) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                },
                Some(slice) => match condvar.wait_timeout(guard, slice) {
                    Ok((guard, _)) => guard,
                    Err(poisoned) => poisoned.into_inner().0,
                },
            };
        }
    }

    /// Wakes one or all waiters of `queue`.
    ///
    /// # Panics
    ///
    /// Panics if `queue` is not one of this monitor's queues.
    pub fn notify(&self, queue: QueueId, directive: NotifyDirective) {
        let condvar = &self.queues[queue.0];
        match directive {
            NotifyDirective::One => condvar.notify_one(),
            NotifyDirective::All => condvar.notify_all(),
        }
    }

    /// Reads the state under the lock without waiting on any predicate.
    pub fn inspect<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        let guard = self.lock();
        read(&*guard)
    }
}

impl<S: fmt::Debug> fmt::Debug for Monitor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state)
            .field("queues", &self.queues.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::CancelToken;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    const Q: QueueId = QueueId(0);

    /// WHY: A satisfied predicate must never block
    /// WHAT: `wait_until` returns `Ready` immediately when the predicate holds
    #[test]
    fn test_ready_predicate_returns_immediately() {
        let monitor = Monitor::new(1u32, 1);
        let guard = monitor.lock();
        let (guard, status) = monitor.wait_until(guard, Q, &WaitOptions::new(), |v| *v == 1);
        assert_eq!(status, WaitStatus::Ready);
        assert_eq!(*guard, 1);
    }

    /// WHY: Zero queues would make every wait panic
    /// WHAT: The monitor always owns at least one queue
    #[test]
    fn test_at_least_one_queue() {
        let monitor = Monitor::new((), 0);
        assert_eq!(monitor.queue_count(), 1);
    }

    /// WHY: Stale wakes must not bypass the predicate
    /// WHAT: A notify without a state change leaves the waiter blocked until the state changes
    #[test]
    fn test_wake_without_state_change_rechecks() {
        let monitor = Arc::new(Monitor::new(false, 1));
        let monitor_clone = Arc::clone(&monitor);

        let waiter = thread::spawn(move || {
            let guard = monitor_clone.lock();
            let (guard, status) =
                monitor_clone.wait_until(guard, Q, &WaitOptions::new(), |ready| *ready);
            (*guard, status)
        });

        thread::sleep(Duration::from_millis(20));
        monitor.notify(Q, NotifyDirective::All);
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        *monitor.lock() = true;
        monitor.notify(Q, NotifyDirective::All);

        let (value, status) = waiter.join().unwrap();
        assert!(value);
        assert_eq!(status, WaitStatus::Ready);
    }

    /// WHY: Bounded waits must return control to the caller
    /// WHAT: An unsatisfiable wait with a short timeout reports `TimedOut`
    #[test]
    fn test_wait_times_out() {
        let monitor = Monitor::new(0u8, 1);
        let guard = monitor.lock();
        let options = WaitOptions::new().timeout(Duration::from_millis(10));
        let (_guard, status) = monitor.wait_until(guard, Q, &options, |v| *v > 0);
        assert_eq!(status, WaitStatus::TimedOut);
    }

    /// WHY: A cancelled caller must stop waiting without any notify
    /// WHAT: Cancelling the token from another thread ends the wait with `Cancelled`
    #[test]
    fn test_wait_cancelled_by_token() {
        let monitor = Arc::new(Monitor::new(0u8, 1));
        let token = CancelToken::new();

        let monitor_clone = Arc::clone(&monitor);
        let options = WaitOptions::new()
            .cancel_token(token.clone())
            .poll_interval(Duration::from_millis(1));
        let waiter = thread::spawn(move || {
            let guard = monitor_clone.lock();
            let (_guard, status) = monitor_clone.wait_until(guard, Q, &options, |v| *v > 0);
            status
        });

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert_eq!(waiter.join().unwrap(), WaitStatus::Cancelled);
    }
}
