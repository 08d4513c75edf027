//! Condition variable and mutex used by [`super::Monitor`].
//!
//! With std available we use `std::sync::{Condvar, Mutex}` directly; the
//! aliases keep gate code independent of which implementation backs them.
//!
//! ```
//! use foundation_gates::primitives::{CondVar, CondVarMutex};
//!
//! let mutex = CondVarMutex::new(true);
//! let condvar = CondVar::new();
//!
//! let mut ready = mutex.lock().unwrap();
//! while !*ready {
//!     ready = condvar.wait(ready).unwrap();
//! }
//! condvar.notify_one();
//! ```

pub use std::sync::{
    Condvar as CondVar, Mutex as CondVarMutex, MutexGuard as CondVarMutexGuard, WaitTimeoutResult,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// WHY: Notifying with no waiters must be a harmless no-op
    /// WHAT: `notify_one` and `notify_all` on a fresh condvar should not block
    #[test]
    fn test_condvar_notify_without_waiters() {
        let condvar = CondVar::new();
        condvar.notify_one();
        condvar.notify_all();
    }

    /// WHY: The monitor relies on wait releasing and reacquiring the lock
    /// WHAT: A waiter should observe the flag set by another thread
    #[test]
    fn test_condvar_wait_observes_update() {
        let pair = Arc::new((CondVarMutex::new(false), CondVar::new()));
        let pair_clone = Arc::clone(&pair);

        let setter = thread::spawn(move || {
            let (mutex, condvar) = &*pair_clone;
            *mutex.lock().unwrap() = true;
            condvar.notify_all();
        });

        let (mutex, condvar) = &*pair;
        let mut ready = mutex.lock().unwrap();
        while !*ready {
            ready = condvar.wait(ready).unwrap();
        }
        drop(ready);
        setter.join().unwrap();
    }
}
