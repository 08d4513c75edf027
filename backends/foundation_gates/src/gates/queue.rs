//! Fixed-capacity FIFO buffer between producers and consumers.

use std::collections::VecDeque;

use serde::Serialize;

use crate::errors::{BoxedError, GateError, GateResult, InvalidRequest};
use crate::primitives::{Monitor, NotifyDirective, QueueId, WaitOptions, WaitStatus};

const NOT_FULL: QueueId = QueueId(0);
const NOT_EMPTY: QueueId = QueueId(1);

/// Hook invoked under the queue's lock after each put and take.
///
/// Returning an error rolls the operation back: the item is removed again
/// (put) or restored to the front (take), and the caller receives
/// [`GateError::Observer`].
pub trait QueueObserver<T>: Send + Sync {
    /// # Errors
    ///
    /// Any error rejects the put.
    fn on_put(&self, _item: &T) -> Result<(), BoxedError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error rejects the take.
    fn on_take(&self, _item: &T) -> Result<(), BoxedError> {
        Ok(())
    }
}

/// Point-in-time view of a [`BoundedQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub capacity: usize,
    pub len: usize,
}

/// `BoundedQueue` holds at most `capacity` items in insertion order.
///
/// `put` blocks while full and `take` blocks while empty. Each side wakes one
/// waiter of the other side: a put frees exactly one item for one taker, and
/// a take frees exactly one slot for one putter.
///
/// ```
/// use foundation_gates::BoundedQueue;
///
/// let buffer = BoundedQueue::new(2).unwrap();
/// buffer.put("first").unwrap();
/// buffer.put("second").unwrap();
/// assert!(buffer.try_put("third").unwrap_err().would_block());
/// assert_eq!(buffer.take().unwrap(), "first");
/// assert_eq!(buffer.take().unwrap(), "second");
/// ```
pub struct BoundedQueue<T> {
    monitor: Monitor<VecDeque<T>>,
    capacity: usize,
    observer: Option<Box<dyn QueueObserver<T>>>,
}

impl<T> BoundedQueue<T> {
    /// # Errors
    ///
    /// Returns [`InvalidRequest::ZeroCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> GateResult<Self> {
        if capacity == 0 {
            return Err(InvalidRequest::ZeroCapacity("capacity").into());
        }
        Ok(Self {
            monitor: Monitor::new(VecDeque::with_capacity(capacity), 2),
            capacity,
            observer: None,
        })
    }

    /// Attaches an observer run on every put and take.
    #[must_use]
    pub fn with_observer(mut self, observer: impl QueueObserver<T> + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.monitor.inspect(VecDeque::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitor.inspect(VecDeque::is_empty)
    }

    /// Blocks while the queue is full, then appends `item`.
    ///
    /// # Errors
    ///
    /// [`GateError::Observer`] when the observer rejects the item.
    pub fn put(&self, item: T) -> GateResult<()> {
        self.put_with(item, &WaitOptions::new())
    }

    /// # Errors
    ///
    /// [`GateError::Cancelled`], [`GateError::TimedOut`] or
    /// [`GateError::Observer`]; the item is dropped and the queue unchanged.
    pub fn put_with(&self, item: T, options: &WaitOptions) -> GateResult<()> {
        let capacity = self.capacity;
        let guard = self.monitor.lock();
        let (mut items, status) =
            self.monitor
                .wait_until(guard, NOT_FULL, options, |items| items.len() < capacity);
        if status != WaitStatus::Ready {
            // A wake consumed by this caller is handed to the next putter.
            let pass_on = items.len() < capacity;
            drop(items);
            if pass_on {
                self.monitor.notify(NOT_FULL, NotifyDirective::One);
            }
            crate::warn!(?status, "put interrupted");
            return status.into_result();
        }

        items.push_back(item);
        if let Some(observer) = &self.observer {
            let accepted = items.back().map_or(Ok(()), |item| observer.on_put(item));
            if let Err(err) = accepted {
                items.pop_back();
                drop(items);
                // The freed slot may be the one a putter was woken for.
                self.monitor.notify(NOT_FULL, NotifyDirective::One);
                crate::error!(?err, "put rejected by observer");
                return Err(GateError::Observer(err));
            }
        }
        crate::debug!(len = items.len(), "item put");
        drop(items);

        self.monitor.notify(NOT_EMPTY, NotifyDirective::One);
        Ok(())
    }

    /// Appends `item` only if there is room right now.
    ///
    /// # Errors
    ///
    /// [`GateError::WouldBlock`] when full, or [`GateError::Observer`].
    pub fn try_put(&self, item: T) -> GateResult<()> {
        let mut items = self.monitor.lock();
        if items.len() >= self.capacity {
            return Err(GateError::WouldBlock);
        }
        items.push_back(item);
        if let Some(observer) = &self.observer {
            let accepted = items.back().map_or(Ok(()), |item| observer.on_put(item));
            if let Err(err) = accepted {
                items.pop_back();
                drop(items);
                self.monitor.notify(NOT_FULL, NotifyDirective::One);
                return Err(GateError::Observer(err));
            }
        }
        drop(items);

        self.monitor.notify(NOT_EMPTY, NotifyDirective::One);
        Ok(())
    }

    /// Blocks while the queue is empty, then removes the oldest item.
    ///
    /// # Errors
    ///
    /// [`GateError::Observer`] when the observer rejects the item.
    pub fn take(&self) -> GateResult<T> {
        self.take_with(&WaitOptions::new())
    }

    /// # Errors
    ///
    /// [`GateError::Cancelled`], [`GateError::TimedOut`] or
    /// [`GateError::Observer`]; the queue is unchanged on error.
    pub fn take_with(&self, options: &WaitOptions) -> GateResult<T> {
        let guard = self.monitor.lock();
        let (mut items, status) =
            self.monitor
                .wait_until(guard, NOT_EMPTY, options, |items| !items.is_empty());
        if let Some(err) = status.into_error() {
            let pass_on = !items.is_empty();
            drop(items);
            if pass_on {
                self.monitor.notify(NOT_EMPTY, NotifyDirective::One);
            }
            crate::warn!(?status, "take interrupted");
            return Err(err);
        }

        let Some(item) = items.pop_front() else {
            return Err(GateError::WouldBlock);
        };
        if let Some(observer) = &self.observer {
            if let Err(err) = observer.on_take(&item) {
                items.push_front(item);
                drop(items);
                // The restored item may be the one a taker was woken for.
                self.monitor.notify(NOT_EMPTY, NotifyDirective::One);
                crate::error!(?err, "take rejected by observer");
                return Err(GateError::Observer(err));
            }
        }
        crate::debug!(len = items.len(), "item taken");
        drop(items);

        self.monitor.notify(NOT_FULL, NotifyDirective::One);
        Ok(item)
    }

    /// Removes the oldest item only if one is present right now.
    ///
    /// # Errors
    ///
    /// [`GateError::WouldBlock`] when empty, or [`GateError::Observer`].
    pub fn try_take(&self) -> GateResult<T> {
        let mut items = self.monitor.lock();
        let Some(item) = items.pop_front() else {
            return Err(GateError::WouldBlock);
        };
        if let Some(observer) = &self.observer {
            if let Err(err) = observer.on_take(&item) {
                items.push_front(item);
                drop(items);
                self.monitor.notify(NOT_EMPTY, NotifyDirective::One);
                return Err(GateError::Observer(err));
            }
        }
        drop(items);

        self.monitor.notify(NOT_FULL, NotifyDirective::One);
        Ok(item)
    }

    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        self.monitor.inspect(|items| QueueSnapshot {
            capacity: self.capacity,
            len: items.len(),
        })
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug)]
    struct Rejected;

    impl std::fmt::Display for Rejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "rejected")
        }
    }

    impl std::error::Error for Rejected {}

    struct RejectOdd;

    impl QueueObserver<u32> for RejectOdd {
        fn on_put(&self, item: &u32) -> Result<(), BoxedError> {
            if item % 2 == 1 {
                return Err(Box::new(Rejected));
            }
            Ok(())
        }
    }

    struct RejectTakes;

    impl QueueObserver<u32> for RejectTakes {
        fn on_take(&self, _item: &u32) -> Result<(), BoxedError> {
            Err(Box::new(Rejected))
        }
    }

    struct RejectOddTakes;

    impl QueueObserver<u32> for RejectOddTakes {
        fn on_take(&self, item: &u32) -> Result<(), BoxedError> {
            if item % 2 == 1 {
                return Err(Box::new(Rejected));
            }
            Ok(())
        }
    }

    fn spawn_waiters<R: Send + 'static>(
        count: usize,
        work: impl Fn() -> R + Send + Sync + 'static,
    ) -> Vec<thread::JoinHandle<R>> {
        let work = Arc::new(work);
        (0..count)
            .map(|_| {
                let work = Arc::clone(&work);
                thread::spawn(move || work())
            })
            .collect()
    }

    /// WHY: Items must come out in the order they went in
    /// WHAT: A single producer's sequence is consumed unchanged
    #[test]
    fn test_fifo_order() {
        let queue = Arc::new(BoundedQueue::new(12).unwrap());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for value in 0..200_u32 {
                    queue.put(value).unwrap();
                }
            })
        };
        let received: Vec<u32> = (0..200).map(|_| queue.take().unwrap()).collect();
        producer.join().unwrap();
        assert_eq!(received, (0..200).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    /// WHY: The capacity bound is the queue's invariant
    /// WHAT: The (K + 1)th put times out and the length stays at K
    #[test]
    fn test_put_blocks_when_full() {
        let queue = BoundedQueue::new(3).unwrap();
        for value in 0..3 {
            queue.put(value).unwrap();
        }
        let options = WaitOptions::new().timeout(Duration::from_millis(20));
        assert!(queue.put_with(3, &options).unwrap_err().is_timeout());
        assert_eq!(queue.snapshot(), QueueSnapshot { capacity: 3, len: 3 });
    }

    /// WHY: A blocked producer must resume once a consumer frees a slot
    /// WHAT: Taking from a full queue admits the waiting put
    #[test]
    fn test_take_releases_blocked_put() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.put(1).unwrap();

        let put_done = Arc::new(AtomicUsize::new(0));
        let producer = {
            let queue = Arc::clone(&queue);
            let put_done = Arc::clone(&put_done);
            thread::spawn(move || {
                queue.put(2).unwrap();
                put_done.store(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert_eq!(put_done.load(Ordering::SeqCst), 0);
        assert_eq!(queue.take().unwrap(), 1);
        producer.join().unwrap();
        assert_eq!(queue.take().unwrap(), 2);
    }

    /// WHY: Taking from an empty queue must wait, not fail
    /// WHAT: `try_take` would block and a timed take times out
    #[test]
    fn test_take_on_empty() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(2).unwrap();
        assert!(queue.try_take().unwrap_err().would_block());
        let options = WaitOptions::new().timeout(Duration::from_millis(10));
        assert!(queue.take_with(&options).unwrap_err().is_timeout());
    }

    /// WHY: An observer failure must not leave the item half-inserted
    /// WHAT: Rejected puts leave the queue unchanged and accepted ones land
    #[test]
    fn test_observer_rejects_put() {
        let queue = BoundedQueue::<u32>::new(4).unwrap().with_observer(RejectOdd);
        queue.put(2).unwrap();
        let err = queue.put(3).unwrap_err();
        assert!(matches!(err, GateError::Observer(_)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take().unwrap(), 2);
    }

    /// WHY: An observer failure on take must keep the item at the front
    /// WHAT: The rejected item is still there and still first
    #[test]
    fn test_observer_rejects_take() {
        let queue = BoundedQueue::<u32>::new(4).unwrap().with_observer(RejectTakes);
        queue.put(7).unwrap();
        queue.put(8).unwrap();
        assert!(matches!(queue.take().unwrap_err(), GateError::Observer(_)));
        assert_eq!(queue.len(), 2);
        assert!(queue.try_take().is_err());
        assert_eq!(queue.len(), 2);
    }

    /// WHY: A putter woken for a slot whose item is then rejected must not strand the next putter
    /// WHAT: Both blocked odd puts reach the observer once a take frees the single slot
    #[test]
    fn test_rejected_put_hands_slot_to_next_putter() {
        let queue = Arc::new(BoundedQueue::<u32>::new(1).unwrap().with_observer(RejectOdd));
        queue.put(0).unwrap();

        let putters = {
            let queue = Arc::clone(&queue);
            spawn_waiters(2, move || {
                queue.put_with(1, &WaitOptions::new().timeout(Duration::from_secs(2)))
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.take().unwrap(), 0);

        for putter in putters {
            let err = putter.join().unwrap().unwrap_err();
            assert!(matches!(err, GateError::Observer(_)), "{err:?}");
        }
        assert!(queue.is_empty());
    }

    /// WHY: A taker woken for an item that is then restored must not strand the next taker
    /// WHAT: Both blocked takes reach the observer once a single odd item arrives
    #[test]
    fn test_rejected_take_hands_item_to_next_taker() {
        let queue = Arc::new(
            BoundedQueue::<u32>::new(2)
                .unwrap()
                .with_observer(RejectOddTakes),
        );

        let takers = {
            let queue = Arc::clone(&queue);
            spawn_waiters(2, move || {
                queue.take_with(&WaitOptions::new().timeout(Duration::from_secs(2)))
            })
        };
        thread::sleep(Duration::from_millis(50));
        queue.put(1).unwrap();

        for taker in takers {
            let err = taker.join().unwrap().unwrap_err();
            assert!(matches!(err, GateError::Observer(_)), "{err:?}");
        }
        assert_eq!(queue.len(), 1);
    }

    /// WHY: A queue that can hold nothing would deadlock every producer
    /// WHAT: Zero capacity is rejected at construction
    #[test]
    fn test_zero_capacity_rejected() {
        assert!(BoundedQueue::<u8>::new(0).unwrap_err().is_invalid());
    }
}
