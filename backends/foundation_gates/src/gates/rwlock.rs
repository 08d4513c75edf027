//! Shared/exclusive access arbitration between readers and writers.

use serde::{Deserialize, Serialize};

use crate::errors::{GateError, GateResult, InvalidRequest};
use crate::primitives::{Monitor, NotifyDirective, QueueId, WaitOptions, WaitStatus};

const READERS: QueueId = QueueId(0);
const WRITERS: QueueId = QueueId(1);

/// Who wins when readers and writers compete.
///
/// - `ReaderPreference`: readers enter whenever no writer is active. Under a
///   continuous read load a waiting writer can starve.
/// - `WriterPreference`: new readers also wait while any writer is waiting,
///   so writers cannot starve; a continuous write load can starve readers
///   instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RwPolicy {
    #[default]
    ReaderPreference,
    WriterPreference,
}

#[derive(Debug, Default)]
struct RwState {
    readers: usize,
    writer_active: bool,
    waiting_readers: usize,
    waiting_writers: usize,
}

/// Point-in-time view of a [`ReadersWritersLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RwSnapshot {
    pub readers: usize,
    pub writer_active: bool,
    pub waiting_readers: usize,
    pub waiting_writers: usize,
}

/// `ReadersWritersLock` lets any number of readers in together, or exactly
/// one writer alone.
///
/// The last reader out wakes one writer (writers are interchangeable and
/// only one can enter). A writer leaving wakes one writer and every reader,
/// since all pending readers may proceed together.
///
/// ```
/// use foundation_gates::{ReadersWritersLock, RwPolicy};
///
/// let database = ReadersWritersLock::new(RwPolicy::ReaderPreference);
/// {
///     let _first = database.read().unwrap();
///     let _second = database.read().unwrap();
///     assert_eq!(database.snapshot().readers, 2);
///     assert!(database.try_begin_write().unwrap_err().would_block());
/// }
/// let _writer = database.write().unwrap();
/// assert!(database.snapshot().writer_active);
/// ```
#[derive(Debug)]
pub struct ReadersWritersLock {
    monitor: Monitor<RwState>,
    policy: RwPolicy,
}

impl ReadersWritersLock {
    #[must_use]
    pub fn new(policy: RwPolicy) -> Self {
        Self {
            monitor: Monitor::new(RwState::default(), 2),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> RwPolicy {
        self.policy
    }

    fn can_read(&self, state: &RwState) -> bool {
        !state.writer_active
            && (self.policy == RwPolicy::ReaderPreference || state.waiting_writers == 0)
    }

    fn can_write(state: &RwState) -> bool {
        !state.writer_active && state.readers == 0
    }

    /// Blocks while a writer is active (and, under writer preference, while
    /// one is waiting), then registers a reader.
    ///
    /// # Errors
    ///
    /// Never fails without wait options.
    pub fn begin_read(&self) -> GateResult<()> {
        self.begin_read_with(&WaitOptions::new())
    }

    /// # Errors
    ///
    /// [`GateError::Cancelled`] or [`GateError::TimedOut`]; counters are
    /// unchanged on error.
    pub fn begin_read_with(&self, options: &WaitOptions) -> GateResult<()> {
        let mut guard = self.monitor.lock();
        guard.waiting_readers += 1;
        let (mut state, status) =
            self.monitor
                .wait_until(guard, READERS, options, |state| self.can_read(state));
        state.waiting_readers -= 1;

        if status != WaitStatus::Ready {
            crate::warn!(?status, "reader wait interrupted");
            return status.into_result();
        }

        state.readers += 1;
        crate::debug!(readers = state.readers, "reader admitted");
        Ok(())
    }

    /// # Errors
    ///
    /// [`GateError::WouldBlock`] when a reader could not enter right now.
    pub fn try_begin_read(&self) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if !self.can_read(&state) {
            return Err(GateError::WouldBlock);
        }
        state.readers += 1;
        Ok(())
    }

    /// Unregisters a reader; the last one out wakes a waiting writer.
    ///
    /// # Errors
    ///
    /// [`InvalidRequest::UnbalancedLeave`] when no reader is active.
    pub fn end_read(&self) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if state.readers == 0 {
            return Err(InvalidRequest::UnbalancedLeave("readers").into());
        }
        state.readers -= 1;
        let last = state.readers == 0;
        drop(state);

        if last {
            self.monitor.notify(WRITERS, NotifyDirective::One);
        }
        Ok(())
    }

    /// Blocks while a writer or any reader is active, then becomes the writer.
    ///
    /// # Errors
    ///
    /// Never fails without wait options.
    pub fn begin_write(&self) -> GateResult<()> {
        self.begin_write_with(&WaitOptions::new())
    }

    /// # Errors
    ///
    /// [`GateError::Cancelled`] or [`GateError::TimedOut`]; counters are
    /// unchanged on error.
    pub fn begin_write_with(&self, options: &WaitOptions) -> GateResult<()> {
        let mut guard = self.monitor.lock();
        guard.waiting_writers += 1;
        let (mut state, status) = self
            .monitor
            .wait_until(guard, WRITERS, options, Self::can_write);
        state.waiting_writers -= 1;

        if status != WaitStatus::Ready {
            // Readers held back for this writer may proceed once no writer waits.
            let release_readers = self.policy == RwPolicy::WriterPreference
                && state.waiting_writers == 0
                && !state.writer_active;
            let pass_on = state.waiting_writers > 0 && Self::can_write(&state);
            drop(state);
            if pass_on {
                self.monitor.notify(WRITERS, NotifyDirective::One);
            }
            if release_readers {
                self.monitor.notify(READERS, NotifyDirective::All);
            }
            crate::warn!(?status, "writer wait interrupted");
            return status.into_result();
        }

        state.writer_active = true;
        crate::debug!("writer admitted");
        Ok(())
    }

    /// # Errors
    ///
    /// [`GateError::WouldBlock`] when the writer could not enter right now.
    pub fn try_begin_write(&self) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if !Self::can_write(&state) {
            return Err(GateError::WouldBlock);
        }
        state.writer_active = true;
        Ok(())
    }

    /// Clears the writer and wakes one writer plus every reader.
    ///
    /// # Errors
    ///
    /// [`InvalidRequest::UnbalancedLeave`] when no writer is active.
    pub fn end_write(&self) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if !state.writer_active {
            return Err(InvalidRequest::UnbalancedLeave("writer_active").into());
        }
        state.writer_active = false;
        drop(state);

        self.monitor.notify(WRITERS, NotifyDirective::One);
        self.monitor.notify(READERS, NotifyDirective::All);
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`Self::begin_read_with`].
    pub fn read_with(&self, options: &WaitOptions) -> GateResult<ReadAccess<'_>> {
        self.begin_read_with(options)?;
        Ok(ReadAccess { lock: self })
    }

    /// # Errors
    ///
    /// Same as [`Self::begin_read`].
    pub fn read(&self) -> GateResult<ReadAccess<'_>> {
        self.read_with(&WaitOptions::new())
    }

    /// # Errors
    ///
    /// Same as [`Self::begin_write_with`].
    pub fn write_with(&self, options: &WaitOptions) -> GateResult<WriteAccess<'_>> {
        self.begin_write_with(options)?;
        Ok(WriteAccess { lock: self })
    }

    /// # Errors
    ///
    /// Same as [`Self::begin_write`].
    pub fn write(&self) -> GateResult<WriteAccess<'_>> {
        self.write_with(&WaitOptions::new())
    }

    #[must_use]
    pub fn snapshot(&self) -> RwSnapshot {
        self.monitor.inspect(|state| RwSnapshot {
            readers: state.readers,
            writer_active: state.writer_active,
            waiting_readers: state.waiting_readers,
            waiting_writers: state.waiting_writers,
        })
    }
}

impl Default for ReadersWritersLock {
    fn default() -> Self {
        Self::new(RwPolicy::default())
    }
}

/// Shared access to a [`ReadersWritersLock`]; ends the read on drop.
#[derive(Debug)]
pub struct ReadAccess<'a> {
    lock: &'a ReadersWritersLock,
}

impl Drop for ReadAccess<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.end_read() {
            crate::error!(?err, "read access release failed");
        }
    }
}

/// Exclusive access to a [`ReadersWritersLock`]; ends the write on drop.
#[derive(Debug)]
pub struct WriteAccess<'a> {
    lock: &'a ReadersWritersLock,
}

impl Drop for WriteAccess<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.end_write() {
            crate::error!(?err, "write access release failed");
        }
    }
}
