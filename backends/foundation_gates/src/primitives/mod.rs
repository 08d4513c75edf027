//! Guarded-wait building blocks shared by every gate.

pub mod cancel;
pub mod condvar;
pub mod monitor;
pub mod wait;

pub use cancel::CancelToken;
pub use condvar::{CondVar, CondVarMutex, CondVarMutexGuard, WaitTimeoutResult};
pub use monitor::{Monitor, NotifyDirective, QueueId};
pub use wait::{WaitOptions, WaitStatus};
