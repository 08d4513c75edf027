//! Bounded-resource admission gates built on a single guarded-wait primitive.
//!
//! Every gate in this crate is a monitor: one mutex guarding the gate's
//! counters plus one or more wait queues. Callers block while their admission
//! predicate is false, the predicate is re-checked after every wake, and each
//! gate decides between a broadcast wake and a signal-one wake depending on
//! whether its waiters have heterogeneous or interchangeable requirements.
//!
//! - [`GuardedCapacityPool`]: weighted admission bounded by a total weight.
//! - [`GuardedCountPool`]: unit admission bounded by an occupant count.
//! - [`CategoryGate`]: occupants of only one category inside at a time.
//! - [`CombinedGate`]: all three rules decided in one critical section.
//! - [`ReadersWritersLock`]: shared readers or one exclusive writer.
//! - [`BoundedQueue`]: fixed-capacity FIFO with blocking `put`/`take`.
//! - [`RendezvousPoint`]: strict one-to-one server/client handshake.
//!
//! # Examples
//!
//! ```
//! use foundation_gates::{Category, CombinedGate};
//!
//! let gate = CombinedGate::new(300, 5, 2).unwrap();
//! let boys = Category::new(0);
//!
//! gate.enter(boys, 60).unwrap();
//! assert_eq!(gate.snapshot().occupied_weight, 60);
//! gate.leave(boys, 60).unwrap();
//! ```
//!
//! # Features
//!
//! - `standard` (default): info, warning and error logs through `tracing`.
//! - `debug_trace`: adds debug level admission logs.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod macros;

pub mod config;
pub mod errors;
pub mod gates;
pub mod primitives;

pub use config::{ConfigError, ConfigResult, GatesConfig};
pub use errors::{BoxedError, GateError, GateResult, InvalidRequest};
pub use gates::{
    BoundedQueue, CapacityPermit, CapacitySnapshot, Category, CategoryGate, CategoryPermit,
    CategorySnapshot, CombinedGate, CombinedPermit, CombinedSnapshot, CountPermit,
    CountSnapshot, GuardedCapacityPool, GuardedCountPool, QueueObserver, QueueSnapshot,
    ReadAccess, ReadersWritersLock, RendezvousConfig, RendezvousPoint, RendezvousSnapshot,
    RwPolicy, RwSnapshot, WriteAccess,
};
pub use primitives::{CancelToken, WaitOptions, WaitStatus};
