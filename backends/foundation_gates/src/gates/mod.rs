//! The admission gates, one module per synchronization pattern.

mod capacity_pool;
mod category;
mod combined;
mod count_pool;
mod queue;
mod rendezvous;
mod rwlock;

pub use capacity_pool::{CapacityPermit, CapacitySnapshot, GuardedCapacityPool};
pub use category::{Category, CategoryGate, CategoryPermit, CategorySnapshot};
pub use combined::{CombinedGate, CombinedPermit, CombinedSnapshot};
pub use count_pool::{CountPermit, CountSnapshot, GuardedCountPool};
pub use queue::{BoundedQueue, QueueObserver, QueueSnapshot};
pub use rendezvous::{RendezvousConfig, RendezvousPoint, RendezvousSnapshot};
pub use rwlock::{ReadAccess, ReadersWritersLock, RwPolicy, RwSnapshot, WriteAccess};
