//! Shared synchronization state of co-located proclets.
//!
//! Proclets hosted by the same OS process share one [`GroupShared`] per
//! communication group: the group's rank-translation table, a
//! [`BarrierState`] rendezvous block, and the two [`RefCount`]s that
//! decide when both may be reclaimed.
//!
//! Within one OS process the cooperative scheduler serializes every
//! access, so a decrement followed by [`GroupShared::reclaim`] cannot
//! race as long as no yield happens in between. The barrier block may be
//! shared across OS processes and only uses atomics.

mod barrier;
mod ref_count;
mod registry;
mod shared;

pub use self::barrier::Arrival;
pub use self::barrier::BarrierRole;
pub use self::barrier::BarrierState;
pub use self::ref_count::RefCount;
pub use self::registry::CoSharedRegistry;
pub use self::registry::GroupKey;
pub use self::shared::GroupShared;
