//! Rank-translation tables.
//!
//! Every communication group owns a table mapping a group-local rank to
//! the global (world) rank of the member and the OS process hosting it.
//! Tables are replicated in every OS process that hosts a member of the
//! group and must agree by construction: the same inserts applied in the
//! same order produce the same answers, whatever the storage strategy.
//!
//! # Strategies
//!
//! - [`ArrayMap`]: dense vector indexed by local rank
//! - [`HashedMap`]: hash table, for sparse or incrementally built groups
//! - [`CompressedMap`]: runs of consecutive ranks hosted by one process
//!
//! The strategy used by the runtime is chosen at build time through the
//! `map-array`, `map-hash` and `map-compressed` cargo features and is
//! exposed as [`DefaultMap`].

mod array;
mod compressed;
mod hashed;

use std::fmt::Debug;

use hashbrown::HashSet;
use tracing::trace;

use crate::error::RtwError;
use crate::lang::LocalRank;
use crate::lang::Pid;
use crate::lang::WorldRank;
use crate::node::WorldLayout;

pub use self::array::ArrayMap;
pub use self::compressed::CompressedMap;
pub use self::hashed::HashedMap;

#[cfg(feature = "map-compressed")]
pub type DefaultMap = CompressedMap;

#[cfg(all(feature = "map-hash", not(feature = "map-compressed")))]
pub type DefaultMap = HashedMap;

#[cfg(not(any(feature = "map-hash", feature = "map-compressed")))]
pub type DefaultMap = ArrayMap;

// -----------------------------------------------------------------------------
// @type - RtwEntry
// -----------------------------------------------------------------------------

/// Translation of one local rank.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct RtwEntry {
  pub world: WorldRank,
  pub pid: Pid,
}

impl RtwEntry {
  /// Translation of [`LocalRank::PROC_NULL`].
  pub const PROC_NULL: Self = Self::new(WorldRank::PROC_NULL, Pid::PROC_NULL);

  #[inline]
  pub const fn new(world: WorldRank, pid: Pid) -> Self {
    Self { world, pid }
  }
}

// -----------------------------------------------------------------------------
// @type - LeaderPolicy
// -----------------------------------------------------------------------------

/// Rule selecting the leader among the co-located members of a group.
///
/// Every replica of a table must be queried with the same policy.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum LeaderPolicy {
  /// The co-located member with the lowest local rank.
  #[default]
  LowestLocalRank,
  /// The co-located member with the lowest world rank.
  LowestWorldRank,
}

impl LeaderPolicy {
  fn select<I>(self, members: I) -> Option<(LocalRank, RtwEntry)>
  where
    I: Iterator<Item = (LocalRank, RtwEntry)>,
  {
    match self {
      Self::LowestLocalRank => members.min_by_key(|(local, _)| *local),
      Self::LowestWorldRank => members.min_by_key(|(local, entry)| (entry.world, *local)),
    }
  }
}

// -----------------------------------------------------------------------------
// @type - RtwMap
// -----------------------------------------------------------------------------

/// Storage-independent contract of a rank-translation table.
///
/// Dropping a table releases its storage; [`RtwMap::destroy`] makes the
/// release explicit and, taking `self`, cannot be repeated.
pub trait RtwMap: Clone + Debug + Send + Sync + 'static {
  /// Short name of the storage strategy.
  const STRATEGY: &'static str;

  /// Creates an empty table for a newly formed group.
  fn create() -> Self;

  /// Creates the table of the initial world group.
  ///
  /// Every world rank maps to itself and the process hosting it.
  fn create_for_world(layout: &WorldLayout) -> Self;

  /// Adds the translation of `local`.
  fn insert(&mut self, local: LocalRank, world: WorldRank, pid: Pid) -> Result<(), RtwError>;

  /// Returns the translation of `local`.
  fn find(&self, local: LocalRank) -> Result<RtwEntry, RtwError>;

  /// Returns the number of entries in the table.
  fn len(&self) -> usize;

  /// Returns an iterator over every entry, in no particular order.
  fn entries(&self) -> impl Iterator<Item = (LocalRank, RtwEntry)> + '_;

  /// Returns `true` if the table has no entries.
  #[inline]
  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns `true` if `local` has an entry.
  #[inline]
  fn contains(&self, local: LocalRank) -> bool {
    self.find(local).is_ok()
  }

  /// Adds many translations at once.
  ///
  /// Either every entry is inserted or, on a duplicate, none is.
  fn block_insert<I>(&mut self, entries: I) -> Result<(), RtwError>
  where
    I: IntoIterator<Item = (LocalRank, RtwEntry)>,
  {
    let entries: Vec<(LocalRank, RtwEntry)> = entries.into_iter().collect();
    let mut seen: HashSet<LocalRank> = HashSet::with_capacity(entries.len());

    for (local, _) in entries.iter() {
      check_rank(*local)?;

      if self.contains(*local) || !seen.insert(*local) {
        return Err(RtwError::Duplicate(*local));
      }
    }

    for (local, entry) in entries {
      self.insert(local, entry.world, entry.pid)?;
    }

    Ok(())
  }

  /// Returns the number of entries hosted by `pid`.
  fn co_located(&self, pid: Pid) -> usize {
    self.entries().filter(|(_, entry)| entry.pid == pid).count()
  }

  /// Returns the leader of the members hosted by `pid`.
  fn find_leader(&self, pid: Pid, policy: LeaderPolicy) -> Result<(LocalRank, RtwEntry), RtwError> {
    let members = self.entries().filter(|(_, entry)| entry.pid == pid);

    policy.select(members).ok_or(RtwError::NoLeader(pid))
  }

  /// Releases the table.
  fn destroy(self) {
    trace!(
      target: "proclet",
      strategy = Self::STRATEGY,
      entries = self.len(),
      "rtw map destroyed",
    );
  }
}

/// Rejects ranks that can never be stored.
#[inline]
pub(crate) fn check_rank(local: LocalRank) -> Result<(), RtwError> {
  if local == LocalRank::PROC_NULL {
    Err(RtwError::Reserved(local))
  } else {
    Ok(())
  }
}
