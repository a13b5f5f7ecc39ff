use std::fmt::Debug;
use std::fmt::Formatter;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;
use triomphe::Arc;

use crate::error::RtwError;
use crate::error::fatal;
use crate::group::BarrierRole;
use crate::group::BarrierState;
use crate::group::RefCount;
use crate::lang::ContextId;
use crate::lang::LocalRank;
use crate::lang::Pid;
use crate::lang::WorldRank;
use crate::rtw::DefaultMap;
use crate::rtw::LeaderPolicy;
use crate::rtw::RtwEntry;
use crate::rtw::RtwMap;
use crate::sched::ProcletCx;

/// Structures owned collectively by the co-located members of a group.
struct Inner<M> {
  map: M,
  barrier: Arc<BarrierState>,
}

/// Reference-counted synchronization bundle of a communication group.
///
/// Shared by reference among the co-located proclets of one group. Two
/// independent counters track its lifetime:
///
/// - within-group: proclets that are members of this exact group
/// - across-group: groups derived by duplication that still depend on the
///   shared table and barrier
///
/// Both start at one. The table and barrier are reclaimed by an explicit
/// call to [`reclaim`] once both counters have reached zero; the proclet
/// that observes the second zero is responsible for it.
///
/// [`reclaim`]: GroupShared::reclaim
pub struct GroupShared<M = DefaultMap> {
  cid: ContextId,
  within: RefCount,
  across: RefCount,
  inner: RwLock<Option<Inner<M>>>,
}

impl<M> GroupShared<M>
where
  M: RtwMap,
{
  /// Creates the shared state of a newly formed group with a fresh barrier.
  pub fn new(cid: ContextId, map: M) -> Self {
    Self::with_barrier(cid, map, Arc::new(BarrierState::new()))
  }

  /// Creates the shared state of a group around an existing barrier block.
  pub fn with_barrier(cid: ContextId, map: M, barrier: Arc<BarrierState>) -> Self {
    debug!(
      target: "proclet",
      cid = cid.get(),
      strategy = M::STRATEGY,
      entries = map.len(),
      "group shared state created",
    );

    Self {
      cid,
      within: RefCount::new(),
      across: RefCount::new(),
      inner: RwLock::new(Some(Inner { map, barrier })),
    }
  }

  /// Returns the context of the group that created this state.
  #[inline]
  pub const fn cid(&self) -> ContextId {
    self.cid
  }

  // ---------------------------------------------------------------------------
  // Reference Counting
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn init_within_group_ref(&self) {
    self.within.init();
  }

  #[inline]
  pub fn init_across_group_ref(&self) {
    self.across.init();
  }

  #[inline]
  pub fn init_all_refs(&self) {
    self.init_within_group_ref();
    self.init_across_group_ref();
  }

  /// Adds a member of this group, returning the new within-group count.
  pub fn add_within_group_ref(&self) -> usize {
    let count: usize = self.within.add();
    trace!(target: "proclet", cid = self.cid.get(), within = count, "incr within-group ref");
    count
  }

  /// Adds a dependent group, returning the new across-group count.
  pub fn add_across_group_ref(&self) -> usize {
    let count: usize = self.across.add();
    trace!(target: "proclet", cid = self.cid.get(), across = count, "incr across-group ref");
    count
  }

  #[inline]
  pub fn add_all_refs(&self) -> (usize, usize) {
    (self.add_within_group_ref(), self.add_across_group_ref())
  }

  /// Removes a member of this group, returning the remaining count.
  pub fn release_within_group_ref(&self) -> usize {
    let count: usize = self.within.release();
    trace!(target: "proclet", cid = self.cid.get(), within = count, "decr within-group ref");
    count
  }

  /// Removes a dependent group, returning the remaining count.
  pub fn release_across_group_ref(&self) -> usize {
    let count: usize = self.across.release();
    trace!(target: "proclet", cid = self.cid.get(), across = count, "decr across-group ref");
    count
  }

  #[inline]
  pub fn release_all_refs(&self) -> (usize, usize) {
    (self.release_within_group_ref(), self.release_across_group_ref())
  }

  #[inline]
  pub fn within_group_refs(&self) -> usize {
    self.within.get()
  }

  #[inline]
  pub fn across_group_refs(&self) -> usize {
    self.across.get()
  }

  /// Returns `true` if both counters have reached zero.
  #[inline]
  pub fn is_unreferenced(&self) -> bool {
    self.within.get() == 0 && self.across.get() == 0
  }

  /// Returns `true` if the table and barrier have been reclaimed.
  #[inline]
  pub fn is_reclaimed(&self) -> bool {
    self.inner.read().is_none()
  }

  /// Destroys the table and releases the barrier block.
  ///
  /// Must be called exactly once, after both counters reached zero, and
  /// without yielding between the final release and this call.
  pub fn reclaim(&self) {
    if !self.is_unreferenced() {
      fatal!(
        "reclaimed referenced group state (cid = {}, within = {}, across = {})",
        self.cid.get(),
        self.within.get(),
        self.across.get(),
      );
    }

    let Some(inner) = self.inner.write().take() else {
      fatal!("group state reclaimed twice (cid = {})", self.cid.get());
    };

    inner.map.destroy();

    debug!(target: "proclet", cid = self.cid.get(), "group shared state reclaimed");
  }

  // ---------------------------------------------------------------------------
  // Rank Translation
  // ---------------------------------------------------------------------------

  fn with_inner<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&Inner<M>) -> R,
  {
    match self.inner.read().as_ref() {
      Some(inner) => f(inner),
      None => fatal!("group state used after reclaim (cid = {})", self.cid.get()),
    }
  }

  fn with_inner_mut<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&mut Inner<M>) -> R,
  {
    match self.inner.write().as_mut() {
      Some(inner) => f(inner),
      None => fatal!("group state used after reclaim (cid = {})", self.cid.get()),
    }
  }

  #[inline]
  pub fn insert(&self, local: LocalRank, world: WorldRank, pid: Pid) -> Result<(), RtwError> {
    self.with_inner_mut(|inner| inner.map.insert(local, world, pid))
  }

  pub fn block_insert<I>(&self, entries: I) -> Result<(), RtwError>
  where
    I: IntoIterator<Item = (LocalRank, RtwEntry)>,
  {
    self.with_inner_mut(|inner| inner.map.block_insert(entries))
  }

  #[inline]
  pub fn find(&self, local: LocalRank) -> Result<RtwEntry, RtwError> {
    self.with_inner(|inner| inner.map.find(local))
  }

  /// Translates `local`, resolving [`LocalRank::PROC_NULL`] without a lookup.
  pub fn translate(&self, local: LocalRank) -> Result<RtwEntry, RtwError> {
    if local == LocalRank::PROC_NULL {
      Ok(RtwEntry::PROC_NULL)
    } else {
      self.find(local)
    }
  }

  #[inline]
  pub fn find_leader(&self, pid: Pid, policy: LeaderPolicy) -> Result<(LocalRank, RtwEntry), RtwError> {
    self.with_inner(|inner| inner.map.find_leader(pid, policy))
  }

  #[inline]
  pub fn co_located(&self, pid: Pid) -> usize {
    self.with_inner(|inner| inner.map.co_located(pid))
  }

  #[inline]
  pub fn size(&self) -> usize {
    self.with_inner(|inner| inner.map.len())
  }

  /// Returns a copy of the table for a group derived from this one.
  #[inline]
  pub fn duplicate_map(&self) -> M {
    self.with_inner(|inner| inner.map.clone())
  }

  // ---------------------------------------------------------------------------
  // Barrier
  // ---------------------------------------------------------------------------

  /// Returns the barrier block of the co-located members.
  #[inline]
  pub fn barrier_state(&self) -> Arc<BarrierState> {
    self.with_inner(|inner| Arc::clone(&inner.barrier))
  }

  /// Resolves the barrier role of `local` among the members hosted by `pid`.
  pub fn barrier_role(
    &self,
    local: LocalRank,
    pid: Pid,
    policy: LeaderPolicy,
  ) -> Result<(BarrierRole, u32), RtwError> {
    self.with_inner(|inner| {
      let (leader, _): (LocalRank, RtwEntry) = inner.map.find_leader(pid, policy)?;
      let members: u32 = inner.map.co_located(pid) as u32;

      if leader == local {
        Ok((BarrierRole::Leader, members))
      } else {
        Ok((BarrierRole::Follower, members))
      }
    })
  }

  /// Synchronizes the calling proclet, with rank `local` in this group,
  /// with every other member hosted by the same OS process.
  pub async fn barrier(&self, cx: &ProcletCx, local: LocalRank) -> Result<(), RtwError> {
    let (role, members): (BarrierRole, u32) =
      self.barrier_role(local, cx.pid(), cx.node().leader_policy())?;

    let barrier: Arc<BarrierState> = self.barrier_state();

    barrier.barrier_arrive(cx, role, members).await;

    Ok(())
  }
}

impl<M> Debug for GroupShared<M> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GroupShared")
      .field("cid", &self.cid)
      .field("within", &self.within)
      .field("across", &self.across)
      .finish_non_exhaustive()
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use crate::group::BarrierRole;
  use crate::group::GroupShared;
  use crate::lang::ContextId;
  use crate::lang::LocalRank;
  use crate::lang::Pid;
  use crate::lang::WorldRank;
  use crate::node::WorldLayout;
  use crate::rtw::HashedMap;
  use crate::rtw::LeaderPolicy;
  use crate::rtw::RtwEntry;
  use crate::rtw::RtwMap;

  fn world() -> GroupShared<HashedMap> {
    let layout: WorldLayout = WorldLayout::uniform(2, 3).unwrap();
    GroupShared::new(ContextId::WORLD, HashedMap::create_for_world(&layout))
  }

  #[test]
  fn test_counters_are_independent() {
    let shared: GroupShared<HashedMap> = world();

    assert_eq!(shared.add_within_group_ref(), 2);
    assert_eq!(shared.add_within_group_ref(), 3);
    assert_eq!(shared.add_across_group_ref(), 2);

    assert_eq!(shared.release_within_group_ref(), 2);
    assert_eq!(shared.release_across_group_ref(), 1);
    assert_eq!(shared.within_group_refs(), 2);
    assert_eq!(shared.across_group_refs(), 1);
  }

  #[test]
  fn test_lockstep_release_then_reclaim() {
    let shared: GroupShared<HashedMap> = world();

    assert_eq!(shared.add_all_refs(), (2, 2));
    assert_eq!(shared.release_all_refs(), (1, 1));
    assert!(!shared.is_unreferenced());
    assert_eq!(shared.release_all_refs(), (0, 0));
    assert!(shared.is_unreferenced());
    assert!(!shared.is_reclaimed());

    shared.reclaim();

    assert!(shared.is_reclaimed());
  }

  #[test]
  fn test_translate() {
    let shared: GroupShared<HashedMap> = world();

    assert_eq!(
      shared.translate(LocalRank::new(4)),
      Ok(RtwEntry::new(WorldRank::new(4), Pid::new(1)))
    );
    assert_eq!(shared.translate(LocalRank::PROC_NULL), Ok(RtwEntry::PROC_NULL));
    assert!(shared.translate(LocalRank::new(6)).is_err());
  }

  #[test]
  fn test_barrier_roles() {
    let shared: GroupShared<HashedMap> = world();
    let policy: LeaderPolicy = LeaderPolicy::LowestLocalRank;

    assert_eq!(
      shared.barrier_role(LocalRank::new(3), Pid::new(1), policy),
      Ok((BarrierRole::Leader, 3))
    );
    assert_eq!(
      shared.barrier_role(LocalRank::new(5), Pid::new(1), policy),
      Ok((BarrierRole::Follower, 3))
    );
  }

  #[test]
  fn test_duplicate_map_shares_nothing() {
    let shared: GroupShared<HashedMap> = world();
    let mut copy: HashedMap = shared.duplicate_map();

    copy
      .insert(LocalRank::new(6), WorldRank::new(6), Pid::new(1))
      .unwrap();

    assert_eq!(shared.size(), 6);
    assert_eq!(copy.len(), 7);
  }
}
