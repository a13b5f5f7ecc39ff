//! Start-up context of an OS process hosting proclets.
//!
//! Everything a proclet needs to know about its surroundings is fixed
//! before the first proclet is spawned: which OS process it runs in, how
//! the world is partitioned among OS processes, and the state of the
//! world group. [`Node`] bundles these and is passed to every proclet
//! through its handle instead of living in process-wide globals.

mod layout;

pub use self::layout::FgpTuple;
pub use self::layout::WorldLayout;

use tracing::debug;
use triomphe::Arc;

use crate::error::LayoutError;
use crate::error::RtwError;
use crate::group::CoSharedRegistry;
use crate::group::GroupKey;
use crate::group::GroupShared;
use crate::init::RuntimeConfig;
use crate::lang::ContextId;
use crate::lang::FgRank;
use crate::lang::LocalRank;
use crate::lang::Pid;
use crate::lang::WorldRank;
use crate::rtw::DefaultMap;
use crate::rtw::LeaderPolicy;
use crate::rtw::RtwEntry;
use crate::rtw::RtwMap;

/// Start-up context of one OS process.
pub struct Node {
  pid: Pid,
  block: FgpTuple,
  layout: WorldLayout,
  leader_policy: LeaderPolicy,
  world: Arc<GroupShared>,
  groups: CoSharedRegistry,
}

impl Node {
  /// Creates the context of `pid` within `layout`.
  ///
  /// Builds the translation table and shared state of the world group and
  /// registers them under [`ContextId::WORLD`].
  pub fn new(pid: Pid, layout: WorldLayout, leader_policy: LeaderPolicy) -> Result<Self, LayoutError> {
    let block: FgpTuple = layout.block(pid)?;
    let world: Arc<GroupShared> = Arc::new(GroupShared::new(
      ContextId::WORLD,
      DefaultMap::create_for_world(&layout),
    ));

    let this: Self = Self {
      pid,
      block,
      layout,
      leader_policy,
      world,
      groups: CoSharedRegistry::new(),
    };

    if let Ok(key) = this.group_key(ContextId::WORLD, &this.world) {
      // The registry is empty, so registration cannot collide.
      let _ignore: Result<(), _> = this.groups.register(key, Arc::clone(&this.world));
    }

    debug!(
      target: "proclet",
      pid = pid.get(),
      start = block.start.get(),
      hosted = block.count,
      world = this.layout.world_size(),
      strategy = DefaultMap::STRATEGY,
      "node initialized",
    );

    Ok(this)
  }

  /// Creates the context of `pid` within `layout`, electing leaders with
  /// the policy of `config`.
  #[inline]
  pub fn with_config(pid: Pid, layout: WorldLayout, config: &RuntimeConfig) -> Result<Self, LayoutError> {
    Self::new(pid, layout, config.leader_policy)
  }

  /// Creates the context of a single OS process hosting `count` proclets.
  #[inline]
  pub fn local(count: u32) -> Result<Self, LayoutError> {
    Self::local_with(count, &RuntimeConfig::new())
  }

  /// Same as [`Node::local`], with the leader policy of `config`.
  pub fn local_with(count: u32, config: &RuntimeConfig) -> Result<Self, LayoutError> {
    Self::with_config(Pid::new(0), WorldLayout::uniform(1, count)?, config)
  }

  /// Returns the identity of this OS process.
  #[inline]
  pub const fn pid(&self) -> Pid {
    self.pid
  }

  /// Returns the partition of the world among OS processes.
  #[inline]
  pub const fn layout(&self) -> &WorldLayout {
    &self.layout
  }

  /// Returns the number of proclets hosted by this OS process.
  #[inline]
  pub const fn hosted(&self) -> u32 {
    self.block.count
  }

  #[inline]
  pub const fn world_size(&self) -> u32 {
    self.layout.world_size()
  }

  /// Returns the world rank of the local proclet `rank`.
  #[inline]
  pub const fn world_rank(&self, rank: FgRank) -> WorldRank {
    WorldRank::new(self.block.start.get() + rank.get())
  }

  /// Returns the policy electing the barrier leader of a co-located set.
  #[inline]
  pub const fn leader_policy(&self) -> LeaderPolicy {
    self.leader_policy
  }

  /// Returns the shared state of the world group.
  #[inline]
  pub fn world(&self) -> &Arc<GroupShared> {
    &self.world
  }

  /// Returns the table of group state shared by co-located proclets.
  #[inline]
  pub fn groups(&self) -> &CoSharedRegistry {
    &self.groups
  }

  /// Returns the key identifying the members of `shared` hosted by this
  /// OS process.
  pub fn group_key(&self, cid: ContextId, shared: &GroupShared) -> Result<GroupKey, RtwError> {
    let (_, leader): (LocalRank, RtwEntry) = shared.find_leader(self.pid, self.leader_policy)?;

    Ok(GroupKey::new(cid, leader.world))
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use crate::group::GroupKey;
  use crate::init::RuntimeConfig;
  use crate::lang::ContextId;
  use crate::lang::FgRank;
  use crate::lang::LocalRank;
  use crate::lang::Pid;
  use crate::lang::WorldRank;
  use crate::node::Node;
  use crate::node::WorldLayout;
  use crate::rtw::LeaderPolicy;

  #[test]
  fn test_world_ranks_follow_block() {
    let layout: WorldLayout = WorldLayout::uniform(2, 4).unwrap();
    let node: Node = Node::new(Pid::new(1), layout, LeaderPolicy::default()).unwrap();

    assert_eq!(node.hosted(), 4);
    assert_eq!(node.world_size(), 8);
    assert_eq!(node.world_rank(FgRank::new(0)), WorldRank::new(4));
    assert_eq!(node.world_rank(FgRank::new(3)), WorldRank::new(7));
  }

  #[test]
  fn test_world_group_registered() {
    let layout: WorldLayout = WorldLayout::uniform(2, 4).unwrap();
    let node: Node = Node::new(Pid::new(1), layout, LeaderPolicy::default()).unwrap();
    let key: GroupKey = GroupKey::new(ContextId::WORLD, WorldRank::new(4));

    assert_eq!(node.groups().len(), 1);
    assert!(node.groups().lookup(key).is_some());
    assert_eq!(node.world().find(LocalRank::new(5)).unwrap().pid, Pid::new(1));
  }

  #[test]
  fn test_leader_policy_from_config() {
    let mut config: RuntimeConfig = RuntimeConfig::new();
    config.leader_policy = LeaderPolicy::LowestWorldRank;

    let node: Node = Node::local_with(2, &config).unwrap();

    assert_eq!(node.leader_policy(), LeaderPolicy::LowestWorldRank);
    assert_eq!(Node::local(2).unwrap().leader_policy(), LeaderPolicy::LowestLocalRank);
  }

  #[test]
  fn test_unknown_pid() {
    let layout: WorldLayout = WorldLayout::uniform(1, 4).unwrap();

    assert!(Node::new(Pid::new(3), layout, LeaderPolicy::default()).is_err());
  }
}
