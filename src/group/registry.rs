use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use parking_lot::Mutex;
use tracing::debug;
use triomphe::Arc;

use crate::consts;
use crate::group::GroupShared;
use crate::lang::ContextId;
use crate::lang::WorldRank;
use crate::rtw::DefaultMap;
use crate::rtw::RtwMap;

// -----------------------------------------------------------------------------
// @type - GroupKey
// -----------------------------------------------------------------------------

/// Identity of the state shared by the co-located members of a group.
///
/// Two groups never alias one barrier block: the context id differs
/// between groups, and the leader's world rank differs between the
/// co-located subsets of one group hosted by different OS processes.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GroupKey {
  pub cid: ContextId,
  pub leader: WorldRank,
}

impl GroupKey {
  #[inline]
  pub const fn new(cid: ContextId, leader: WorldRank) -> Self {
    Self { cid, leader }
  }
}

// -----------------------------------------------------------------------------
// @type - CoSharedRegistry
// -----------------------------------------------------------------------------

/// Lookup table from [`GroupKey`] to the shared state of a group.
///
/// The first co-located member to form a group creates its state; every
/// later member attaches to the same instance. A derived group registers
/// under its own key but resolves to the state of its source.
pub struct CoSharedRegistry<M = DefaultMap> {
  groups: Mutex<HashMap<GroupKey, Registered<M>>>,
}

/// Shared state registered under one key, with the co-located members
/// that joined through that key.
struct Registered<M> {
  shared: Arc<GroupShared<M>>,
  members: usize,
}

impl<M> CoSharedRegistry<M>
where
  M: RtwMap,
{
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self {
      groups: Mutex::new(HashMap::with_capacity(consts::CAP_GROUP_REGISTRY)),
    }
  }

  /// Returns the number of registered keys.
  #[inline]
  pub fn len(&self) -> usize {
    self.groups.lock().len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the shared state registered under `key`.
  #[inline]
  pub fn lookup(&self, key: GroupKey) -> Option<Arc<GroupShared<M>>> {
    self.groups.lock().get(&key).map(|entry| Arc::clone(&entry.shared))
  }

  /// Returns the number of members that joined through `key`.
  #[inline]
  pub fn members(&self, key: GroupKey) -> usize {
    self.groups.lock().get(&key).map_or(0, |entry| entry.members)
  }

  /// Registers state that was built outside the registry.
  ///
  /// The state counts as one member of `key`. Returns the state already
  /// registered under `key`, if any, and leaves it in place.
  pub fn register(&self, key: GroupKey, shared: Arc<GroupShared<M>>) -> Result<(), Arc<GroupShared<M>>> {
    match self.groups.lock().entry(key) {
      Entry::Occupied(entry) => Err(Arc::clone(&entry.get().shared)),
      Entry::Vacant(entry) => {
        entry.insert(Registered { shared, members: 1 });
        Ok(())
      }
    }
  }

  /// Joins the calling proclet to the group identified by `key`.
  ///
  /// The first member builds the table with `build`; later members add a
  /// within-group reference to the existing state.
  pub fn attach<F>(&self, key: GroupKey, build: F) -> Arc<GroupShared<M>>
  where
    F: FnOnce() -> M,
  {
    match self.groups.lock().entry(key) {
      Entry::Occupied(mut entry) => {
        let entry: &mut Registered<M> = entry.get_mut();

        entry.shared.add_within_group_ref();
        entry.members += 1;

        Arc::clone(&entry.shared)
      }
      Entry::Vacant(entry) => {
        let shared: Arc<GroupShared<M>> = Arc::new(GroupShared::new(key.cid, build()));

        entry.insert(Registered {
          shared: Arc::clone(&shared),
          members: 1,
        });

        shared
      }
    }
  }

  /// Joins the calling proclet to the group `key` derived from `source`,
  /// sharing its state.
  ///
  /// The derived group holds one across-group reference for as long as
  /// any of its co-located members remains.
  pub fn derive(&self, source: &Arc<GroupShared<M>>, key: GroupKey) -> Arc<GroupShared<M>> {
    match self.groups.lock().entry(key) {
      Entry::Occupied(mut entry) => {
        let entry: &mut Registered<M> = entry.get_mut();

        entry.members += 1;

        Arc::clone(&entry.shared)
      }
      Entry::Vacant(entry) => {
        source.add_across_group_ref();

        entry.insert(Registered {
          shared: Arc::clone(source),
          members: 1,
        });

        debug!(
          target: "proclet",
          source = source.cid().get(),
          derived = key.cid.get(),
          "group state shared with derived group",
        );

        Arc::clone(source)
      }
    }
  }

  /// Removes the calling proclet from the group identified by `key`.
  ///
  /// For the group that created the state, this releases a within-group
  /// reference, and the group's own across-group reference once its last
  /// member leaves. For a derived group, the last member to leave
  /// unregisters the key and releases its across-group reference. State
  /// whose counters both reach zero is unregistered and reclaimed.
  /// Returns `true` if it was.
  pub fn detach(&self, key: GroupKey) -> bool {
    let mut groups = self.groups.lock();

    let Some(entry) = groups.get_mut(&key) else {
      return false;
    };

    entry.members -= 1;

    let shared: Arc<GroupShared<M>> = Arc::clone(&entry.shared);
    let last: bool = entry.members == 0;

    if last {
      groups.remove(&key);
    }

    if shared.cid() == key.cid {
      if shared.release_within_group_ref() == 0 {
        shared.release_across_group_ref();
      }
    } else if last {
      shared.release_across_group_ref();
    }

    if !shared.is_unreferenced() {
      return false;
    }

    groups.retain(|_, entry| !Arc::ptr_eq(&entry.shared, &shared));
    drop(groups);

    shared.reclaim();

    true
  }
}

impl<M> Default for CoSharedRegistry<M>
where
  M: RtwMap,
{
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use triomphe::Arc;

  use crate::group::CoSharedRegistry;
  use crate::group::GroupKey;
  use crate::group::GroupShared;
  use crate::lang::ContextId;
  use crate::lang::LocalRank;
  use crate::lang::WorldRank;
  use crate::node::WorldLayout;
  use crate::rtw::ArrayMap;
  use crate::rtw::RtwMap;

  fn build() -> ArrayMap {
    ArrayMap::create_for_world(&WorldLayout::uniform(1, 3).unwrap())
  }

  #[test]
  fn test_attach_shares_one_instance() {
    let registry: CoSharedRegistry<ArrayMap> = CoSharedRegistry::new();
    let key: GroupKey = GroupKey::new(ContextId::new(4), WorldRank::new(0));

    let a: Arc<GroupShared<ArrayMap>> = registry.attach(key, build);
    let b: Arc<GroupShared<ArrayMap>> = registry.attach(key, || unreachable!());
    let c: Arc<GroupShared<ArrayMap>> = registry.attach(key, || unreachable!());

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(a.within_group_refs(), 3);
    assert_eq!(a.across_group_refs(), 1);

    assert!(!registry.detach(key));
    assert!(!registry.detach(key));
    assert!(registry.detach(key));
    assert!(a.is_reclaimed());
    assert!(registry.is_empty());
  }

  #[test]
  fn test_derived_group_keeps_state_alive() {
    let registry: CoSharedRegistry<ArrayMap> = CoSharedRegistry::new();
    let source: GroupKey = GroupKey::new(ContextId::new(4), WorldRank::new(0));
    let dup: GroupKey = GroupKey::new(ContextId::new(8), WorldRank::new(0));

    let shared: Arc<GroupShared<ArrayMap>> = registry.attach(source, build);
    let derived: Arc<GroupShared<ArrayMap>> = registry.derive(&shared, dup);

    assert!(Arc::ptr_eq(&shared, &derived));
    assert_eq!(shared.across_group_refs(), 2);

    assert!(!registry.detach(source));
    assert!(!shared.is_reclaimed());
    assert_eq!(shared.within_group_refs(), 0);
    assert_eq!(shared.across_group_refs(), 1);
    assert!(registry.lookup(dup).is_some());

    assert!(registry.detach(dup));
    assert!(shared.is_reclaimed());
    assert!(registry.is_empty());
  }

  #[test]
  fn test_derived_group_outlives_all_but_last_member() {
    let registry: CoSharedRegistry<ArrayMap> = CoSharedRegistry::new();
    let source: GroupKey = GroupKey::new(ContextId::new(4), WorldRank::new(0));
    let dup: GroupKey = GroupKey::new(ContextId::new(8), WorldRank::new(0));

    let a: Arc<GroupShared<ArrayMap>> = registry.attach(source, build);
    let b: Arc<GroupShared<ArrayMap>> = registry.attach(source, || unreachable!());

    let da: Arc<GroupShared<ArrayMap>> = registry.derive(&a, dup);
    let db: Arc<GroupShared<ArrayMap>> = registry.derive(&b, dup);

    assert_eq!(registry.members(dup), 2);
    assert_eq!(a.across_group_refs(), 2);

    assert!(!registry.detach(source));
    assert!(!registry.detach(source));
    assert!(registry.lookup(source).is_none());

    // One member leaves the derived group; the other still uses the state.
    assert!(!registry.detach(dup));
    assert!(!da.is_reclaimed());
    assert_eq!(registry.members(dup), 1);
    assert_eq!(db.find(LocalRank::new(1)).unwrap().world, WorldRank::new(1));

    assert!(registry.detach(dup));
    assert!(db.is_reclaimed());
    assert!(registry.is_empty());
  }

  #[test]
  fn test_detach_unknown_key() {
    let registry: CoSharedRegistry<ArrayMap> = CoSharedRegistry::new();
    assert!(!registry.detach(GroupKey::new(ContextId::new(1), WorldRank::new(0))));
  }
}
