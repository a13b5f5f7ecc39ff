use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::error::RtwError;
use crate::lang::LocalRank;
use crate::lang::Pid;
use crate::lang::WorldRank;
use crate::node::WorldLayout;
use crate::rtw::RtwEntry;
use crate::rtw::RtwMap;
use crate::rtw::check_rank;

/// Hash table keyed by local rank.
///
/// Memory is proportional to the number of entries, which suits sparse
/// ranks and groups built one insert at a time.
#[derive(Clone, Debug, Default)]
pub struct HashedMap {
  inner: HashMap<LocalRank, RtwEntry>,
}

impl RtwMap for HashedMap {
  const STRATEGY: &'static str = "hash";

  #[inline]
  fn create() -> Self {
    Self::default()
  }

  fn create_for_world(layout: &WorldLayout) -> Self {
    let mut inner: HashMap<LocalRank, RtwEntry> =
      HashMap::with_capacity(layout.world_size() as usize);

    for (pid, block) in layout.iter() {
      for world in block.start.get()..block.end() {
        inner.insert(LocalRank::new(world), RtwEntry::new(WorldRank::new(world), pid));
      }
    }

    Self { inner }
  }

  fn insert(&mut self, local: LocalRank, world: WorldRank, pid: Pid) -> Result<(), RtwError> {
    check_rank(local)?;

    match self.inner.entry(local) {
      Entry::Occupied(_) => Err(RtwError::Duplicate(local)),
      Entry::Vacant(entry) => {
        entry.insert(RtwEntry::new(world, pid));
        Ok(())
      }
    }
  }

  #[inline]
  fn find(&self, local: LocalRank) -> Result<RtwEntry, RtwError> {
    self
      .inner
      .get(&local)
      .copied()
      .ok_or(RtwError::NotFound(local))
  }

  #[inline]
  fn len(&self) -> usize {
    self.inner.len()
  }

  fn entries(&self) -> impl Iterator<Item = (LocalRank, RtwEntry)> + '_ {
    self.inner.iter().map(|(local, entry)| (*local, *entry))
  }
}
