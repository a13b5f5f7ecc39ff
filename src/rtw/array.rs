use crate::error::RtwError;
use crate::error::fatal;
use crate::lang::LocalRank;
use crate::lang::Pid;
use crate::lang::WorldRank;
use crate::node::WorldLayout;
use crate::rtw::LeaderPolicy;
use crate::rtw::RtwEntry;
use crate::rtw::RtwMap;
use crate::rtw::check_rank;

/// Dense table indexed directly by local rank.
///
/// Lookups are `O(1)`; memory grows with the largest local rank stored,
/// so this suits groups whose ranks are small contiguous integers.
///
/// A single insert of a large sparse rank allocates a slot for every
/// smaller rank, and aborts the process if that allocation fails. Use
/// [`HashedMap`] for sparse groups.
///
/// [`HashedMap`]: crate::rtw::HashedMap
#[derive(Clone, Debug, Default)]
pub struct ArrayMap {
  slots: Vec<Option<RtwEntry>>,
  count: usize,
}

impl RtwMap for ArrayMap {
  const STRATEGY: &'static str = "array";

  #[inline]
  fn create() -> Self {
    Self::default()
  }

  fn create_for_world(layout: &WorldLayout) -> Self {
    let mut slots: Vec<Option<RtwEntry>> = Vec::with_capacity(layout.world_size() as usize);

    for (pid, block) in layout.iter() {
      for world in block.start.get()..block.end() {
        slots.push(Some(RtwEntry::new(WorldRank::new(world), pid)));
      }
    }

    Self {
      count: slots.len(),
      slots,
    }
  }

  fn insert(&mut self, local: LocalRank, world: WorldRank, pid: Pid) -> Result<(), RtwError> {
    check_rank(local)?;

    let index: usize = local.index();

    if index >= self.slots.len() {
      let grow: usize = index + 1 - self.slots.len();

      if let Err(error) = self.slots.try_reserve_exact(grow) {
        fatal!("failed to allocate {grow} rank-translation slot(s): {error}");
      }

      self.slots.resize(index + 1, None);
    }

    let slot: &mut Option<RtwEntry> = &mut self.slots[index];

    if slot.is_some() {
      return Err(RtwError::Duplicate(local));
    }

    *slot = Some(RtwEntry::new(world, pid));
    self.count += 1;

    Ok(())
  }

  #[inline]
  fn find(&self, local: LocalRank) -> Result<RtwEntry, RtwError> {
    self
      .slots
      .get(local.index())
      .copied()
      .flatten()
      .ok_or(RtwError::NotFound(local))
  }

  #[inline]
  fn len(&self) -> usize {
    self.count
  }

  fn entries(&self) -> impl Iterator<Item = (LocalRank, RtwEntry)> + '_ {
    self
      .slots
      .iter()
      .enumerate()
      .filter_map(|(index, slot)| slot.map(|entry| (LocalRank::new(index as u32), entry)))
  }

  // Entries are visited in local-rank order, so the first match is the
  // lowest local rank.
  fn find_leader(&self, pid: Pid, policy: LeaderPolicy) -> Result<(LocalRank, RtwEntry), RtwError> {
    let mut members = self.entries().filter(|(_, entry)| entry.pid == pid);

    let leader: Option<(LocalRank, RtwEntry)> = match policy {
      LeaderPolicy::LowestLocalRank => members.next(),
      LeaderPolicy::LowestWorldRank => members.min_by_key(|(local, entry)| (entry.world, *local)),
    };

    leader.ok_or(RtwError::NoLeader(pid))
  }
}

#[cfg(test)]
mod tests {
  use crate::lang::LocalRank;
  use crate::lang::Pid;
  use crate::lang::WorldRank;
  use crate::rtw::ArrayMap;
  use crate::rtw::RtwMap;

  #[test]
  fn test_sparse_insert_leaves_holes() {
    let mut map: ArrayMap = ArrayMap::create();

    map
      .insert(LocalRank::new(5), WorldRank::new(1), Pid::new(0))
      .unwrap();

    assert_eq!(map.len(), 1);
    assert!(!map.contains(LocalRank::new(0)));
    assert!(!map.contains(LocalRank::new(4)));
    assert!(map.contains(LocalRank::new(5)));
  }
}
