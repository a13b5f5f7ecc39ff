use std::cmp::Ordering;

use crate::error::RtwError;
use crate::lang::LocalRank;
use crate::lang::Pid;
use crate::lang::WorldRank;
use crate::node::WorldLayout;
use crate::rtw::LeaderPolicy;
use crate::rtw::RtwEntry;
use crate::rtw::RtwMap;
use crate::rtw::check_rank;

/// Consecutive local ranks mapping to consecutive world ranks of one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
  local: u32,
  world: u32,
  pid: Pid,
  len: u32,
}

impl Run {
  #[inline]
  const fn local_end(&self) -> u32 {
    self.local + self.len
  }

  /// Returns `true` if `(local, world, pid)` directly follows this run.
  #[inline]
  fn extends(&self, local: u32, world: u32, pid: Pid) -> bool {
    self.pid == pid
      && self.local.checked_add(self.len) == Some(local)
      && self.world.checked_add(self.len) == Some(world)
  }

  #[inline]
  fn entry(&self, offset: u32) -> RtwEntry {
    RtwEntry::new(WorldRank::new(self.world + offset), self.pid)
  }
}

/// Run-length table storing ranges of consecutive ranks.
///
/// The world table costs one run per OS process, and groups derived by
/// contiguous splits stay small regardless of their size.
#[derive(Clone, Debug, Default)]
pub struct CompressedMap {
  runs: Vec<Run>,
  count: usize,
}

impl CompressedMap {
  /// Returns the number of runs used to store the table.
  #[inline]
  pub fn runs(&self) -> usize {
    self.runs.len()
  }

  /// Returns the index of the run containing `local`, or where it would go.
  fn locate(&self, local: u32) -> Result<usize, usize> {
    self.runs.binary_search_by(|run| {
      if run.local_end() <= local {
        Ordering::Less
      } else if run.local > local {
        Ordering::Greater
      } else {
        Ordering::Equal
      }
    })
  }

  /// Joins the run at `index` with its successor when they are contiguous.
  fn merge_next(&mut self, index: usize) {
    let Some(next) = self.runs.get(index + 1).copied() else {
      return;
    };

    if self.runs[index].extends(next.local, next.world, next.pid) {
      self.runs[index].len += next.len;
      self.runs.remove(index + 1);
    }
  }
}

impl RtwMap for CompressedMap {
  const STRATEGY: &'static str = "compressed";

  #[inline]
  fn create() -> Self {
    Self::default()
  }

  fn create_for_world(layout: &WorldLayout) -> Self {
    let runs: Vec<Run> = layout
      .iter()
      .filter(|(_, block)| block.count != 0)
      .map(|(pid, block)| Run {
        local: block.start.get(),
        world: block.start.get(),
        pid,
        len: block.count,
      })
      .collect();

    Self {
      runs,
      count: layout.world_size() as usize,
    }
  }

  fn insert(&mut self, local: LocalRank, world: WorldRank, pid: Pid) -> Result<(), RtwError> {
    check_rank(local)?;

    let index: usize = match self.locate(local.get()) {
      Ok(_) => return Err(RtwError::Duplicate(local)),
      Err(index) => index,
    };

    let (local_raw, world_raw): (u32, u32) = (local.get(), world.get());

    if index > 0 && self.runs[index - 1].extends(local_raw, world_raw, pid) {
      self.runs[index - 1].len += 1;
      self.merge_next(index - 1);
    } else if self.runs.get(index).is_some_and(|next| {
      next.pid == pid
        && local_raw.checked_add(1) == Some(next.local)
        && world_raw.checked_add(1) == Some(next.world)
    }) {
      let next: &mut Run = &mut self.runs[index];
      next.local = local_raw;
      next.world = world_raw;
      next.len += 1;
    } else {
      let run: Run = Run {
        local: local_raw,
        world: world_raw,
        pid,
        len: 1,
      };

      self.runs.insert(index, run);
    }

    self.count += 1;

    Ok(())
  }

  fn find(&self, local: LocalRank) -> Result<RtwEntry, RtwError> {
    match self.locate(local.get()) {
      Ok(index) => {
        let run: &Run = &self.runs[index];
        Ok(run.entry(local.get() - run.local))
      }
      Err(_) => Err(RtwError::NotFound(local)),
    }
  }

  #[inline]
  fn len(&self) -> usize {
    self.count
  }

  fn entries(&self) -> impl Iterator<Item = (LocalRank, RtwEntry)> + '_ {
    self.runs.iter().flat_map(|run| {
      (0..run.len).map(move |offset| (LocalRank::new(run.local + offset), run.entry(offset)))
    })
  }

  fn co_located(&self, pid: Pid) -> usize {
    self
      .runs
      .iter()
      .filter(|run| run.pid == pid)
      .map(|run| run.len as usize)
      .sum()
  }

  // Within a run, the first rank is both the lowest local and the lowest
  // world rank, so only run heads need to be compared.
  fn find_leader(&self, pid: Pid, policy: LeaderPolicy) -> Result<(LocalRank, RtwEntry), RtwError> {
    let mut heads = self.runs.iter().filter(|run| run.pid == pid);

    let leader: Option<&Run> = match policy {
      LeaderPolicy::LowestLocalRank => heads.next(),
      LeaderPolicy::LowestWorldRank => heads.min_by_key(|run| (run.world, run.local)),
    };

    leader
      .map(|run| (LocalRank::new(run.local), run.entry(0)))
      .ok_or(RtwError::NoLeader(pid))
  }
}

#[cfg(test)]
mod tests {
  use crate::lang::LocalRank;
  use crate::lang::Pid;
  use crate::lang::WorldRank;
  use crate::node::WorldLayout;
  use crate::rtw::CompressedMap;
  use crate::rtw::RtwEntry;
  use crate::rtw::RtwMap;

  #[test]
  fn test_world_is_one_run_per_process() {
    let layout: WorldLayout = WorldLayout::uniform(4, 1000).unwrap();
    let map: CompressedMap = CompressedMap::create_for_world(&layout);

    assert_eq!(map.runs(), 4);
    assert_eq!(map.len(), 4000);
    assert_eq!(
      map.find(LocalRank::new(2500)),
      Ok(RtwEntry::new(WorldRank::new(2500), Pid::new(2)))
    );
  }

  #[test]
  fn test_out_of_order_inserts_coalesce() {
    let mut map: CompressedMap = CompressedMap::create();

    for local in [0, 2, 1, 4, 3] {
      map
        .insert(LocalRank::new(local), WorldRank::new(10 + local), Pid::new(1))
        .unwrap();
    }

    assert_eq!(map.runs(), 1);
    assert_eq!(map.len(), 5);

    map
      .insert(LocalRank::new(5), WorldRank::new(40), Pid::new(1))
      .unwrap();

    assert_eq!(map.runs(), 2);
    assert_eq!(
      map.find(LocalRank::new(5)),
      Ok(RtwEntry::new(WorldRank::new(40), Pid::new(1)))
    );
  }
}
