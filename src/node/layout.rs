use crate::error::LayoutError;
use crate::lang::Pid;
use crate::lang::WorldRank;

// -----------------------------------------------------------------------------
// @type - FgpTuple
// -----------------------------------------------------------------------------

/// Block of consecutive world ranks hosted by one OS process.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct FgpTuple {
  /// World rank of the first hosted proclet.
  pub start: WorldRank,
  /// Number of hosted proclets.
  pub count: u32,
}

impl FgpTuple {
  #[inline]
  pub const fn new(start: WorldRank, count: u32) -> Self {
    Self { start, count }
  }

  /// Returns the world rank one past the last hosted proclet.
  #[inline]
  pub const fn end(&self) -> u32 {
    self.start.get() + self.count
  }

  /// Returns `true` if `rank` is hosted by this block.
  #[inline]
  pub const fn contains(&self, rank: WorldRank) -> bool {
    rank.get() >= self.start.get() && rank.get() < self.end()
  }
}

// -----------------------------------------------------------------------------
// @type - WorldLayout
// -----------------------------------------------------------------------------

/// One-to-many mapping from OS processes to the world ranks they host.
///
/// Provided by the launch layer at start-up. Process `i` hosts the block
/// at index `i`; blocks tile `0..world_size` in process order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldLayout {
  procs: Box<[FgpTuple]>,
  size: u32,
}

impl WorldLayout {
  /// Creates a layout from per-process blocks, validating contiguity.
  pub fn new(procs: Vec<FgpTuple>) -> Result<Self, LayoutError> {
    if procs.is_empty() {
      return Err(LayoutError::Empty);
    }

    let mut next: u32 = 0;

    for (index, block) in procs.iter().enumerate() {
      if block.start.get() != next {
        return Err(LayoutError::Gap {
          pid: Pid::new(index as u32),
          expected: WorldRank::new(next),
          actual: block.start,
        });
      }

      next = match next.checked_add(block.count) {
        Some(next) if next < WorldRank::PROC_NULL.get() => next,
        _ => return Err(LayoutError::Overflow),
      };
    }

    Ok(Self {
      procs: procs.into_boxed_slice(),
      size: next,
    })
  }

  /// Creates a layout where every process hosts `per_proc` proclets.
  pub fn uniform(nprocs: u32, per_proc: u32) -> Result<Self, LayoutError> {
    let mut procs: Vec<FgpTuple> = Vec::with_capacity(nprocs as usize);
    let mut start: u32 = 0;

    for _ in 0..nprocs {
      procs.push(FgpTuple::new(WorldRank::new(start), per_proc));
      start = start.checked_add(per_proc).ok_or(LayoutError::Overflow)?;
    }

    Self::new(procs)
  }

  /// Returns the total number of proclets in the world group.
  #[inline]
  pub const fn world_size(&self) -> u32 {
    self.size
  }

  /// Returns the number of OS processes in the layout.
  #[inline]
  pub fn num_procs(&self) -> u32 {
    self.procs.len() as u32
  }

  /// Returns the block of world ranks hosted by `pid`.
  pub fn block(&self, pid: Pid) -> Result<FgpTuple, LayoutError> {
    self
      .procs
      .get(pid.index())
      .copied()
      .ok_or(LayoutError::UnknownPid(pid))
  }

  /// Returns the world rank of the first proclet hosted by `pid`.
  #[inline]
  pub fn start_of(&self, pid: Pid) -> Result<WorldRank, LayoutError> {
    self.block(pid).map(|block| block.start)
  }

  /// Returns the number of proclets hosted by `pid`.
  #[inline]
  pub fn hosted(&self, pid: Pid) -> Result<u32, LayoutError> {
    self.block(pid).map(|block| block.count)
  }

  /// Returns the OS process hosting `rank`, if the rank is in the world.
  pub fn pid_of(&self, rank: WorldRank) -> Option<Pid> {
    let index: usize = self
      .procs
      .partition_point(|block| block.end() <= rank.get());

    match self.procs.get(index) {
      Some(block) if block.contains(rank) => Some(Pid::new(index as u32)),
      Some(_) | None => None,
    }
  }

  /// Returns an iterator over every process and its block.
  pub fn iter(&self) -> impl Iterator<Item = (Pid, FgpTuple)> + '_ {
    self
      .procs
      .iter()
      .enumerate()
      .map(|(index, block)| (Pid::new(index as u32), *block))
  }
}

#[cfg(test)]
mod tests {
  use crate::error::LayoutError;
  use crate::lang::Pid;
  use crate::lang::WorldRank;
  use crate::node::FgpTuple;
  use crate::node::WorldLayout;

  #[test]
  fn test_uniform() {
    let layout: WorldLayout = WorldLayout::uniform(3, 4).unwrap();

    assert_eq!(layout.world_size(), 12);
    assert_eq!(layout.num_procs(), 3);
    assert_eq!(layout.pid_of(WorldRank::new(0)), Some(Pid::new(0)));
    assert_eq!(layout.pid_of(WorldRank::new(5)), Some(Pid::new(1)));
    assert_eq!(layout.pid_of(WorldRank::new(11)), Some(Pid::new(2)));
    assert_eq!(layout.pid_of(WorldRank::new(12)), None);
  }

  #[test]
  fn test_uneven_blocks_with_empty_process() {
    let layout: WorldLayout = WorldLayout::new(vec![
      FgpTuple::new(WorldRank::new(0), 2),
      FgpTuple::new(WorldRank::new(2), 0),
      FgpTuple::new(WorldRank::new(2), 3),
    ])
    .unwrap();

    assert_eq!(layout.world_size(), 5);
    assert_eq!(layout.hosted(Pid::new(1)), Ok(0));
    assert_eq!(layout.pid_of(WorldRank::new(2)), Some(Pid::new(2)));
    assert_eq!(layout.pid_of(WorldRank::new(1)), Some(Pid::new(0)));
  }

  #[test]
  fn test_rejects_gap() {
    let result: Result<WorldLayout, LayoutError> = WorldLayout::new(vec![
      FgpTuple::new(WorldRank::new(0), 2),
      FgpTuple::new(WorldRank::new(3), 2),
    ]);

    assert_eq!(
      result,
      Err(LayoutError::Gap {
        pid: Pid::new(1),
        expected: WorldRank::new(2),
        actual: WorldRank::new(3),
      })
    );
  }

  #[test]
  fn test_rejects_empty() {
    assert_eq!(WorldLayout::new(Vec::new()), Err(LayoutError::Empty));
    assert_eq!(
      WorldLayout::uniform(1, 1).unwrap().block(Pid::new(4)),
      Err(LayoutError::UnknownPid(Pid::new(4)))
    );
  }
}
