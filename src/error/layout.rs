use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::lang::Pid;
use crate::lang::WorldRank;

/// Error returned when a world layout does not tile the world ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayoutError {
  /// The layout describes no OS processes.
  Empty,
  /// A process block does not start where the previous one ended.
  Gap { pid: Pid, expected: WorldRank, actual: WorldRank },
  /// The layout has more world ranks than can be addressed.
  Overflow,
  /// The process is not part of the layout.
  UnknownPid(Pid),
}

impl Display for LayoutError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Empty => f.write_str("empty world layout"),
      Self::Gap {
        pid,
        expected,
        actual,
      } => write!(f, "{pid} starts at {actual}, expected {expected}"),
      Self::Overflow => f.write_str("too many world ranks"),
      Self::UnknownPid(pid) => write!(f, "unknown process: {pid}"),
    }
  }
}

impl Error for LayoutError {}
