use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::lang::LocalRank;
use crate::lang::Pid;

/// Error returned from rank-translation table operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RtwError {
  /// The local rank has no entry in the table.
  NotFound(LocalRank),
  /// The local rank already has an entry in the table.
  Duplicate(LocalRank),
  /// No entry in the table is hosted by the given process.
  NoLeader(Pid),
  /// The local rank is reserved and cannot be stored.
  Reserved(LocalRank),
}

impl Display for RtwError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::NotFound(rank) => write!(f, "rank not found: {rank}"),
      Self::Duplicate(rank) => write!(f, "duplicate rank: {rank}"),
      Self::NoLeader(pid) => write!(f, "no co-located members: {pid}"),
      Self::Reserved(rank) => write!(f, "reserved rank: {rank}"),
    }
  }
}

impl Error for RtwError {}
