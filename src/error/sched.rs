use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::error::TransportError;

/// Error returned from the scheduler driver loop.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedError {
  /// The progress hook failed between dispatches.
  Transport(TransportError),
  /// Every live proclet is waiting and the transport has nothing in flight.
  Stalled { waiting: usize },
}

impl Display for SchedError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Transport(error) => Display::fmt(error, f),
      Self::Stalled { waiting } => {
        write!(f, "scheduler stalled with {waiting} waiting proclet(s)")
      }
    }
  }
}

impl Error for SchedError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Transport(error) => Some(error),
      Self::Stalled { .. } => None,
    }
  }
}

impl From<TransportError> for SchedError {
  #[inline]
  fn from(other: TransportError) -> Self {
    Self::Transport(other)
  }
}
