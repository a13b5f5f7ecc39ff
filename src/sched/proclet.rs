use bitflags::bitflags;

use crate::lang::EventKey;

bitflags! {
  /// Static properties of a proclet, fixed at spawn.
  #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
  pub struct ProcletFlags: u8 {
    /// The proclet is the distinguished spawner of its OS process.
    const SPAWNER = 1 << 0;
  }
}

/// Scheduling state of a proclet.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ProcletState {
  /// Ready to run; queued for dispatch.
  Runnable,
  /// Currently executing.
  Running,
  /// Suspended until the given key is notified.
  WaitingOnEvent(EventKey),
  /// Completed; its execution context has been discarded.
  Finished,
}

impl ProcletState {
  #[inline]
  pub const fn is_finished(&self) -> bool {
    matches!(self, Self::Finished)
  }

  #[inline]
  pub const fn is_waiting(&self) -> bool {
    matches!(self, Self::WaitingOnEvent(_))
  }
}
