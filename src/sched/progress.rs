use crate::error::TransportError;
use crate::lang::EventKey;
use crate::sched::Core;

/// Transport hook advanced by the scheduler between dispatches.
///
/// Implementations move outstanding sends, receives and one-sided
/// operations forward and report completions through the [`Notifier`].
/// This is the only source of externally triggered notifications.
pub trait Progress {
  /// Advances outstanding operations.
  fn progress(&mut self, notifier: &mut Notifier<'_>) -> Result<(), TransportError>;

  /// Returns `true` if no operation is in flight, so that further calls
  /// to [`progress`] cannot raise a notification.
  ///
  /// [`progress`]: Progress::progress
  fn is_quiescent(&self) -> bool {
    false
  }
}

/// Handle used by a [`Progress`] hook to resume waiting proclets.
pub struct Notifier<'a> {
  core: &'a mut Core,
  raised: usize,
}

impl<'a> Notifier<'a> {
  #[inline]
  pub(crate) fn new(core: &'a mut Core) -> Self {
    Self { core, raised: 0 }
  }

  /// Makes the proclet waiting on `key` runnable.
  ///
  /// Returns `true` if a proclet was waiting.
  pub fn notify(&mut self, key: EventKey) -> bool {
    self.raised += 1;
    self.core.notify(key)
  }

  /// Returns the number of notifications raised through this handle.
  #[inline]
  pub fn raised(&self) -> usize {
    self.raised
  }
}

/// Progress hook with no transport behind it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Idle;

impl Progress for Idle {
  #[inline]
  fn progress(&mut self, _notifier: &mut Notifier<'_>) -> Result<(), TransportError> {
    Ok(())
  }

  #[inline]
  fn is_quiescent(&self) -> bool {
    true
  }
}
