use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::loom::sync::atomic::AtomicUsize;
use crate::loom::sync::atomic::Ordering;
use crate::loom::sync::atomic::fence;

/// Lifetime counter of a group shared structure.
///
/// Every operation returns the post-operation value. Observing zero from
/// [`release`] is the trigger for reclamation, which the caller performs
/// separately.
///
/// Releasing past zero is a caller error and is not detected in release
/// builds.
///
/// [`release`]: RefCount::release
#[repr(transparent)]
pub struct RefCount {
  inner: AtomicUsize,
}

impl RefCount {
  /// Creates a new `RefCount` holding one reference.
  #[inline]
  pub fn new() -> Self {
    Self {
      inner: AtomicUsize::new(1),
    }
  }

  /// Resets the counter to one reference.
  #[inline]
  pub fn init(&self) {
    self.inner.store(1, Ordering::Release);
  }

  /// Adds a reference, returning the new count.
  #[inline]
  pub fn add(&self) -> usize {
    self.inner.fetch_add(1, Ordering::Relaxed) + 1
  }

  /// Releases a reference, returning the remaining count.
  #[inline]
  pub fn release(&self) -> usize {
    let prev: usize = self.inner.fetch_sub(1, Ordering::Release);

    debug_assert_ne!(prev, 0, "reference count released past zero");

    if prev == 1 {
      // Synchronize with every earlier release before the caller reclaims.
      fence(Ordering::Acquire);
    }

    prev.wrapping_sub(1)
  }

  /// Returns the current count.
  #[inline]
  pub fn get(&self) -> usize {
    self.inner.load(Ordering::Acquire)
  }
}

impl Debug for RefCount {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&self.inner, f)
  }
}

impl Default for RefCount {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use crate::group::RefCount;

  #[test]
  fn test_add_release_pairing() {
    for k in 0..8 {
      let count: RefCount = RefCount::new();

      for index in 0..k {
        assert_eq!(count.add(), index + 2);
      }

      for index in 0..k {
        assert_ne!(count.release(), 0, "release {index} observed zero early");
      }

      assert_eq!(count.release(), 0);
      assert_eq!(count.get(), 0);
    }
  }

  #[test]
  fn test_init_resets() {
    let count: RefCount = RefCount::new();

    count.add();
    count.add();
    count.init();

    assert_eq!(count.get(), 1);
    assert_eq!(count.release(), 0);
  }
}
