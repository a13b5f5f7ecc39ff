use hashbrown::HashMap;
use hashbrown::HashSet;
use hashbrown::hash_map::Entry;

use crate::consts;
use crate::error::fatal;
use crate::lang::EventKey;
use crate::lang::FgRank;

// -----------------------------------------------------------------------------
// @type - NotifyPolicy
// -----------------------------------------------------------------------------

/// Delivery semantics of a notification that finds no waiter.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum NotifyPolicy {
  /// The notification is dropped.
  #[default]
  Edge,
  /// The notification is remembered and consumed by the next wait on the
  /// same key, which then completes without suspending.
  Level,
}

// -----------------------------------------------------------------------------
// @type - Parked
// -----------------------------------------------------------------------------

/// Outcome of registering a wait.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Parked {
  /// A pending notification was consumed; the caller does not suspend.
  Ready,
  /// The caller is registered and must suspend.
  Waiting,
}

// -----------------------------------------------------------------------------
// @type - EventRegistry
// -----------------------------------------------------------------------------

/// Associates each waiting proclet with the key that will resume it.
///
/// A key has at most one waiter; a second registration while the first
/// is still waiting is an invariant violation.
#[derive(Debug)]
pub struct EventRegistry {
  policy: NotifyPolicy,
  waiters: HashMap<EventKey, FgRank>,
  pending: HashSet<EventKey>,
}

impl EventRegistry {
  /// Creates an empty registry.
  pub fn new(policy: NotifyPolicy) -> Self {
    Self {
      policy,
      waiters: HashMap::with_capacity(consts::CAP_EVENT_WAITERS),
      pending: HashSet::new(),
    }
  }

  #[inline]
  pub const fn policy(&self) -> NotifyPolicy {
    self.policy
  }

  /// Returns the number of registered waiters.
  #[inline]
  pub fn waiting(&self) -> usize {
    self.waiters.len()
  }

  /// Returns the proclet waiting on `key`, if any.
  #[inline]
  pub fn waiter(&self, key: EventKey) -> Option<FgRank> {
    self.waiters.get(&key).copied()
  }

  /// Registers `rank` as the waiter of `key`.
  pub fn park(&mut self, key: EventKey, rank: FgRank) -> Parked {
    if self.pending.remove(&key) {
      return Parked::Ready;
    }

    match self.waiters.entry(key) {
      Entry::Occupied(entry) => {
        fatal!("{} waits on {key}, already awaited by {}", rank, entry.get());
      }
      Entry::Vacant(entry) => {
        entry.insert(rank);
        Parked::Waiting
      }
    }
  }

  /// Removes the registration of `rank` on `key`, if it is still present.
  pub fn unpark(&mut self, key: EventKey, rank: FgRank) -> bool {
    match self.waiters.entry(key) {
      Entry::Occupied(entry) if *entry.get() == rank => {
        entry.remove();
        true
      }
      Entry::Occupied(_) | Entry::Vacant(_) => false,
    }
  }

  /// Removes and returns the waiter of `key`.
  ///
  /// With no waiter, the notification is dropped or remembered according
  /// to the [`NotifyPolicy`].
  pub fn notify(&mut self, key: EventKey) -> Option<FgRank> {
    let waiter: Option<FgRank> = self.waiters.remove(&key);

    if waiter.is_none() && self.policy == NotifyPolicy::Level {
      self.pending.insert(key);
    }

    waiter
  }
}

#[cfg(test)]
mod tests {
  use crate::lang::EventKey;
  use crate::lang::FgRank;
  use crate::lang::Reason;
  use crate::lang::WorldRank;
  use crate::sched::EventRegistry;
  use crate::sched::NotifyPolicy;
  use crate::sched::Parked;

  const KEY: EventKey = EventKey::new(WorldRank::new(2), Reason::RECV);

  #[test]
  fn test_edge_drops_unmatched() {
    let mut registry: EventRegistry = EventRegistry::new(NotifyPolicy::Edge);

    assert_eq!(registry.notify(KEY), None);
    assert_eq!(registry.park(KEY, FgRank::new(2)), Parked::Waiting);
    assert_eq!(registry.waiting(), 1);
    assert_eq!(registry.notify(KEY), Some(FgRank::new(2)));
    assert_eq!(registry.notify(KEY), None);
    assert_eq!(registry.waiting(), 0);
  }

  #[test]
  fn test_level_remembers_unmatched() {
    let mut registry: EventRegistry = EventRegistry::new(NotifyPolicy::Level);

    assert_eq!(registry.notify(KEY), None);
    assert_eq!(registry.notify(KEY), None);
    assert_eq!(registry.park(KEY, FgRank::new(2)), Parked::Ready);
    assert_eq!(registry.park(KEY, FgRank::new(2)), Parked::Waiting);
  }

  #[test]
  fn test_unpark_only_own_registration() {
    let mut registry: EventRegistry = EventRegistry::new(NotifyPolicy::Edge);

    registry.park(KEY, FgRank::new(1));

    assert!(!registry.unpark(KEY, FgRank::new(0)));
    assert!(registry.unpark(KEY, FgRank::new(1)));
    assert_eq!(registry.waiter(KEY), None);
  }
}
