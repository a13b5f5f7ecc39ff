use crossbeam_utils::CachePadded;
use tracing::trace;

use crate::loom::hint::spin_loop;
use crate::loom::sync::atomic::AtomicU32;
use crate::loom::sync::atomic::Ordering;
use crate::sched::ProcletCx;

// -----------------------------------------------------------------------------
// @type - BarrierRole
// -----------------------------------------------------------------------------

/// Role of a co-located member in a barrier round.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BarrierRole {
  Leader,
  Follower,
}

impl BarrierRole {
  #[inline]
  pub const fn is_leader(self) -> bool {
    matches!(self, Self::Leader)
  }
}

// -----------------------------------------------------------------------------
// @type - Arrival
// -----------------------------------------------------------------------------

/// Proof of a follower's arrival in one barrier round.
#[derive(Debug)]
#[must_use = "a follower must wait for the round to be released"]
pub struct Arrival {
  generation: u32,
}

// -----------------------------------------------------------------------------
// @type - BarrierState
// -----------------------------------------------------------------------------

/// Rendezvous block shared by the co-located members of one group.
///
/// The block may live in memory shared by several OS processes, so every
/// field is atomic:
///
/// - `coproclet_signal`: round generation, bumped by the leader to release
///   the followers of the current round
/// - `leader_signal`: set by the last member to arrive, observed by the
///   leader
/// - `counter`: number of members that have arrived in the current round
///
/// The leader resets `counter` and `leader_signal` before publishing the
/// next generation, so a released follower that immediately arrives again
/// is counted in the new round.
#[derive(Debug)]
#[repr(C)]
pub struct BarrierState {
  coproclet_signal: CachePadded<AtomicU32>,
  leader_signal: CachePadded<AtomicU32>,
  counter: CachePadded<AtomicU32>,
}

impl BarrierState {
  /// Creates a new `BarrierState` with no arrivals.
  pub fn new() -> Self {
    Self {
      coproclet_signal: CachePadded::new(AtomicU32::new(0)),
      leader_signal: CachePadded::new(AtomicU32::new(0)),
      counter: CachePadded::new(AtomicU32::new(0)),
    }
  }

  /// Returns the number of members that arrived in the current round.
  #[inline]
  pub fn arrivals(&self) -> u32 {
    self.counter.load(Ordering::Acquire)
  }

  /// Returns the number of completed rounds, modulo 2^32.
  #[inline]
  pub fn generation(&self) -> u32 {
    self.coproclet_signal.load(Ordering::Acquire)
  }

  // ---------------------------------------------------------------------------
  // Round Steps
  // ---------------------------------------------------------------------------

  /// Records the arrival of one of `members` co-located members.
  pub fn arrive(&self, members: u32) -> Arrival {
    let generation: u32 = self.coproclet_signal.load(Ordering::Acquire);
    let arrived: u32 = self.counter.fetch_add(1, Ordering::AcqRel) + 1;

    debug_assert!(arrived <= members, "barrier over-subscribed");

    if arrived == members {
      self.leader_signal.store(1, Ordering::Release);
    }

    Arrival { generation }
  }

  /// Returns `true` once the round of `arrival` has been released.
  #[inline]
  pub fn is_released(&self, arrival: &Arrival) -> bool {
    self.coproclet_signal.load(Ordering::Acquire) != arrival.generation
  }

  /// Returns `true` once every member of the current round has arrived.
  #[inline]
  pub fn is_gathered(&self) -> bool {
    self.leader_signal.load(Ordering::Acquire) != 0
  }

  /// Releases the followers of a gathered round. Leader only.
  pub fn release(&self) {
    debug_assert!(self.is_gathered(), "released before all members arrived");

    self.leader_signal.store(0, Ordering::Relaxed);
    self.counter.store(0, Ordering::Relaxed);
    self.coproclet_signal.fetch_add(1, Ordering::Release);
  }

  // ---------------------------------------------------------------------------
  // Cooperative Rendezvous
  // ---------------------------------------------------------------------------

  /// Waits, yielding to co-located proclets, until all `members` arrive.
  ///
  /// Every co-located member must call this once per round with the same
  /// `members`; a member that never arrives blocks the others forever.
  pub async fn barrier_arrive(&self, cx: &ProcletCx, role: BarrierRole, members: u32) {
    match role {
      BarrierRole::Leader => {
        self.gather(cx, members).await;
        self.release();
      }
      BarrierRole::Follower => {
        let arrival: Arrival = self.arrive(members);

        while !self.is_released(&arrival) {
          cx.yield_now().await;
        }
      }
    }

    trace!(
      target: "proclet",
      fgrank = cx.fgrank().get(),
      leader = role.is_leader(),
      "barrier passed",
    );
  }

  /// Arrives as leader and waits for the followers without releasing them.
  ///
  /// The leader may then take part in a network-level barrier before
  /// calling [`release`].
  ///
  /// [`release`]: BarrierState::release
  pub async fn gather(&self, cx: &ProcletCx, members: u32) {
    let _arrival: Arrival = self.arrive(members);

    while !self.is_gathered() {
      cx.yield_now().await;
    }
  }

  /// Same as [`barrier_arrive`] for a member with no scheduler, spinning
  /// instead of yielding.
  ///
  /// [`barrier_arrive`]: BarrierState::barrier_arrive
  pub fn arrive_blocking(&self, role: BarrierRole, members: u32) {
    let arrival: Arrival = self.arrive(members);

    match role {
      BarrierRole::Leader => {
        while !self.is_gathered() {
          spin_loop();
        }

        self.release();
      }
      BarrierRole::Follower => {
        while !self.is_released(&arrival) {
          spin_loop();
        }
      }
    }
  }
}

impl Default for BarrierState {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use crate::group::Arrival;
  use crate::group::BarrierState;

  #[test]
  fn test_round_steps() {
    let barrier: BarrierState = BarrierState::new();

    let one: Arrival = barrier.arrive(3);
    let two: Arrival = barrier.arrive(3);

    assert_eq!(barrier.arrivals(), 2);
    assert!(!barrier.is_gathered());
    assert!(!barrier.is_released(&one));

    let _leader: Arrival = barrier.arrive(3);

    assert!(barrier.is_gathered());
    assert!(!barrier.is_released(&two));

    barrier.release();

    assert!(barrier.is_released(&one));
    assert!(barrier.is_released(&two));
    assert_eq!(barrier.arrivals(), 0);
    assert_eq!(barrier.generation(), 1);
    assert!(!barrier.is_gathered());
  }

  #[test]
  fn test_reuse_across_rounds() {
    let barrier: BarrierState = BarrierState::new();

    for round in 1..=5 {
      let follower: Arrival = barrier.arrive(2);
      let _leader: Arrival = barrier.arrive(2);

      assert!(barrier.is_gathered());
      barrier.release();
      assert!(barrier.is_released(&follower));
      assert_eq!(barrier.arrivals(), 0);
      assert_eq!(barrier.generation(), round);
    }
  }

  #[test]
  fn test_blocking_threads() {
    use std::sync::Arc;
    use std::thread;

    use crate::group::BarrierRole;

    let barrier: Arc<BarrierState> = Arc::new(BarrierState::new());

    let handles: Vec<_> = (0..3)
      .map(|_| {
        let barrier: Arc<BarrierState> = Arc::clone(&barrier);
        thread::spawn(move || {
          for _ in 0..10 {
            barrier.arrive_blocking(BarrierRole::Follower, 4);
          }
        })
      })
      .collect();

    for _ in 0..10 {
      barrier.arrive_blocking(BarrierRole::Leader, 4);
    }

    for handle in handles {
      handle.join().unwrap();
    }

    assert_eq!(barrier.generation(), 10);
    assert_eq!(barrier.arrivals(), 0);
  }
}
