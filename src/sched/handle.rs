use std::cell::RefCell;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::pin::Pin;
use std::rc::Rc;
use std::task::Context;
use std::task::Poll;

use crate::error::TransportError;
use crate::lang::EventKey;
use crate::lang::FgRank;
use crate::lang::Pid;
use crate::lang::Reason;
use crate::lang::WorldRank;
use crate::node::Node;
use crate::sched::Core;
use crate::sched::Notifier;
use crate::sched::Parked;
use crate::sched::ProcletFlags;
use crate::sched::ProcletState;
use crate::sched::Progress;

// -----------------------------------------------------------------------------
// @api - ProcletCx
// -----------------------------------------------------------------------------

/// Handle given to each proclet at spawn.
///
/// Every scheduling operation of the running proclet goes through this
/// handle. It is `!Send`: a proclet never leaves the thread of its
/// scheduler.
#[derive(Clone)]
pub struct ProcletCx {
  rank: FgRank,
  world: WorldRank,
  flags: ProcletFlags,
  core: Rc<RefCell<Core>>,
  transport: Rc<RefCell<dyn Progress>>,
  node: Rc<Node>,
}

impl ProcletCx {
  pub(crate) fn new(
    rank: FgRank,
    flags: ProcletFlags,
    core: Rc<RefCell<Core>>,
    transport: Rc<RefCell<dyn Progress>>,
    node: Rc<Node>,
  ) -> Self {
    Self {
      rank,
      world: node.world_rank(rank),
      flags,
      core,
      transport,
      node,
    }
  }

  // ---------------------------------------------------------------------------
  // Identity
  // ---------------------------------------------------------------------------

  /// Returns the fine-grain rank of the proclet within its OS process.
  #[inline]
  pub const fn fgrank(&self) -> FgRank {
    self.rank
  }

  /// Returns the rank of the proclet within the world group.
  #[inline]
  pub const fn world_rank(&self) -> WorldRank {
    self.world
  }

  /// Returns `true` if the proclet is the spawner of its OS process.
  #[inline]
  pub const fn is_spawner(&self) -> bool {
    self.flags.contains(ProcletFlags::SPAWNER)
  }

  /// Returns the OS process hosting the proclet.
  #[inline]
  pub fn pid(&self) -> Pid {
    self.node.pid()
  }

  /// Returns the start-up context of the hosting OS process.
  #[inline]
  pub fn node(&self) -> &Node {
    &self.node
  }

  /// Returns the key under which this proclet waits for `reason`.
  #[inline]
  pub const fn event_key(&self, reason: Reason) -> EventKey {
    EventKey::new(self.world, reason)
  }

  // ---------------------------------------------------------------------------
  // Scheduling
  // ---------------------------------------------------------------------------

  /// Gives up the processor; the proclet stays runnable.
  ///
  /// Other runnable proclets, and the progress driver, run before this
  /// proclet resumes.
  #[inline]
  pub fn yield_now(&self) -> YieldNow {
    YieldNow::new()
  }

  /// Suspends the proclet until `key` is notified.
  #[inline]
  pub fn yield_on_event(&self, key: EventKey) -> WaitEvent {
    WaitEvent {
      core: Rc::clone(&self.core),
      rank: self.rank,
      key,
      stage: Stage::Init,
    }
  }

  /// Makes the proclet waiting on `key` runnable.
  ///
  /// Returns `true` if a proclet was waiting. Whether a notification with
  /// no waiter is kept depends on the configured [`NotifyPolicy`].
  ///
  /// [`NotifyPolicy`]: crate::sched::NotifyPolicy
  #[inline]
  pub fn notify(&self, key: EventKey) -> bool {
    self.core.borrow_mut().notify(key)
  }

  /// Advances the transport without giving up the processor.
  pub fn progress(&self) -> Result<(), TransportError> {
    let mut transport = self.transport.borrow_mut();
    let mut core = self.core.borrow_mut();

    transport.progress(&mut Notifier::new(&mut core))
  }
}

impl Debug for ProcletCx {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("ProcletCx")
      .field("rank", &self.rank)
      .field("world", &self.world)
      .field("flags", &self.flags)
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// @type - YieldNow
// -----------------------------------------------------------------------------

/// Future returned by [`ProcletCx::yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct YieldNow {
  yielded: bool,
}

impl YieldNow {
  #[inline]
  pub(crate) const fn new() -> Self {
    Self { yielded: false }
  }
}

impl Future for YieldNow {
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, _context: &mut Context<'_>) -> Poll<Self::Output> {
    if self.yielded {
      Poll::Ready(())
    } else {
      self.yielded = true;
      Poll::Pending
    }
  }
}

// -----------------------------------------------------------------------------
// @type - WaitEvent
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
  Init,
  Parked,
  Done,
}

/// Future returned by [`ProcletCx::yield_on_event`].
///
/// Dropping it while parked withdraws the registration.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WaitEvent {
  core: Rc<RefCell<Core>>,
  rank: FgRank,
  key: EventKey,
  stage: Stage,
}

impl Future for WaitEvent {
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, _context: &mut Context<'_>) -> Poll<Self::Output> {
    match self.stage {
      Stage::Init => {
        let parked: Parked = self.core.borrow_mut().park(self.rank, self.key);

        if parked == Parked::Ready {
          self.stage = Stage::Done;
          Poll::Ready(())
        } else {
          self.stage = Stage::Parked;
          Poll::Pending
        }
      }
      Stage::Parked => {
        let state: Option<ProcletState> = self.core.borrow().state(self.rank);

        if state == Some(ProcletState::WaitingOnEvent(self.key)) {
          Poll::Pending
        } else {
          self.stage = Stage::Done;
          Poll::Ready(())
        }
      }
      Stage::Done => Poll::Ready(()),
    }
  }
}

impl Drop for WaitEvent {
  fn drop(&mut self) {
    if self.stage == Stage::Parked {
      if let Ok(mut core) = self.core.try_borrow_mut() {
        core.unpark(self.rank, self.key);
      }
    }
  }
}

impl Debug for WaitEvent {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("WaitEvent")
      .field("rank", &self.rank)
      .field("key", &self.key)
      .field("stage", &self.stage)
      .finish_non_exhaustive()
  }
}
