use std::collections::VecDeque;

use tracing::trace;

use crate::consts;
use crate::error::fatal;
use crate::lang::EventKey;
use crate::lang::FgRank;
use crate::sched::EventRegistry;
use crate::sched::NotifyPolicy;
use crate::sched::Parked;
use crate::sched::ProcletFlags;
use crate::sched::ProcletState;

/// Scheduling state shared by the driver loop and the proclet handles.
///
/// Borrowed only for the duration of a single bookkeeping step, never
/// across a resume, so a running proclet may freely call back into it.
#[derive(Debug)]
pub(crate) struct Core {
  states: Vec<ProcletState>,
  flags: Vec<ProcletFlags>,
  ready: VecDeque<FgRank>,
  events: EventRegistry,
  current: Option<FgRank>,
  finished: usize,
}

impl Core {
  pub(crate) fn new(policy: NotifyPolicy) -> Self {
    Self {
      states: Vec::new(),
      flags: Vec::new(),
      ready: VecDeque::with_capacity(consts::CAP_READY_QUEUE),
      events: EventRegistry::new(policy),
      current: None,
      finished: 0,
    }
  }

  // ---------------------------------------------------------------------------
  // Roster
  // ---------------------------------------------------------------------------

  pub(crate) fn reserve(&mut self, count: usize) {
    let result = self
      .states
      .try_reserve(count)
      .and_then(|()| self.flags.try_reserve(count))
      .and_then(|()| self.ready.try_reserve(count));

    if let Err(error) = result {
      fatal!("failed to allocate {count} proclet(s): {error}");
    }
  }

  /// Adds a runnable proclet to the back of the ready queue.
  pub(crate) fn admit(&mut self, flags: ProcletFlags) -> FgRank {
    let rank: FgRank = FgRank::new(self.states.len() as u32);

    self.states.push(ProcletState::Runnable);
    self.flags.push(flags);
    self.ready.push_back(rank);

    rank
  }

  #[inline]
  pub(crate) fn total(&self) -> usize {
    self.states.len()
  }

  #[inline]
  pub(crate) fn live(&self) -> usize {
    self.states.len() - self.finished
  }

  #[inline]
  pub(crate) fn current(&self) -> Option<FgRank> {
    self.current
  }

  #[inline]
  pub(crate) fn state(&self, rank: FgRank) -> Option<ProcletState> {
    self.states.get(rank.index()).copied()
  }

  #[inline]
  pub(crate) fn flags(&self, rank: FgRank) -> Option<ProcletFlags> {
    self.flags.get(rank.index()).copied()
  }

  #[inline]
  pub(crate) fn has_ready(&self) -> bool {
    !self.ready.is_empty()
  }

  #[inline]
  pub(crate) fn waiting(&self) -> usize {
    self.events.waiting()
  }

  // ---------------------------------------------------------------------------
  // Dispatch
  // ---------------------------------------------------------------------------

  /// Takes the next proclet off the ready queue and marks it running.
  pub(crate) fn dispatch(&mut self) -> Option<FgRank> {
    let rank: FgRank = self.ready.pop_front()?;

    match self.states[rank.index()] {
      ProcletState::Runnable => {}
      state => fatal!("dispatched {rank} in state {state:?}"),
    }

    self.states[rank.index()] = ProcletState::Running;
    self.current = Some(rank);

    Some(rank)
  }

  /// Records that the running proclet reached a yield point.
  pub(crate) fn suspend(&mut self, rank: FgRank) {
    self.current = None;

    match self.states[rank.index()] {
      ProcletState::Running => {
        self.states[rank.index()] = ProcletState::Runnable;
        self.ready.push_back(rank);
      }
      ProcletState::WaitingOnEvent(_) => {}
      state => fatal!("suspended {rank} in state {state:?}"),
    }
  }

  /// Records that the running proclet completed.
  pub(crate) fn finish(&mut self, rank: FgRank) {
    self.current = None;

    if let ProcletState::WaitingOnEvent(key) = self.states[rank.index()] {
      self.events.unpark(key, rank);
    }

    self.states[rank.index()] = ProcletState::Finished;
    self.finished += 1;
  }

  // ---------------------------------------------------------------------------
  // Events
  // ---------------------------------------------------------------------------

  /// Registers the running proclet `rank` as the waiter of `key`.
  pub(crate) fn park(&mut self, rank: FgRank, key: EventKey) -> Parked {
    let parked: Parked = self.events.park(key, rank);

    if parked == Parked::Waiting {
      self.states[rank.index()] = ProcletState::WaitingOnEvent(key);
    }

    trace!(target: "proclet", fgrank = rank.get(), %key, ?parked, "yield on event");

    parked
  }

  /// Withdraws a wait that was abandoned before being notified.
  pub(crate) fn unpark(&mut self, rank: FgRank, key: EventKey) {
    if self.events.unpark(key, rank) && self.states[rank.index()] == ProcletState::WaitingOnEvent(key) {
      self.states[rank.index()] = ProcletState::Running;
    }
  }

  /// Makes the proclet waiting on `key` runnable.
  pub(crate) fn notify(&mut self, key: EventKey) -> bool {
    let Some(rank) = self.events.notify(key) else {
      trace!(target: "proclet", %key, "notify without waiter");
      return false;
    };

    match self.states[rank.index()] {
      ProcletState::WaitingOnEvent(waiting) if waiting == key => {}
      state => fatal!("notified {rank} on {key} in state {state:?}"),
    }

    self.states[rank.index()] = ProcletState::Runnable;
    self.ready.push_back(rank);

    trace!(target: "proclet", fgrank = rank.get(), %key, "notified");

    true
  }
}
