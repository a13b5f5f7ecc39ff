use std::cell::Ref;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::error;
use tracing::span;
use tracing::trace;
use tracing::warn;

use crate::error::SchedError;
use crate::error::TransportError;
use crate::error::fatal;
use crate::init::RuntimeConfig;
use crate::lang::EventKey;
use crate::lang::FgRank;
use crate::node::Node;
use crate::sched::Core;
use crate::sched::ExecContext;
use crate::sched::FutureContext;
use crate::sched::Notifier;
use crate::sched::ProcletCx;
use crate::sched::ProcletFlags;
use crate::sched::ProcletState;
use crate::sched::Progress;
use crate::sched::Resume;

/// Cooperative scheduler of the proclets hosted by one OS process.
///
/// Exactly one proclet runs at a time. A proclet runs until it reaches a
/// yield point, after which the next runnable proclet is dispatched in
/// round-robin order (ties broken by creation order). The progress hook
/// runs between dispatches and resumes waiting proclets through
/// notifications.
pub struct Scheduler<P> {
  core: Rc<RefCell<Core>>,
  transport: Rc<RefCell<P>>,
  contexts: Vec<Option<Box<dyn ExecContext>>>,
  node: Rc<Node>,
  spawner: Option<u32>,
  progress_interval: u32,
}

impl<P> Scheduler<P>
where
  P: Progress + 'static,
{
  /// Creates a scheduler with no proclets.
  pub fn new(node: Rc<Node>, transport: P, config: &RuntimeConfig) -> Self {
    Self {
      core: Rc::new(RefCell::new(Core::new(config.notify_policy))),
      transport: Rc::new(RefCell::new(transport)),
      contexts: Vec::new(),
      node,
      spawner: config.spawner,
      progress_interval: config.progress_interval.max(1),
    }
  }

  // ---------------------------------------------------------------------------
  // Inspection
  // ---------------------------------------------------------------------------

  /// Returns the start-up context shared by every proclet.
  #[inline]
  pub fn node(&self) -> &Rc<Node> {
    &self.node
  }

  /// Returns the transport driven by this scheduler.
  #[inline]
  pub fn transport(&self) -> Ref<'_, P> {
    self.transport.borrow()
  }

  /// Returns the number of proclets ever spawned.
  #[inline]
  pub fn total(&self) -> usize {
    self.core.borrow().total()
  }

  /// Returns the number of proclets that have not finished.
  #[inline]
  pub fn live(&self) -> usize {
    self.core.borrow().live()
  }

  /// Returns the fine-grain rank of the running proclet.
  #[inline]
  pub fn current(&self) -> Option<FgRank> {
    self.core.borrow().current()
  }

  /// Returns the state of the proclet with fine-grain rank `rank`.
  #[inline]
  pub fn state(&self, rank: FgRank) -> Option<ProcletState> {
    self.core.borrow().state(rank)
  }

  /// Returns `true` if `rank` carries the spawner flag.
  ///
  /// Ranks that were never spawned are not spawners.
  #[inline]
  pub fn is_spawner(&self, rank: FgRank) -> bool {
    self
      .core
      .borrow()
      .flags(rank)
      .is_some_and(|flags| flags.contains(ProcletFlags::SPAWNER))
  }

  // ---------------------------------------------------------------------------
  // Spawning
  // ---------------------------------------------------------------------------

  /// Creates `count` proclets running `body`, one future per proclet.
  ///
  /// Fine-grain ranks are assigned in creation order, continuing after
  /// any proclet spawned earlier. Aborts the process if the contexts
  /// cannot be allocated.
  pub fn spawn<F, T>(&mut self, count: u32, mut body: F) -> Vec<FgRank>
  where
    F: FnMut(ProcletCx) -> T,
    T: Future<Output = ()> + 'static,
  {
    self.spawn_with(count, |cx| -> Box<dyn ExecContext> {
      Box::new(FutureContext::new(body(cx)))
    })
  }

  /// Creates `count` proclets with caller-provided execution contexts.
  pub fn spawn_with<F>(&mut self, count: u32, mut context: F) -> Vec<FgRank>
  where
    F: FnMut(ProcletCx) -> Box<dyn ExecContext>,
  {
    let count: usize = count as usize;
    let hosted: usize = self.node.hosted() as usize;

    if self.contexts.len() + count > hosted {
      fatal!(
        "spawned {} proclet(s) on {} hosting {hosted}",
        self.contexts.len() + count,
        self.node.pid(),
      );
    }

    if let Err(error) = self.contexts.try_reserve(count) {
      fatal!("failed to allocate {count} proclet context(s): {error}");
    }

    self.core.borrow_mut().reserve(count);

    let transport: Rc<RefCell<dyn Progress>> = self.transport.clone();
    let mut ranks: Vec<FgRank> = Vec::with_capacity(count);

    for _ in 0..count {
      let index: u32 = self.contexts.len() as u32;

      let flags: ProcletFlags = if self.spawner == Some(index) {
        ProcletFlags::SPAWNER
      } else {
        ProcletFlags::empty()
      };

      let rank: FgRank = self.core.borrow_mut().admit(flags);

      let cx: ProcletCx = ProcletCx::new(
        rank,
        flags,
        Rc::clone(&self.core),
        Rc::clone(&transport),
        Rc::clone(&self.node),
      );

      self.contexts.push(Some(context(cx)));
      ranks.push(rank);
    }

    debug!(
      target: "proclet",
      pid = self.node.pid().get(),
      count,
      total = self.contexts.len(),
      "proclets spawned",
    );

    ranks
  }

  // ---------------------------------------------------------------------------
  // Events
  // ---------------------------------------------------------------------------

  /// Makes the proclet waiting on `key` runnable.
  #[inline]
  pub fn notify(&self, key: EventKey) -> bool {
    self.core.borrow_mut().notify(key)
  }

  /// Advances the transport once, outside of any proclet.
  pub fn progress(&self) -> Result<(), TransportError> {
    let mut transport = self.transport.borrow_mut();
    let mut core = self.core.borrow_mut();

    transport.progress(&mut Notifier::new(&mut core))
  }

  // ---------------------------------------------------------------------------
  // Driver
  // ---------------------------------------------------------------------------

  /// Runs the next runnable proclet to its next yield point.
  ///
  /// Returns the proclet that ran, or `None` if no proclet is runnable.
  pub fn run_once(&mut self) -> Option<FgRank> {
    let rank: FgRank = self.core.borrow_mut().dispatch()?;

    let Some(mut context) = self.contexts[rank.index()].take() else {
      fatal!("dispatched {rank} without an execution context");
    };

    trace!(target: "proclet", fgrank = rank.get(), "resume");

    match context.resume() {
      Resume::Suspended => {
        self.core.borrow_mut().suspend(rank);
        self.contexts[rank.index()] = Some(context);
      }
      Resume::Finished => {
        self.core.borrow_mut().finish(rank);

        debug!(target: "proclet", fgrank = rank.get(), "proclet finished");
      }
    }

    Some(rank)
  }

  /// Runs every hosted proclet to completion.
  ///
  /// The progress hook is called after every `progress_interval`
  /// dispatches and whenever no proclet is runnable. Fails if the hook
  /// fails, or if every live proclet waits on an event while the hook
  /// reports nothing in flight.
  pub fn run_until_all_finished(&mut self) -> Result<(), SchedError> {
    let span: Span = span!(target: "proclet", Level::DEBUG, "sched::run", pid = self.node.pid().get());
    let _enter = span.enter();

    debug!(target: "proclet", live = self.live(), "running");

    let mut dispatched: u32 = 0;

    while self.live() != 0 {
      let ran: bool = self.run_once().is_some();

      if ran {
        dispatched += 1;

        if dispatched < self.progress_interval && self.core.borrow().has_ready() {
          continue;
        }
      }

      dispatched = 0;

      if let Err(error) = self.progress() {
        error!(target: "proclet", error = error.message(), "progress failed");
        return Err(SchedError::Transport(error));
      }

      let core = self.core.borrow();

      if core.live() != 0 && !core.has_ready() && self.transport.borrow().is_quiescent() {
        let waiting: usize = core.waiting();

        warn!(target: "proclet", waiting, "scheduler stalled");

        return Err(SchedError::Stalled { waiting });
      }
    }

    debug!(target: "proclet", total = self.total(), "all proclets finished");

    Ok(())
  }
}
