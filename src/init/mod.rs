//! Runtime start-up.

mod config;

pub use self::config::RuntimeConfig;

use std::error::Error;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::info;
use tracing::span;
use tracing::warn;

use crate::error::SchedError;
use crate::node::Node;
use crate::sched::ProcletCx;
use crate::sched::Progress;
use crate::sched::Scheduler;

/// Error returned when the global tracing subscriber cannot be installed.
pub type SubscriberError = Box<dyn Error + Send + Sync + 'static>;

static TRACING: AtomicBool = AtomicBool::new(false);

/// Runs one proclet per world rank hosted by `node`, each executing
/// `body`, until every proclet has finished.
///
/// Build `node` with [`Node::with_config`] so that it elects barrier
/// leaders with `config.leader_policy`. The global tracing subscriber is
/// installed on first use; failing to install it is reported and
/// otherwise ignored.
pub fn run<P, F, T>(config: RuntimeConfig, node: Node, transport: P, body: F) -> Result<(), SchedError>
where
  P: Progress + 'static,
  F: FnMut(ProcletCx) -> T,
  T: Future<Output = ()> + 'static,
{
  if !TRACING.swap(true, Ordering::SeqCst) {
    if let Err(error) = tracing_subscriber(&config) {
      eprintln!("failed to set tracing subscriber:");
      eprintln!("    {error}");
    }
  }

  let span: Span = span!(target: "proclet", Level::DEBUG, "init::run", pid = node.pid().get());
  let _enter = span.enter();

  if node.leader_policy() != config.leader_policy {
    warn!(
      target: "proclet",
      node = ?node.leader_policy(),
      config = ?config.leader_policy,
      "node leader policy differs from configuration; using the node's",
    );
  }

  let hosted: u32 = node.hosted();
  let mut scheduler: Scheduler<P> = Scheduler::new(Rc::new(node), transport, &config);

  debug!(target: "proclet", hosted, "spawning");

  scheduler.spawn(hosted, body);

  let result: Result<(), SchedError> = scheduler.run_until_all_finished();

  info!(
    target: "proclet",
    total = scheduler.total(),
    live = scheduler.live(),
    ok = result.is_ok(),
    "runtime stopped",
  );

  result
}

/// Installs the global tracing subscriber described by `config`.
#[cfg(feature = "tracing")]
pub fn tracing_subscriber(config: &RuntimeConfig) -> Result<(), SubscriberError> {
  use ::tracing_subscriber::FmtSubscriber;
  use ::tracing_subscriber::fmt::format;
  use ::tracing_subscriber::util::SubscriberInitExt;

  FmtSubscriber::builder()
    .event_format(format().compact())
    .log_internal_errors(true)
    .with_ansi(true)
    .with_file(config.tracing_source_file)
    .with_level(true)
    .with_line_number(config.tracing_source_line)
    .with_max_level(config.tracing_filter())
    .with_target(config.tracing_source_name)
    .with_thread_ids(config.tracing_thread_info)
    .with_thread_names(config.tracing_thread_info)
    .finish()
    .try_init()
    .map_err(Into::into)
}

#[cfg(not(feature = "tracing"))]
pub fn tracing_subscriber(_config: &RuntimeConfig) -> Result<(), SubscriberError> {
  Ok(())
}
