use tracing::Level;

use crate::consts;
use crate::rtw::LeaderPolicy;
use crate::sched::NotifyPolicy;

/// Configuration of a proclet runtime.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
  // ---------------------------------------------------------------------------
  // Scheduler Configuration
  // ---------------------------------------------------------------------------
  pub notify_policy: NotifyPolicy,
  pub leader_policy: LeaderPolicy,
  pub spawner: Option<u32>,
  pub progress_interval: u32,
  // ---------------------------------------------------------------------------
  // Tracing Subscriber Configuration
  // ---------------------------------------------------------------------------
  pub tracing_source_file: bool,
  pub tracing_source_line: bool,
  pub tracing_source_name: bool,
  pub tracing_thread_info: bool,
  pub tracing_verbose: bool,
  pub tracing_very_verbose: bool,
}

impl RuntimeConfig {
  #[inline]
  pub fn new() -> Self {
    Self {
      notify_policy: NotifyPolicy::default(),
      leader_policy: LeaderPolicy::default(),
      spawner: consts::DEFAULT_SPAWNER,
      progress_interval: consts::DEFAULT_PROGRESS_INTERVAL,
      tracing_source_file: false,
      tracing_source_line: false,
      tracing_source_name: false,
      tracing_thread_info: false,
      tracing_verbose: false,
      tracing_very_verbose: false,
    }
  }

  #[inline]
  pub const fn tracing_filter(&self) -> Level {
    if self.tracing_very_verbose {
      Level::TRACE
    } else if self.tracing_verbose {
      Level::DEBUG
    } else {
      Level::INFO
    }
  }
}

impl Default for RuntimeConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use tracing::Level;

  use crate::init::RuntimeConfig;
  use crate::rtw::LeaderPolicy;
  use crate::sched::NotifyPolicy;

  #[test]
  fn test_defaults() {
    let config: RuntimeConfig = RuntimeConfig::default();

    assert_eq!(config.notify_policy, NotifyPolicy::Edge);
    assert_eq!(config.leader_policy, LeaderPolicy::LowestLocalRank);
    assert_eq!(config.spawner, Some(0));
    assert_eq!(config.progress_interval, 1);
    assert_eq!(config.tracing_filter(), Level::INFO);
  }

  #[test]
  fn test_tracing_filter() {
    let mut config: RuntimeConfig = RuntimeConfig::new();

    config.tracing_verbose = true;
    assert_eq!(config.tracing_filter(), Level::DEBUG);

    config.tracing_very_verbose = true;
    assert_eq!(config.tracing_filter(), Level::TRACE);
  }
}
