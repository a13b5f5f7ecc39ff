//! Default configuration values.

// -----------------------------------------------------------------------------
// Scheduler Behavior
// -----------------------------------------------------------------------------

/// Fine-grain rank that receives the spawner flag by default.
pub const DEFAULT_SPAWNER: Option<u32> = Some(0);

/// Number of dispatches between calls to the progress hook.
pub const DEFAULT_PROGRESS_INTERVAL: u32 = 1;

// -----------------------------------------------------------------------------
// Memory Allocation
// -----------------------------------------------------------------------------

/// Number of pre-allocated slots in the ready queue.
pub const CAP_READY_QUEUE: usize = 16;

/// Number of pre-allocated entries in the event registry.
pub const CAP_EVENT_WAITERS: usize = 16;

/// Number of pre-allocated entries in the co-shared group registry.
pub const CAP_GROUP_REGISTRY: usize = 4;
