//! Cooperative multiplexing of proclets onto one thread.
//!
//! A proclet is an `async` body holding a [`ProcletCx`]. Its yield points
//! are the awaits of [`ProcletCx::yield_now`] and
//! [`ProcletCx::yield_on_event`], and of any collaborator operation built
//! on them. The [`Scheduler`] resumes one proclet at a time and drives a
//! [`Progress`] hook between dispatches; the hook completes outstanding
//! communication and resumes waiting proclets through a [`Notifier`].
//!
//! # State Machine
//!
//! ```text
//! Runnable -> Running -> Runnable         (yield)
//!                     -> WaitingOnEvent   (yield on event)
//!                     -> Finished         (completion)
//! WaitingOnEvent -> Runnable              (matching notify)
//! ```

mod context;
mod core;
mod event;
mod handle;
mod proclet;
mod progress;
mod scheduler;

pub(crate) use self::core::Core;

pub use self::context::ExecContext;
pub use self::context::FutureContext;
pub use self::context::Resume;
pub use self::event::EventRegistry;
pub use self::event::NotifyPolicy;
pub use self::event::Parked;
pub use self::handle::ProcletCx;
pub use self::handle::WaitEvent;
pub use self::handle::YieldNow;
pub use self::proclet::ProcletFlags;
pub use self::proclet::ProcletState;
pub use self::progress::Idle;
pub use self::progress::Notifier;
pub use self::progress::Progress;
pub use self::scheduler::Scheduler;
