//! Error handling for the proclet runtime.
//!
//! Two categories of errors exist:
//!
//! - Fatal: raised with [`fatal!`], which prints a diagnostic and aborts
//!   the OS process. Used for resource exhaustion while creating proclets
//!   and for broken scheduler invariants.
//! - Recoverable: ordinary error values returned to the calling proclet
//!   ([`RtwError`], [`LayoutError`], [`TransportError`], [`SchedError`]).
//!
//! Misuse that the runtime cannot observe (asymmetric barrier
//! participation, releasing a reference count past zero) is neither; it
//! is a documented precondition of the affected operation.

mod layout;
mod macros;
mod rtw;
mod sched;
mod transport;

pub(crate) use self::macros::fatal;

pub use self::layout::LayoutError;
pub use self::rtw::RtwError;
pub use self::sched::SchedError;
pub use self::transport::TransportError;
