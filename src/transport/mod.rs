//! Transport collaborators driven by the scheduler's progress hook.
//!
//! The scheduler knows nothing about communication beyond the
//! [`Progress`] trait: a transport completes outstanding operations when
//! advanced and resumes the proclets waiting on them through the
//! [`Notifier`]. [`Loopback`] delivers messages between the proclets of a
//! single OS process.
//!
//! [`Progress`]: crate::sched::Progress
//! [`Notifier`]: crate::sched::Notifier

mod loopback;

pub use self::loopback::Loopback;
pub use self::loopback::LoopbackPort;
pub use self::loopback::Message;
