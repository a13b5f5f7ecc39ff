//! Identifier types shared by every layer of the runtime.

mod event;
mod rank;

pub use self::event::EventKey;
pub use self::event::Reason;
pub use self::rank::ContextId;
pub use self::rank::FgRank;
pub use self::rank::LocalRank;
pub use self::rank::Pid;
pub use self::rank::WorldRank;
