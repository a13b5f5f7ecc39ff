use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::lang::WorldRank;

// -----------------------------------------------------------------------------
// Reason
// -----------------------------------------------------------------------------

/// Reason code attached to an [`EventKey`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Reason(u16);

impl Reason {
  /// A posted receive has been matched.
  pub const RECV: Self = Self(1);
  /// A send has been handed to the transport.
  pub const SEND: Self = Self(2);
  /// A one-sided operation has completed.
  pub const RMA: Self = Self(3);
  /// A collective step has completed.
  pub const COLL: Self = Self(4);

  const USER_BASE: u16 = 0x100;

  /// Returns a reason code reserved for layers above the scheduler.
  #[inline]
  pub const fn user(code: u8) -> Self {
    Self(Self::USER_BASE + code as u16)
  }

  /// Returns the raw reason code.
  #[inline]
  pub const fn get(self) -> u16 {
    self.0
  }
}

impl Display for Reason {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match *self {
      Self::RECV => f.write_str("recv"),
      Self::SEND => f.write_str("send"),
      Self::RMA => f.write_str("rma"),
      Self::COLL => f.write_str("coll"),
      Self(code) => write!(f, "user<{}>", code - Self::USER_BASE),
    }
  }
}

// -----------------------------------------------------------------------------
// Event Key
// -----------------------------------------------------------------------------

/// Correlates a suspended proclet with the event that resumes it.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct EventKey {
  pub target: WorldRank,
  pub reason: Reason,
}

impl EventKey {
  #[inline]
  pub const fn new(target: WorldRank, reason: Reason) -> Self {
    Self { target, reason }
  }
}

impl Display for EventKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "{}/{}", self.target, self.reason)
  }
}

#[cfg(test)]
mod tests {
  use crate::lang::EventKey;
  use crate::lang::Reason;
  use crate::lang::WorldRank;

  #[test]
  fn test_user_reasons_do_not_collide() {
    assert_ne!(Reason::user(1), Reason::RECV);
    assert_eq!(Reason::user(7).to_string(), "user<7>");
  }

  #[test]
  fn test_key_equality() {
    let a: EventKey = EventKey::new(WorldRank::new(4), Reason::RECV);
    let b: EventKey = EventKey::new(WorldRank::new(4), Reason::SEND);

    assert_ne!(a, b);
    assert_eq!(a, EventKey::new(WorldRank::new(4), Reason::RECV));
  }
}
