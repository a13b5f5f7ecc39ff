use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

macro_rules! rank_type {
  ($(#[$meta:meta])* $name:ident, $label:literal) => {
    $(#[$meta])*
    #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
    #[repr(transparent)]
    pub struct $name(u32);

    impl $name {
      /// Creates a new identifier from its raw value.
      #[inline]
      pub const fn new(value: u32) -> Self {
        Self(value)
      }

      /// Returns the raw value of the identifier.
      #[inline]
      pub const fn get(self) -> u32 {
        self.0
      }

      #[allow(dead_code)]
      #[inline]
      pub(crate) const fn index(self) -> usize {
        self.0 as usize
      }
    }

    impl Display for $name {
      fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, concat!($label, "<{}>"), self.0)
      }
    }

    impl From<u32> for $name {
      #[inline]
      fn from(other: u32) -> Self {
        Self(other)
      }
    }
  };
}

rank_type! {
  /// Sequence number of a proclet within its hosting OS process.
  FgRank, "fg"
}

rank_type! {
  /// Rank of a proclet within one communication group.
  LocalRank, "local"
}

rank_type! {
  /// Rank of a proclet within the initial world group.
  WorldRank, "world"
}

rank_type! {
  /// Identity of the OS process hosting a proclet.
  Pid, "pid"
}

rank_type! {
  /// Identifier of a communication group context.
  ContextId, "cid"
}

impl LocalRank {
  /// The null peer; translation yields [`RtwEntry::PROC_NULL`].
  ///
  /// [`RtwEntry::PROC_NULL`]: crate::rtw::RtwEntry::PROC_NULL
  pub const PROC_NULL: Self = Self(u32::MAX);
}

impl WorldRank {
  pub const PROC_NULL: Self = Self(u32::MAX);
}

impl Pid {
  pub const PROC_NULL: Self = Self(u32::MAX);
}

impl ContextId {
  /// Context of the initial world group.
  pub const WORLD: Self = Self(0);
}
