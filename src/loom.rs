#[cfg(not(loom))]
pub(crate) mod export {
  pub(crate) mod hint {
    pub(crate) use std::hint::spin_loop;
  }

  pub(crate) mod sync {
    pub(crate) mod atomic {
      pub(crate) use std::sync::atomic::AtomicU32;
      pub(crate) use std::sync::atomic::AtomicUsize;
      pub(crate) use std::sync::atomic::Ordering;
      pub(crate) use std::sync::atomic::fence;
    }
  }
}

#[cfg(loom)]
pub(crate) mod export {
  pub(crate) mod hint {
    pub(crate) use loom::hint::spin_loop;
  }

  pub(crate) mod sync {
    pub(crate) mod atomic {
      pub(crate) use loom::sync::atomic::AtomicU32;
      pub(crate) use loom::sync::atomic::AtomicUsize;
      pub(crate) use loom::sync::atomic::Ordering;
      pub(crate) use loom::sync::atomic::fence;
    }
  }
}

#[doc(inline)]
pub(crate) use self::export::*;
