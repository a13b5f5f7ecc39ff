use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use std::task::Waker;

use crate::error::fatal;

/// Outcome of resuming an execution context.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Resume {
  /// The computation reached a yield point and can be resumed later.
  Suspended,
  /// The computation ran to completion.
  Finished,
}

/// A suspended computation that can be resumed where it last yielded.
///
/// The scheduler assumes nothing about the representation beyond this
/// method. Resuming a context that already returned [`Resume::Finished`]
/// is an invariant violation.
pub trait ExecContext {
  fn resume(&mut self) -> Resume;
}

/// Execution context backed by a future.
///
/// Each yield point of the proclet is an `.await` that returns
/// [`Poll::Pending`]; resuming polls the future once more. The scheduler
/// does not use wakers: readiness is tracked by the proclet state, so the
/// future is polled with a no-op waker.
pub struct FutureContext {
  future: Option<Pin<Box<dyn Future<Output = ()>>>>,
}

impl FutureContext {
  /// Creates a new `FutureContext` that runs `future`.
  pub fn new<F>(future: F) -> Self
  where
    F: Future<Output = ()> + 'static,
  {
    Self {
      future: Some(Box::pin(future)),
    }
  }
}

impl ExecContext for FutureContext {
  fn resume(&mut self) -> Resume {
    let Some(future) = self.future.as_mut() else {
      fatal!("resumed a finished execution context");
    };

    let mut context: Context<'_> = Context::from_waker(Waker::noop());

    match future.as_mut().poll(&mut context) {
      Poll::Ready(()) => {
        self.future = None;
        Resume::Finished
      }
      Poll::Pending => Resume::Suspended,
    }
  }
}
