use std::borrow::Cow;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Error surfaced by the transport collaborator while making progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
  message: Cow<'static, str>,
}

impl TransportError {
  /// Creates a new `TransportError`.
  #[inline]
  pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
    Self {
      message: message.into(),
    }
  }

  /// Returns the error message.
  #[inline]
  pub fn message(&self) -> &str {
    &self.message
  }
}

impl Display for TransportError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "transport failure: {}", self.message)
  }
}

impl Error for TransportError {}
