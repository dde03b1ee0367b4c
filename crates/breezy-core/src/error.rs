//! Error types for `breezy-core`.

use thiserror::Error;
use uuid::Uuid;

/// A timestamp or phone string that cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
  #[error("invalid timestamp {input:?}: {reason}")]
  InvalidTimestamp { input: String, reason: String },

  #[error("phone number {0:?} contains no digits")]
  NoDigits(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Format(#[from] FormatError),

  /// `6 - counter + test_message_counter` went below zero. The counters are
  /// written by two different systems; this means one of them is wrong.
  #[error(
    "negative message count for appointment {uuid}: counter={counter}, \
     test_message_counter={test_message_counter}"
  )]
  NegativeMessageCount {
    uuid:                 Uuid,
    counter:              i64,
    test_message_counter: i64,
  },

  #[error("appointment not found: {0}")]
  AppointmentNotFound(Uuid),

  #[error("unknown timezone: {0:?}")]
  UnknownTimezone(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used at every store call site.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
