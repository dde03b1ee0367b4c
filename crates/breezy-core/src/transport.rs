//! The outbound SMS capability.
//!
//! The provider is opaque: hand it a number and a body, get back a receipt or
//! an error. Retries, delivery callbacks and the wire protocol all live in
//! the implementing crate (`breezy-sms`).

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the provider reports once it has accepted a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
  /// Provider-assigned message id (a Twilio `SM…` sid, for instance).
  pub id:      String,
  /// Provider delivery status at acceptance time, e.g. `"queued"`.
  pub status:  String,
  /// Provider timestamp, when it supplies one.
  pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportError {
  /// The provider answered and refused the message.
  #[error("provider rejected message ({status}): {message}")]
  Rejected { status: u16, message: String },

  /// The provider could not be reached or did not answer in time.
  #[error("provider unreachable: {message}")]
  Unreachable { message: String },

  /// The provider answered with something we could not read.
  #[error("unreadable provider response: {message}")]
  InvalidResponse { message: String },
}

pub trait MessagingTransport: Send + Sync {
  /// Send `body` to `to` (E.164). Resolves once the provider has accepted or
  /// refused the message.
  fn send<'a>(
    &'a self,
    to: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<SentMessage, TransportError>> + Send + 'a;
}
