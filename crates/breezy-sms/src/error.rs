//! Error type for `breezy-sms`.

use thiserror::Error;

/// Raised while building a transport. Send failures are reported as
/// [`TransportError`](breezy_core::transport::TransportError) instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("missing SMS setting: {0}")]
  MissingSetting(&'static str),

  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
