//! Error type for `breezy-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A `scheduled_date` that cannot be placed on the timeline. Raised on
  /// write, so unreadable dates never reach the ordering column.
  #[error("unreadable scheduled_date: {0}")]
  Schedule(#[from] breezy_core::FormatError),

  #[error("fixture file error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
