//! SQLite backend for the Breezy dashboard stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements the
//! directory, appointment and report traits from `breezy-core`.

mod encode;
mod fixture;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use fixture::Fixture;
pub use store::SqliteStore;
