//! Core types and rules for the Breezy follow-up dashboard.
//!
//! This crate has no HTTP or database dependencies. The
//! stores and the SMS provider are reached through the traits in [`store`]
//! and [`transport`]; everything else here is pure logic over the domain
//! types in [`model`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod counter;
pub mod dashboard;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod model;
pub mod status;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{Error, FormatError, Result};
