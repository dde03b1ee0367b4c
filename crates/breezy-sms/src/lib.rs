//! Twilio-compatible REST implementation of
//! [`MessagingTransport`](breezy_core::transport::MessagingTransport).
//!
//! Only the one call the dashboard needs is implemented: create a message.
//! Any server speaking the same `Messages.json` endpoint can stand in for
//! Twilio by pointing `api_base` at it.

mod twilio;

pub mod error;

pub use error::{Error, Result};
pub use twilio::{DEFAULT_API_BASE, SmsConfig, TwilioTransport};
