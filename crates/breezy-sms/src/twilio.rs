//! [`TwilioTransport`]: `POST /2010-04-01/Accounts/{sid}/Messages.json`.

use std::time::Duration;

use breezy_core::transport::{MessagingTransport, SentMessage, TransportError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

const TIMEOUT: Duration = Duration::from_secs(30);

fn default_api_base() -> String { DEFAULT_API_BASE.to_owned() }

/// Provider account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
  #[serde(default = "default_api_base")]
  pub api_base:    String,
  #[serde(default)]
  pub account_sid: String,
  #[serde(default)]
  pub auth_token:  String,
  /// Sender number, E.164.
  #[serde(default)]
  pub from_number: String,
}

impl Default for SmsConfig {
  fn default() -> Self {
    Self {
      api_base:    default_api_base(),
      account_sid: String::new(),
      auth_token:  String::new(),
      from_number: String::new(),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

/// The fields we read from a created message resource.
#[derive(Deserialize)]
struct CreatedMessage {
  sid:       String,
  status:    String,
  /// RFC 2822; `null` until the carrier has the message.
  #[serde(default)]
  date_sent: Option<String>,
}

/// Error body returned alongside 4xx/5xx statuses.
#[derive(Deserialize)]
struct Fault {
  message: String,
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// Sends follow-ups through a Twilio-compatible messages endpoint.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TwilioTransport {
  client: Client,
  config: SmsConfig,
}

impl TwilioTransport {
  pub fn new(config: SmsConfig) -> Result<Self> {
    if config.account_sid.is_empty() {
      return Err(Error::MissingSetting("account_sid"));
    }
    if config.auth_token.is_empty() {
      return Err(Error::MissingSetting("auth_token"));
    }
    if config.from_number.is_empty() {
      return Err(Error::MissingSetting("from_number"));
    }
    let client = Client::builder().timeout(TIMEOUT).build()?;
    Ok(Self { client, config })
  }

  fn messages_url(&self) -> String {
    format!(
      "{}/2010-04-01/Accounts/{}/Messages.json",
      self.config.api_base.trim_end_matches('/'),
      self.config.account_sid
    )
  }
}

impl MessagingTransport for TwilioTransport {
  async fn send(&self, to: &str, body: &str) -> Result<SentMessage, TransportError> {
    debug!(to, "posting message to provider");

    let resp = self
      .client
      .post(self.messages_url())
      .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
      .form(&[
        ("To", to),
        ("From", self.config.from_number.as_str()),
        ("Body", body),
      ])
      .send()
      .await
      .map_err(|e| TransportError::Unreachable { message: e.to_string() })?;

    let status = resp.status();
    let text = resp
      .text()
      .await
      .map_err(|e| TransportError::Unreachable { message: e.to_string() })?;

    if !status.is_success() {
      let message = serde_json::from_str::<Fault>(&text)
        .map(|f| f.message)
        .unwrap_or(text);
      return Err(TransportError::Rejected { status: status.as_u16(), message });
    }

    let created: CreatedMessage = serde_json::from_str(&text)
      .map_err(|e| TransportError::InvalidResponse { message: e.to_string() })?;

    // The message is accepted at this point; a bad timestamp only loses
    // `sent_at`.
    let sent_at = created.date_sent.as_deref().and_then(|raw| {
      parse_provider_date(raw)
        .inspect_err(|e| warn!(sid = %created.sid, date_sent = raw, "unreadable date_sent: {e}"))
        .ok()
    });

    Ok(SentMessage { id: created.sid, status: created.status, sent_at })
  }
}

fn parse_provider_date(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc2822(s).map(|dt| dt.with_timezone(&Utc))
}
