//! Breezy dashboard server: configuration and the top-level router.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the SQLite store,
//! builds the SMS transport and serves [`router`].

use std::path::{Path, PathBuf};

use axum::Router;
use breezy_api::{AppState, api_router};
use breezy_core::{
  dispatch::SendPolicy,
  status::{AppointmentStatus, DEFAULT_CLINIC_TZ, DEFAULT_GRACE_MINUTES, StatusPolicy},
  store::{AppointmentStore, Directory, ReportStore},
  transport::MessagingTransport,
};
use breezy_sms::SmsConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Environment variables with this prefix override file settings, with `__`
/// between nested keys (`BREEZY_SMS__AUTH_TOKEN`).
pub const ENV_PREFIX: &str = "BREEZY";

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/breezy/breezy.db") }
fn default_clinic_tz() -> String { DEFAULT_CLINIC_TZ.name().to_owned() }
fn default_grace_minutes() -> i64 { DEFAULT_GRACE_MINUTES }
fn default_eligible() -> AppointmentStatus { AppointmentStatus::Upcoming }
fn default_api_base() -> String { breezy_sms::DEFAULT_API_BASE.to_owned() }

/// Runtime server configuration, deserialised from `breezy.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  /// Patient-facing form site; the appointment uuid is appended.
  pub link_base_url: String,
  pub clinic_name:   String,
  #[serde(default)]
  pub status:        StatusSection,
  #[serde(default)]
  pub sms:           SmsSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusSection {
  /// IANA zone used for timestamps written without an offset.
  #[serde(default = "default_clinic_tz")]
  pub clinic_timezone: String,
  #[serde(default = "default_grace_minutes")]
  pub grace_minutes:   i64,
  /// The status in which follow-ups may be sent.
  #[serde(default = "default_eligible")]
  pub eligible:        AppointmentStatus,
}

impl Default for StatusSection {
  fn default() -> Self {
    Self {
      clinic_timezone: default_clinic_tz(),
      grace_minutes:   default_grace_minutes(),
      eligible:        default_eligible(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmsSection {
  #[serde(default = "default_api_base")]
  pub api_base:       String,
  #[serde(default)]
  pub account_sid:    String,
  #[serde(default)]
  pub auth_token:     String,
  #[serde(default)]
  pub from_number:    String,
  /// Send every follow-up here instead of to the patient.
  #[serde(default)]
  pub test_recipient: Option<String>,
}

impl Default for SmsSection {
  fn default() -> Self {
    Self {
      api_base:       default_api_base(),
      account_sid:    String::new(),
      auth_token:     String::new(),
      from_number:    String::new(),
      test_recipient: None,
    }
  }
}

impl ServerConfig {
  /// Read `path` (optional) with environment overrides on top.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(environment())
      .build()?
      .try_deserialize()
  }

  pub fn status_policy(&self) -> breezy_core::Result<StatusPolicy> {
    StatusPolicy::new(&self.status.clinic_timezone, self.status.grace_minutes)
  }

  pub fn send_policy(&self) -> SendPolicy {
    SendPolicy {
      eligible:       self.status.eligible,
      link_base_url:  self.link_base_url.clone(),
      clinic_name:    self.clinic_name.clone(),
      test_recipient: self.sms.test_recipient.clone(),
    }
  }

  pub fn sms_config(&self) -> SmsConfig {
    SmsConfig {
      api_base:    self.sms.api_base.clone(),
      account_sid: self.sms.account_sid.clone(),
      auth_token:  self.sms.auth_token.clone(),
      from_number: self.sms.from_number.clone(),
    }
  }
}

fn environment() -> config::Environment {
  config::Environment::with_prefix(ENV_PREFIX)
    .prefix_separator("_")
    .separator("__")
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn router<S, T>(state: AppState<S, T>) -> Router
where
  S: Directory + AppointmentStore + ReportStore + 'static,
  T: MessagingTransport + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use breezy_sms::TwilioTransport;
  use breezy_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  const MINIMAL: &str = r#"
    link_base_url = "https://forms.example.org"
    clinic_name   = "PrimeCare of Georgia"
  "#;

  fn parse(toml: &str, env: &[(&str, &str)]) -> ServerConfig {
    let vars: config::Map<String, String> = env
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect();
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .add_source(environment().source(Some(vars)))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn minimal_config_takes_defaults() {
    let cfg = parse(MINIMAL, &[]);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.status.clinic_timezone, "America/New_York");
    assert_eq!(cfg.status.grace_minutes, 240);
    assert_eq!(cfg.status.eligible, AppointmentStatus::Upcoming);
    assert_eq!(cfg.sms.api_base, "https://api.twilio.com");
    assert!(cfg.sms.test_recipient.is_none());
    assert!(cfg.status_policy().is_ok());
  }

  #[test]
  fn default_status_section_matches_core_policy() {
    let section = StatusSection::default();
    assert_eq!(section.clinic_timezone, DEFAULT_CLINIC_TZ.name());
    let cfg = ServerConfig { status: section, ..parse(MINIMAL, &[]) };
    assert_eq!(cfg.status_policy().unwrap(), StatusPolicy::default());
  }

  #[test]
  fn nested_sections_and_env_overrides() {
    let toml = format!(
      "{MINIMAL}
      [status]
      clinic_timezone = \"America/Chicago\"
      eligible        = \"past\"

      [sms]
      account_sid = \"AC1\"
      "
    );
    let cfg = parse(
      &toml,
      &[
        ("BREEZY_PORT", "9000"),
        ("BREEZY_SMS__AUTH_TOKEN", "from-env"),
        ("BREEZY_SMS__TEST_RECIPIENT", "+15550001111"),
      ],
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.status.clinic_timezone, "America/Chicago");
    assert_eq!(cfg.status.eligible, AppointmentStatus::Past);
    assert_eq!(cfg.sms.account_sid, "AC1");
    assert_eq!(cfg.sms.auth_token, "from-env");

    let send = cfg.send_policy();
    assert_eq!(send.eligible, AppointmentStatus::Past);
    assert_eq!(send.test_recipient.as_deref(), Some("+15550001111"));
  }

  #[test]
  fn unknown_timezone_is_rejected() {
    let toml = format!("{MINIMAL}\n[status]\nclinic_timezone = \"Mars/Olympus\"\n");
    let cfg = parse(&toml, &[]);
    assert!(cfg.status_policy().is_err());
  }

  #[test]
  fn expand_tilde_leaves_absolute_paths() {
    assert_eq!(expand_tilde(Path::new("/var/lib/breezy.db")), PathBuf::from("/var/lib/breezy.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let cfg = parse(
      &format!("{MINIMAL}\n[sms]\naccount_sid = \"AC1\"\nauth_token = \"t\"\nfrom_number = \"+15550000000\"\n"),
      &[],
    );
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let transport = Arc::new(TwilioTransport::new(cfg.sms_config()).unwrap());
    let state = AppState::new(store, transport, cfg.status_policy().unwrap(), cfg.send_policy());

    let req = Request::builder().uri("/api/patients").body(Body::empty()).unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, serde_json::json!([]));

    let req = Request::builder().uri("/patients").body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
