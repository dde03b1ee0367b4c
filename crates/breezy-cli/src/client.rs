//! Async HTTP client wrapping the Breezy JSON API.

use anyhow::{Context, Result, anyhow};
use breezy_core::{
  dashboard::{PatientDetail, PatientOption, UpcomingEntry},
  dispatch::SendOutcome,
};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Connection settings for the Breezy API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the Breezy JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  // ── Patients ──────────────────────────────────────────────────────────────

  /// `GET /api/patients`
  pub async fn list_patients(&self) -> Result<Vec<PatientOption>> {
    let resp = self
      .client
      .get(self.url("/patients"))
      .send()
      .await
      .context("GET /patients failed")?;

    if !resp.status().is_success() {
      return Err(api_error("GET /patients", resp).await);
    }
    resp.json().await.context("deserialising patients")
  }

  /// `GET /api/patients/<id>`; `None` when the server does not know the id.
  pub async fn patient_detail(&self, id: &str) -> Result<Option<PatientDetail>> {
    let resp = self
      .client
      .get(self.url(&format!("/patients/{id}")))
      .send()
      .await
      .context("GET /patients/<id> failed")?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !resp.status().is_success() {
      return Err(api_error("GET /patients/<id>", resp).await);
    }
    resp.json().await.map(Some).context("deserialising patient detail")
  }

  /// `POST /api/patients/<id>/follow-up`
  ///
  /// Denied and failed sends come back as a [`SendOutcome`], not an error.
  pub async fn follow_up(&self, id: &str) -> Result<SendOutcome> {
    let resp = self
      .client
      .post(self.url(&format!("/patients/{id}/follow-up")))
      .send()
      .await
      .context("POST /patients/<id>/follow-up failed")?;

    match resp.status() {
      StatusCode::OK | StatusCode::CONFLICT | StatusCode::BAD_GATEWAY => {
        resp.json().await.context("deserialising send outcome")
      }
      _ => Err(api_error("POST /patients/<id>/follow-up", resp).await),
    }
  }

  // ── Appointments ──────────────────────────────────────────────────────────

  /// `GET /api/appointments/upcoming?limit=<n>`
  pub async fn upcoming(&self, limit: usize) -> Result<Vec<UpcomingEntry>> {
    let resp = self
      .client
      .get(self.url("/appointments/upcoming"))
      .query(&[("limit", limit.to_string())])
      .send()
      .await
      .context("GET /appointments/upcoming failed")?;

    if !resp.status().is_success() {
      return Err(api_error("GET /appointments/upcoming", resp).await);
    }
    resp.json().await.context("deserialising upcoming appointments")
  }
}

/// Turn a non-success response into an error carrying the server's
/// `{"error": ..}` message when there is one.
async fn api_error(what: &str, resp: Response) -> anyhow::Error {
  let status = resp.status();
  let message = resp
    .json::<serde_json::Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned));
  match message {
    Some(m) => anyhow!("{what} → {status}: {m}"),
    None => anyhow!("{what} → {status}"),
  }
}
