//! JSON REST API for the Breezy dashboard.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `breezy-core` store traits and any
//! [`MessagingTransport`]. TLS and auth are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", breezy_api::api_router(state))
//! ```

pub mod appointments;
pub mod error;
pub mod patients;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use breezy_core::{
  dashboard::Dashboard,
  dispatch::{Dispatcher, SendPolicy},
  status::StatusPolicy,
  store::{AppointmentStore, Directory, ReportStore},
  transport::MessagingTransport,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, T> {
  pub dashboard:  Dashboard<S>,
  pub dispatcher: Dispatcher<S, T>,
}

impl<S, T> Clone for AppState<S, T> {
  fn clone(&self) -> Self {
    Self {
      dashboard:  self.dashboard.clone(),
      dispatcher: self.dispatcher.clone(),
    }
  }
}

impl<S, T> AppState<S, T>
where
  S: Directory + AppointmentStore + ReportStore,
  T: MessagingTransport,
{
  /// Wire one store into both the read model and the dispatcher.
  pub fn new(store: Arc<S>, transport: Arc<T>, status: StatusPolicy, send: SendPolicy) -> Self {
    Self {
      dashboard:  Dashboard::new(Arc::clone(&store), status, send.eligible),
      dispatcher: Dispatcher::new(store, transport, send),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, T>(state: AppState<S, T>) -> Router<()>
where
  S: Directory + AppointmentStore + ReportStore + 'static,
  T: MessagingTransport + 'static,
{
  Router::new()
    // Patients
    .route("/patients", get(patients::list::<S, T>))
    .route("/patients/{id}", get(patients::get_one::<S, T>))
    .route("/patients/{id}/follow-up", post(patients::follow_up::<S, T>))
    // Appointments
    .route("/appointments/upcoming", get(appointments::upcoming::<S, T>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use breezy_core::{
    model::{Appointment, Patient, PhoneRecord, Report},
    status::AppointmentStatus,
    transport::{SentMessage, TransportError},
  };
  use breezy_store_sqlite::SqliteStore;
  use chrono::{Duration, SecondsFormat, Utc};
  use serde_json::Value;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  // ── Fixtures ─────────────────────────────────────────────────────────────────

  #[derive(Default)]
  struct StubTransport {
    fail:  bool,
    calls: AtomicUsize,
  }

  impl MessagingTransport for StubTransport {
    async fn send(&self, _to: &str, _body: &str) -> Result<SentMessage, TransportError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(TransportError::Unreachable { message: "connection refused".into() });
      }
      Ok(SentMessage { id: "SM0001".into(), status: "queued".into(), sent_at: None })
    }
  }

  fn patient(id: &str, first: &str, last: &str, phones: &[&str]) -> Patient {
    Patient {
      id:         id.into(),
      first_name: first.into(),
      last_name:  last.into(),
      phones:     phones.iter().map(|p| PhoneRecord::new(*p)).collect(),
    }
  }

  fn appointment_in(patient_id: &str, offset: Duration) -> Appointment {
    Appointment {
      uuid:                 Uuid::new_v4(),
      patient:              patient_id.into(),
      scheduled_date:       (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Secs, true),
      reason:               "Annual physical".into(),
      counter:              5,
      test_message_counter: 0,
    }
  }

  struct Harness {
    store:     Arc<SqliteStore>,
    transport: Arc<StubTransport>,
    state:     AppState<SqliteStore, StubTransport>,
    ada_appt:  Uuid,
  }

  /// Ada: upcoming, reachable, report complete. Grace: upcoming, no phone.
  /// Alan: past appointment. Edsger: no appointment at all.
  async fn harness(transport: StubTransport) -> Harness {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    store.upsert_patient(&patient("p-3", "Alan", "Turing", &["404 555 0199"])).await.unwrap();
    store.upsert_patient(&patient("p-1", "Ada", "Lovelace", &["(404) 555-0123"])).await.unwrap();
    store.upsert_patient(&patient("p-2", "Grace", "Hopper", &[])).await.unwrap();
    store.upsert_patient(&patient("p-4", "Edsger", "Dijkstra", &["4045550111"])).await.unwrap();

    let ada = appointment_in("p-1", Duration::hours(2));
    store.upsert_appointment(&ada).await.unwrap();
    store.upsert_appointment(&appointment_in("p-2", Duration::hours(3))).await.unwrap();
    store.upsert_appointment(&appointment_in("p-3", Duration::days(-2))).await.unwrap();
    store
      .upsert_report(&Report { patient_uuid: ada.uuid, upload_status: "complete".into() })
      .await
      .unwrap();

    let transport = Arc::new(transport);
    let state = AppState::new(
      Arc::clone(&store),
      Arc::clone(&transport),
      StatusPolicy::default(),
      SendPolicy {
        eligible:       AppointmentStatus::Upcoming,
        link_base_url:  "https://forms.example.org".into(),
        clinic_name:    "PrimeCare of Georgia".into(),
        test_recipient: None,
      },
    );
    Harness { store, transport, state, ada_appt: ada.uuid }
  }

  async fn call(
    state: AppState<SqliteStore, StubTransport>,
    method: &str,
    uri: &str,
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .body(Body::empty())
      .unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── Patients ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn patient_list_is_sorted_by_display_name() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state, "GET", "/patients").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["display_name"].as_str().unwrap())
      .collect();
    assert_eq!(names, ["Ada Lovelace", "Alan Turing", "Edsger Dijkstra", "Grace Hopper"]);
  }

  #[tokio::test]
  async fn patient_detail_shows_latest_appointment() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state, "GET", "/patients/p-1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["display_name"], "Ada Lovelace");
    assert_eq!(body["phone"]["formatted"], "404-555-0123");
    assert_eq!(body["phone"]["tel_link"], "tel:4045550123");
    let appt = &body["appointment"];
    assert_eq!(appt["uuid"], h.ada_appt.to_string());
    assert_eq!(appt["status"], "upcoming");
    assert_eq!(appt["status_color"], "green");
    assert_eq!(appt["messages_sent"], 1);
    assert_eq!(appt["assessment"], "complete");
    assert_eq!(appt["follow_up_allowed"], true);
  }

  #[tokio::test]
  async fn patient_without_phone_has_null_phone() {
    let h = harness(StubTransport::default()).await;
    let (_, body) = call(h.state, "GET", "/patients/p-2").await;
    assert!(body["phone"].is_null());
    assert_eq!(body["appointment"]["follow_up_allowed"], false);
    assert_eq!(body["appointment"]["assessment"], "not_available");
  }

  #[tokio::test]
  async fn unknown_patient_is_404() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state, "GET", "/patients/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "patient nobody not found");
  }

  // ── Upcoming ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upcoming_lists_future_appointments_soonest_first() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state.clone(), "GET", "/appointments/upcoming").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["patient_id"].as_str().unwrap())
      .collect();
    assert_eq!(ids, ["p-1", "p-2"]);

    let (_, body) = call(h.state, "GET", "/appointments/upcoming?limit=1").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn upcoming_limit_out_of_range_is_400() {
    let h = harness(StubTransport::default()).await;
    let (status, _) = call(h.state.clone(), "GET", "/appointments/upcoming?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(h.state, "GET", "/appointments/upcoming?limit=101").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Follow-up ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn follow_up_sends_and_counts() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state.clone(), "POST", "/patients/p-1/follow-up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "sent");
    assert_eq!(body["detail"]["to"], "+14045550123");
    assert_eq!(body["detail"]["message_id"], "SM0001");

    let appt = h.store.find_appointment(h.ada_appt).await.unwrap().unwrap();
    assert_eq!(appt.test_message_counter, 1);

    let (_, detail) = call(h.state, "GET", "/patients/p-1").await;
    assert_eq!(detail["appointment"]["messages_sent"], 2);
  }

  #[tokio::test]
  async fn follow_up_without_phone_is_denied() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state, "POST", "/patients/p-2/follow-up").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["outcome"], "denied");
    assert_eq!(body["detail"]["reason"], "no_phone");
    assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn follow_up_for_past_appointment_is_denied() {
    let h = harness(StubTransport::default()).await;
    let (status, body) = call(h.state, "POST", "/patients/p-3/follow-up").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"]["reason"], "wrong_status");
    assert_eq!(body["detail"]["status"], "past");
  }

  #[tokio::test]
  async fn transport_failure_is_502_and_leaves_counter() {
    let h = harness(StubTransport { fail: true, ..Default::default() }).await;
    let (status, body) = call(h.state, "POST", "/patients/p-1/follow-up").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["outcome"], "failed");
    assert_eq!(body["detail"]["kind"], "unreachable");

    let appt = h.store.find_appointment(h.ada_appt).await.unwrap().unwrap();
    assert_eq!(appt.test_message_counter, 0);
  }

  #[tokio::test]
  async fn follow_up_unknown_patient_or_appointment_is_404() {
    let h = harness(StubTransport::default()).await;
    let (status, _) = call(h.state.clone(), "POST", "/patients/nobody/follow-up").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = call(h.state, "POST", "/patients/p-4/follow-up").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "patient p-4 has no appointment");
  }
}
