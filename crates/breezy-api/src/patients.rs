//! Handlers for `/patients` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/patients` | Sorted by display name |
//! | `GET`  | `/patients/:id` | 404 if not found |
//! | `POST` | `/patients/:id/follow-up` | 200 sent, 409 denied, 502 failed |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use breezy_core::{
  dashboard::{FollowUp, PatientDetail, PatientOption},
  dispatch::SendOutcome,
  store::{AppointmentStore, Directory, ReportStore},
  transport::MessagingTransport,
};
use chrono::Utc;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /patients`
pub async fn list<S, T>(
  State(state): State<AppState<S, T>>,
) -> Result<Json<Vec<PatientOption>>, ApiError>
where
  S: Directory + AppointmentStore + ReportStore,
  T: MessagingTransport,
{
  Ok(Json(state.dashboard.patient_options().await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /patients/:id`
pub async fn get_one<S, T>(
  State(state): State<AppState<S, T>>,
  Path(id): Path<String>,
) -> Result<Json<PatientDetail>, ApiError>
where
  S: Directory + AppointmentStore + ReportStore,
  T: MessagingTransport,
{
  let detail = state
    .dashboard
    .patient_detail(&id, Utc::now())
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))?;
  Ok(Json(detail))
}

// ─── Follow-up ────────────────────────────────────────────────────────────────

/// `POST /patients/:id/follow-up`
///
/// The body is always the [`SendOutcome`]; the status code mirrors it.
pub async fn follow_up<S, T>(
  State(state): State<AppState<S, T>>,
  Path(id): Path<String>,
) -> Result<(StatusCode, Json<SendOutcome>), ApiError>
where
  S: Directory + AppointmentStore + ReportStore,
  T: MessagingTransport,
{
  let result = state
    .dashboard
    .follow_up(&state.dispatcher, &id, Utc::now())
    .await?;

  let outcome = match result {
    FollowUp::UnknownPatient => {
      return Err(ApiError::NotFound(format!("patient {id} not found")));
    }
    FollowUp::NoAppointment => {
      return Err(ApiError::NotFound(format!("patient {id} has no appointment")));
    }
    FollowUp::Attempted(outcome) => outcome,
  };

  let status = match &outcome {
    SendOutcome::Sent(_) => StatusCode::OK,
    SendOutcome::Denied(_) => StatusCode::CONFLICT,
    SendOutcome::Failed(_) => StatusCode::BAD_GATEWAY,
  };
  Ok((status, Json(outcome)))
}
