//! Handler for `GET /appointments/upcoming[?limit=<n>]`.

use axum::{
  Json,
  extract::{Query, State},
};
use breezy_core::{
  dashboard::{DEFAULT_UPCOMING_LIMIT, UpcomingEntry},
  store::{AppointmentStore, Directory, ReportStore},
  transport::MessagingTransport,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Largest `limit` a client may ask for.
pub const MAX_UPCOMING_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
  pub limit: Option<usize>,
}

/// `GET /appointments/upcoming`
pub async fn upcoming<S, T>(
  State(state): State<AppState<S, T>>,
  Query(params): Query<UpcomingParams>,
) -> Result<Json<Vec<UpcomingEntry>>, ApiError>
where
  S: Directory + AppointmentStore + ReportStore,
  T: MessagingTransport,
{
  let limit = params.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
  if !(1..=MAX_UPCOMING_LIMIT).contains(&limit) {
    return Err(ApiError::BadRequest(format!(
      "limit must be between 1 and {MAX_UPCOMING_LIMIT}"
    )));
  }
  Ok(Json(state.dashboard.upcoming(Utc::now(), limit).await?))
}
