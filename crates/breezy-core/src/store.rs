//! Store traits for the clinic's patient, appointment and report records.
//!
//! The traits are implemented by storage backends (e.g.
//! `breezy-store-sqlite`). Higher layers (`breezy-api`, the dispatcher)
//! depend on these abstractions, not on any concrete backend.
//!
//! A lookup that finds nothing returns `Ok(None)`: missing records are a
//! normal state for this dashboard, not an error.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Appointment, Patient, Report};

/// Patient directory maintained by intake.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look a patient up by their external id.
  fn find_patient<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Patient>, Self::Error>> + Send + 'a;

  /// Every patient, in no particular order.
  fn list_patients(
    &self,
  ) -> impl Future<Output = Result<Vec<Patient>, Self::Error>> + Send + '_;
}

/// Appointment records, plus the one write this dashboard performs.
pub trait AppointmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The appointment with the latest `scheduled_date` for a patient.
  fn find_latest_appointment<'a>(
    &'a self,
    patient_id: &'a str,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + 'a;

  fn find_appointment(
    &self,
    uuid: Uuid,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  /// Appointments scheduled strictly after `after`, ascending, at most
  /// `limit` of them.
  fn list_upcoming(
    &self,
    after: DateTime<Utc>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + '_;

  /// Add `delta` to `test_message_counter` in a single atomic update.
  /// Returns `false` when no appointment has that uuid.
  fn update_counter(
    &self,
    uuid: Uuid,
    delta: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Pre-visit assessment reports, keyed by appointment uuid.
pub trait ReportStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_report(
    &self,
    appointment_uuid: Uuid,
  ) -> impl Future<Output = Result<Option<Report>, Self::Error>> + Send + '_;
}
