//! Domain records read from the clinic's stores.
//!
//! Patients, appointments and reports are written by the intake system. This
//! crate only reads them; the single exception is
//! [`Appointment::test_message_counter`], which is bumped by
//! [`crate::counter::record_test_send`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Patient ─────────────────────────────────────────────────────────────────

/// One phone entry on a patient record, exactly as intake stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
  pub phone: String,
}

impl PhoneRecord {
  pub fn new(phone: impl Into<String>) -> Self { Self { phone: phone.into() } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
  /// External identifier assigned by intake; not a storage key.
  pub id:         String,
  pub first_name: String,
  pub last_name:  String,
  /// Ordered; the first entry is the canonical number.
  #[serde(default)]
  pub phones:     Vec<PhoneRecord>,
}

impl Patient {
  /// `"<first> <last>"`, the label used everywhere a patient is listed.
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  pub fn canonical_phone(&self) -> Option<&str> {
    self.phones.first().map(|p| p.phone.as_str())
  }
}

// ─── Appointment ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
  /// External identifier; used for the form link and for counter updates.
  pub uuid:                 Uuid,
  /// [`Patient::id`] of the patient this appointment belongs to.
  pub patient:              String,
  /// ISO-8601, with or without an offset. See [`crate::status`].
  pub scheduled_date:       String,
  pub reason:               String,
  /// Remaining automated-reminder budget, decremented by the reminder
  /// pipeline.
  pub counter:              i64,
  /// Sends issued through this dashboard.
  #[serde(default)]
  pub test_message_counter: i64,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Pre-visit assessment uploaded by the patient through the form link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  /// [`Appointment::uuid`] of the appointment the form was opened for.
  pub patient_uuid:  Uuid,
  pub upload_status: String,
}

impl Report {
  pub fn is_complete(&self) -> bool { self.upload_status == "complete" }
}

/// Whether the patient has finished the pre-visit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
  Complete,
  Incomplete,
  NotAvailable,
}

impl AssessmentStatus {
  pub fn from_report(report: Option<&Report>) -> Self {
    match report {
      Some(r) if r.is_complete() => Self::Complete,
      Some(_) => Self::Incomplete,
      None => Self::NotAvailable,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Complete => "Complete",
      Self::Incomplete => "Incomplete",
      Self::NotAvailable => "N/A",
    }
  }
}
