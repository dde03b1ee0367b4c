//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Instants are stored as fixed-width RFC 3339 UTC strings so that string
//! order is time order. Phone lists are compact JSON. UUIDs are hyphenated
//! lowercase strings.

use breezy_core::model::{Appointment, Patient, PhoneRecord, Report};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::Result;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─── Phones ──────────────────────────────────────────────────────────────────

pub fn encode_phones(phones: &[PhoneRecord]) -> Result<String> {
  let raw: Vec<&str> = phones.iter().map(|p| p.phone.as_str()).collect();
  Ok(serde_json::to_string(&raw)?)
}

pub fn decode_phones(s: &str) -> Result<Vec<PhoneRecord>> {
  let raw: Vec<String> = serde_json::from_str(s)?;
  Ok(raw.into_iter().map(PhoneRecord::new).collect())
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PATIENT_COLUMNS: &str = "patient_id, first_name, last_name, phones";

/// Raw strings read directly from a `patients` row.
pub struct RawPatient {
  pub patient_id: String,
  pub first_name: String,
  pub last_name:  String,
  pub phones:     String,
}

impl RawPatient {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      patient_id: row.get(0)?,
      first_name: row.get(1)?,
      last_name:  row.get(2)?,
      phones:     row.get(3)?,
    })
  }

  pub fn into_patient(self) -> Result<Patient> {
    Ok(Patient {
      id:         self.patient_id,
      first_name: self.first_name,
      last_name:  self.last_name,
      phones:     decode_phones(&self.phones)?,
    })
  }
}

pub const APPOINTMENT_COLUMNS: &str =
  "uuid, patient_id, scheduled_date, reason, counter, test_message_counter";

/// Raw values read directly from an `appointments` row.
pub struct RawAppointment {
  pub uuid:                 String,
  pub patient_id:           String,
  pub scheduled_date:       String,
  pub reason:               String,
  pub counter:              i64,
  pub test_message_counter: i64,
}

impl RawAppointment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uuid:                 row.get(0)?,
      patient_id:           row.get(1)?,
      scheduled_date:       row.get(2)?,
      reason:               row.get(3)?,
      counter:              row.get(4)?,
      test_message_counter: row.get(5)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      uuid:                 decode_uuid(&self.uuid)?,
      patient:              self.patient_id,
      scheduled_date:       self.scheduled_date,
      reason:               self.reason,
      counter:              self.counter,
      test_message_counter: self.test_message_counter,
    })
  }
}

/// Raw strings read directly from a `reports` row.
pub struct RawReport {
  pub patient_uuid:  String,
  pub upload_status: String,
}

impl RawReport {
  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      patient_uuid:  decode_uuid(&self.patient_uuid)?,
      upload_status: self.upload_status,
    })
  }
}
