//! In-memory doubles for the store and transport traits.

use std::{
  convert::Infallible,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  model::{Appointment, Patient, PhoneRecord, Report},
  status::StatusPolicy,
  store::{AppointmentStore, Directory, ReportStore},
  transport::{MessagingTransport, SentMessage, TransportError},
};

pub fn patient(id: &str, first: &str, last: &str, phones: &[&str]) -> Patient {
  Patient {
    id:         id.into(),
    first_name: first.into(),
    last_name:  last.into(),
    phones:     phones.iter().map(|p| PhoneRecord::new(*p)).collect(),
  }
}

pub fn appointment(patient_id: &str, scheduled_date: &str) -> Appointment {
  Appointment {
    uuid:                 Uuid::new_v4(),
    patient:              patient_id.into(),
    scheduled_date:       scheduled_date.into(),
    reason:               "Annual physical".into(),
    counter:              5,
    test_message_counter: 0,
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
  patients:     Mutex<Vec<Patient>>,
  appointments: Mutex<Vec<Appointment>>,
  reports:      Mutex<Vec<Report>>,
}

impl MemoryStore {
  pub fn with_patient(self, p: Patient) -> Self {
    self.patients.lock().unwrap().push(p);
    self
  }

  pub fn with_appointment(self, a: Appointment) -> Self {
    self.appointments.lock().unwrap().push(a);
    self
  }

  pub fn with_report(self, r: Report) -> Self {
    self.reports.lock().unwrap().push(r);
    self
  }

  pub fn appointment(&self, uuid: Uuid) -> Option<Appointment> {
    self
      .appointments
      .lock()
      .unwrap()
      .iter()
      .find(|a| a.uuid == uuid)
      .cloned()
  }

  fn instant(a: &Appointment) -> DateTime<Utc> {
    StatusPolicy::default()
      .scheduled_instant(&a.scheduled_date)
      .unwrap()
  }
}

impl Directory for MemoryStore {
  type Error = Infallible;

  async fn find_patient(&self, id: &str) -> Result<Option<Patient>, Infallible> {
    Ok(self.patients.lock().unwrap().iter().find(|p| p.id == id).cloned())
  }

  async fn list_patients(&self) -> Result<Vec<Patient>, Infallible> {
    Ok(self.patients.lock().unwrap().clone())
  }
}

impl AppointmentStore for MemoryStore {
  type Error = Infallible;

  async fn find_latest_appointment(
    &self,
    patient_id: &str,
  ) -> Result<Option<Appointment>, Infallible> {
    Ok(
      self
        .appointments
        .lock()
        .unwrap()
        .iter()
        .filter(|a| a.patient == patient_id)
        .max_by_key(|a| Self::instant(a))
        .cloned(),
    )
  }

  async fn find_appointment(&self, uuid: Uuid) -> Result<Option<Appointment>, Infallible> {
    Ok(self.appointment(uuid))
  }

  async fn list_upcoming(
    &self,
    after: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<Appointment>, Infallible> {
    let mut upcoming: Vec<Appointment> = self
      .appointments
      .lock()
      .unwrap()
      .iter()
      .filter(|a| Self::instant(a) > after)
      .cloned()
      .collect();
    upcoming.sort_by_key(Self::instant);
    upcoming.truncate(limit);
    Ok(upcoming)
  }

  async fn update_counter(&self, uuid: Uuid, delta: i64) -> Result<bool, Infallible> {
    let mut appointments = self.appointments.lock().unwrap();
    match appointments.iter_mut().find(|a| a.uuid == uuid) {
      Some(a) => {
        a.test_message_counter += delta;
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

impl ReportStore for MemoryStore {
  type Error = Infallible;

  async fn find_report(&self, appointment_uuid: Uuid) -> Result<Option<Report>, Infallible> {
    Ok(
      self
        .reports
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.patient_uuid == appointment_uuid)
        .cloned(),
    )
  }
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// Records every send; fails them all when built with [`Self::failing`].
#[derive(Default)]
pub struct RecordingTransport {
  pub sent: Mutex<Vec<(String, String)>>,
  calls:    AtomicUsize,
  fail:     bool,
}

impl RecordingTransport {
  pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl MessagingTransport for RecordingTransport {
  async fn send(&self, to: &str, body: &str) -> Result<SentMessage, TransportError> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(TransportError::Unreachable { message: "connection refused".into() });
    }
    self.sent.lock().unwrap().push((to.to_owned(), body.to_owned()));
    Ok(SentMessage {
      id:      format!("SM{n:032}"),
      status:  "queued".into(),
      sent_at: None,
    })
  }
}
