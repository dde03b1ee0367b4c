//! Read models behind the dashboard screens: the patient picker, the
//! "upcoming patients" list and the patient detail panel.
//!
//! Nothing here is cached. Every call re-reads the stores, so the numbers on
//! screen are always the ones currently persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  counter::messages_sent,
  dispatch::{Dispatcher, SendOutcome},
  format::{format_date, format_phone, tel_link, to_e164_us},
  model::{AssessmentStatus, Patient},
  status::{AppointmentStatus, StatusPolicy},
  store::{AppointmentStore, Directory, ReportStore},
  transport::MessagingTransport,
};

/// Default length of the upcoming-patients list.
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

/// Label for an upcoming appointment whose patient is not in the directory.
pub const UNKNOWN_PATIENT: &str = "Unknown patient";

// ─── View types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientOption {
  pub id:           String,
  pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingEntry {
  pub patient_id:       String,
  pub display_name:     String,
  pub appointment_uuid: Uuid,
  pub formatted_date:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneDisplay {
  pub raw:       String,
  /// `None` when the stored value has no digits; show `raw` instead.
  pub formatted: Option<String>,
  pub tel_link:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentView {
  pub uuid:              Uuid,
  pub scheduled_date:    String,
  pub formatted_date:    String,
  pub status:            AppointmentStatus,
  pub status_color:      String,
  pub reason:            String,
  pub messages_sent:     u32,
  pub assessment:        AssessmentStatus,
  pub follow_up_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetail {
  pub id:           String,
  pub first_name:   String,
  pub last_name:    String,
  pub display_name: String,
  /// `None` renders as "Not available".
  pub phone:        Option<PhoneDisplay>,
  /// The most recent appointment, if the patient has any.
  pub appointment:  Option<AppointmentView>,
}

/// Result of asking for a follow-up by patient id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
  UnknownPatient,
  NoAppointment,
  Attempted(SendOutcome),
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Assembles the dashboard screens from a backend implementing all three
/// store traits.
pub struct Dashboard<S> {
  store:    Arc<S>,
  status:   StatusPolicy,
  eligible: AppointmentStatus,
}

impl<S> Clone for Dashboard<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      status:   self.status,
      eligible: self.eligible,
    }
  }
}

impl<S> Dashboard<S>
where
  S: Directory + AppointmentStore + ReportStore,
{
  pub fn new(store: Arc<S>, status: StatusPolicy, eligible: AppointmentStatus) -> Self {
    Self { store, status, eligible }
  }

  pub fn status_policy(&self) -> &StatusPolicy { &self.status }

  /// Every patient, sorted by display name (then id, so equal names keep a
  /// fixed order).
  pub async fn patient_options(&self) -> Result<Vec<PatientOption>> {
    let patients = self.store.list_patients().await.map_err(Error::store)?;
    let mut options: Vec<PatientOption> = patients
      .iter()
      .map(|p| PatientOption { id: p.id.clone(), display_name: p.display_name() })
      .collect();
    options.sort_by(|a, b| {
      a.display_name
        .cmp(&b.display_name)
        .then_with(|| a.id.cmp(&b.id))
    });
    Ok(options)
  }

  /// The next `limit` appointments after `now`, soonest first.
  pub async fn upcoming(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<UpcomingEntry>> {
    let appointments = self
      .store
      .list_upcoming(now, limit)
      .await
      .map_err(Error::store)?;

    let mut entries = Vec::with_capacity(appointments.len());
    for appt in appointments {
      let display_name = self
        .store
        .find_patient(&appt.patient)
        .await
        .map_err(Error::store)?
        .map(|p| p.display_name())
        .unwrap_or_else(|| UNKNOWN_PATIENT.to_owned());
      entries.push(UpcomingEntry {
        patient_id: appt.patient.clone(),
        display_name,
        appointment_uuid: appt.uuid,
        formatted_date: format_date(&appt.scheduled_date)?,
      });
    }
    Ok(entries)
  }

  /// The detail panel for one patient; `None` when the id is unknown.
  pub async fn patient_detail(
    &self,
    patient_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<PatientDetail>> {
    let Some(patient) = self
      .store
      .find_patient(patient_id)
      .await
      .map_err(Error::store)?
    else {
      return Ok(None);
    };

    let appointment = self
      .store
      .find_latest_appointment(&patient.id)
      .await
      .map_err(Error::store)?;

    let appointment = match appointment {
      Some(appt) => {
        let status = self.status.classify_appointment(&appt, now)?;
        let report = self
          .store
          .find_report(appt.uuid)
          .await
          .map_err(Error::store)?;
        Some(AppointmentView {
          uuid:              appt.uuid,
          formatted_date:    format_date(&appt.scheduled_date)?,
          status,
          status_color:      status.color().to_owned(),
          messages_sent:     messages_sent(&appt)?,
          assessment:        AssessmentStatus::from_report(report.as_ref()),
          follow_up_allowed: status == self.eligible
            && patient
              .canonical_phone()
              .is_some_and(|p| to_e164_us(p).is_ok()),
          scheduled_date:    appt.scheduled_date,
          reason:            appt.reason,
        })
      }
      None => None,
    };

    Ok(Some(PatientDetail {
      display_name: patient.display_name(),
      phone: phone_display(&patient),
      appointment,
      id: patient.id,
      first_name: patient.first_name,
      last_name: patient.last_name,
    }))
  }

  /// Look up the patient's latest appointment, classify it, and hand it to
  /// the dispatcher.
  pub async fn follow_up<T>(
    &self,
    dispatcher: &Dispatcher<S, T>,
    patient_id: &str,
    now: DateTime<Utc>,
  ) -> Result<FollowUp>
  where
    T: MessagingTransport,
  {
    let Some(patient) = self
      .store
      .find_patient(patient_id)
      .await
      .map_err(Error::store)?
    else {
      return Ok(FollowUp::UnknownPatient);
    };
    let Some(appt) = self
      .store
      .find_latest_appointment(&patient.id)
      .await
      .map_err(Error::store)?
    else {
      return Ok(FollowUp::NoAppointment);
    };

    let status = self.status.classify_appointment(&appt, now)?;
    let outcome = dispatcher.attempt_send(&patient, &appt, status).await?;
    Ok(FollowUp::Attempted(outcome))
  }
}

fn phone_display(patient: &Patient) -> Option<PhoneDisplay> {
  let raw = patient.canonical_phone()?;
  Some(PhoneDisplay {
    raw:       raw.to_owned(),
    formatted: format_phone(raw).ok(),
    tel_link:  tel_link(raw).ok(),
  })
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::{
    dispatch::SendPolicy,
    model::Report,
    testing::{MemoryStore, RecordingTransport, appointment, patient},
  };

  fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-10T16:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  fn dashboard(store: MemoryStore) -> Dashboard<MemoryStore> {
    Dashboard::new(
      Arc::new(store),
      StatusPolicy::default(),
      AppointmentStatus::Upcoming,
    )
  }

  #[tokio::test]
  async fn options_are_sorted_by_display_name() {
    let store = MemoryStore::default()
      .with_patient(patient("3", "Zora", "Neale", &[]))
      .with_patient(patient("1", "Ada", "Lovelace", &[]))
      .with_patient(patient("4", "Ada", "Byron", &[]))
      .with_patient(patient("2", "Ada", "Lovelace", &[]));

    let names: Vec<(String, String)> = dashboard(store)
      .patient_options()
      .await
      .unwrap()
      .into_iter()
      .map(|o| (o.display_name, o.id))
      .collect();

    assert_eq!(
      names,
      vec![
        ("Ada Byron".into(), "4".into()),
        ("Ada Lovelace".into(), "1".into()),
        ("Ada Lovelace".into(), "2".into()),
        ("Zora Neale".into(), "3".into()),
      ]
    );
  }

  #[tokio::test]
  async fn upcoming_lists_soonest_first_and_tolerates_missing_patients() {
    let later = appointment("p-1", "2025-06-12T10:00:00Z");
    let sooner = appointment("p-gone", "2025-06-11T09:30:00Z");
    let past = appointment("p-1", "2025-06-01T10:00:00Z");
    let store = MemoryStore::default()
      .with_patient(patient("p-1", "Ada", "Lovelace", &[]))
      .with_appointment(later.clone())
      .with_appointment(past)
      .with_appointment(sooner.clone());

    let entries = dashboard(store).upcoming(now(), 10).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].appointment_uuid, sooner.uuid);
    assert_eq!(entries[0].display_name, UNKNOWN_PATIENT);
    assert_eq!(entries[0].formatted_date, "June 11, 2025 at 9:30AM");
    assert_eq!(entries[1].appointment_uuid, later.uuid);
    assert_eq!(entries[1].display_name, "Ada Lovelace");
  }

  #[tokio::test]
  async fn upcoming_respects_limit() {
    let mut store = MemoryStore::default();
    for day in 11..20 {
      store = store.with_appointment(appointment("p-1", &format!("2025-06-{day}T10:00:00Z")));
    }
    let entries = dashboard(store).upcoming(now(), 3).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].formatted_date, "June 11, 2025 at 10:00AM");
  }

  #[tokio::test]
  async fn detail_shows_latest_appointment() {
    let old = appointment("p-1", "2025-05-01T10:00:00Z");
    let mut latest = appointment("p-1", &(now() - Duration::hours(1)).to_rfc3339());
    latest.counter = 3;
    latest.test_message_counter = 1;
    let store = MemoryStore::default()
      .with_patient(patient("p-1", "Ada", "Lovelace", &["(404) 555-0123"]))
      .with_appointment(old)
      .with_appointment(latest.clone())
      .with_report(Report { patient_uuid: latest.uuid, upload_status: "complete".into() });

    let detail = dashboard(store)
      .patient_detail("p-1", now())
      .await
      .unwrap()
      .unwrap();

    assert_eq!(detail.display_name, "Ada Lovelace");
    let phone = detail.phone.unwrap();
    assert_eq!(phone.formatted.as_deref(), Some("404-555-0123"));
    assert_eq!(phone.tel_link.as_deref(), Some("tel:4045550123"));

    let appt = detail.appointment.unwrap();
    assert_eq!(appt.uuid, latest.uuid);
    assert_eq!(appt.status, AppointmentStatus::Upcoming);
    assert_eq!(appt.status_color, "green");
    assert_eq!(appt.messages_sent, 4);
    assert_eq!(appt.assessment, AssessmentStatus::Complete);
    assert!(appt.follow_up_allowed);
  }

  #[tokio::test]
  async fn detail_without_phone_or_appointment() {
    let store = MemoryStore::default().with_patient(patient("p-1", "Ada", "Lovelace", &[]));
    let detail = dashboard(store)
      .patient_detail("p-1", now())
      .await
      .unwrap()
      .unwrap();
    assert!(detail.phone.is_none());
    assert!(detail.appointment.is_none());
  }

  #[tokio::test]
  async fn detail_for_unknown_patient_is_none() {
    let detail = dashboard(MemoryStore::default())
      .patient_detail("nobody", now())
      .await
      .unwrap();
    assert!(detail.is_none());
  }

  #[tokio::test]
  async fn past_appointment_disallows_follow_up() {
    let appt = appointment("p-1", &(now() - Duration::hours(5)).to_rfc3339());
    let store = MemoryStore::default()
      .with_patient(patient("p-1", "Ada", "Lovelace", &["4045550123"]))
      .with_appointment(appt);
    let view = dashboard(store)
      .patient_detail("p-1", now())
      .await
      .unwrap()
      .unwrap()
      .appointment
      .unwrap();
    assert_eq!(view.status, AppointmentStatus::Past);
    assert_eq!(view.status_color, "red");
    assert_eq!(view.assessment, AssessmentStatus::NotAvailable);
    assert!(!view.follow_up_allowed);
  }

  #[tokio::test]
  async fn follow_up_by_patient_id() {
    let appt = appointment("p-1", "2025-06-11T10:00:00Z");
    let store = MemoryStore::default()
      .with_patient(patient("p-1", "Ada", "Lovelace", &["4045550123"]))
      .with_patient(patient("p-2", "Grace", "Hopper", &["4045550000"]))
      .with_appointment(appt.clone());
    let dash = dashboard(store);
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Dispatcher::new(
      Arc::clone(&dash.store),
      Arc::clone(&transport),
      SendPolicy {
        eligible:       AppointmentStatus::Upcoming,
        link_base_url:  "https://forms.example.org".into(),
        clinic_name:    "PrimeCare of Georgia".into(),
        test_recipient: None,
      },
    );

    assert_eq!(
      dash.follow_up(&dispatcher, "nobody", now()).await.unwrap(),
      FollowUp::UnknownPatient
    );
    assert_eq!(
      dash.follow_up(&dispatcher, "p-2", now()).await.unwrap(),
      FollowUp::NoAppointment
    );
    let FollowUp::Attempted(SendOutcome::Sent(receipt)) =
      dash.follow_up(&dispatcher, "p-1", now()).await.unwrap()
    else {
      panic!("expected a sent follow-up");
    };
    assert_eq!(receipt.appointment_uuid, appt.uuid);
    assert_eq!(dash.store.appointment(appt.uuid).unwrap().test_message_counter, 1);
  }
}
