//! Follow-up text dispatch: who may be texted, what they get, and how the
//! send is recorded.
//!
//! The ordering is fixed: check eligibility, send, then count. The counter
//! is only touched after the provider has accepted the message, so a failed
//! or refused send leaves the appointment exactly as it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  Result,
  counter::record_test_send,
  format::to_e164_us,
  model::{Appointment, Patient},
  status::AppointmentStatus,
  store::AppointmentStore,
  transport::{MessagingTransport, TransportError},
};

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPolicy {
  /// The one status in which a follow-up may be sent.
  pub eligible:       AppointmentStatus,
  /// Patient-facing form site; the appointment uuid is appended as a path
  /// segment.
  pub link_base_url:  String,
  /// Clinic name as it appears in the message greeting.
  pub clinic_name:    String,
  /// When set, every message goes to this number instead of the patient.
  pub test_recipient: Option<String>,
}

impl SendPolicy {
  pub fn form_link(&self, appointment_uuid: Uuid) -> String {
    format!(
      "{}/{}",
      self.link_base_url.trim_end_matches('/'),
      appointment_uuid
    )
  }

  pub fn message_body(&self, first_name: &str, appointment_uuid: Uuid) -> String {
    format!(
      "Hi {first_name}, this is {clinic}. Your appointment is coming up soon. \
       Please click the blue highlighted link below to fill out a mandatory \
       5-minute form before your visit.\n{link}",
      clinic = self.clinic_name,
      link = self.form_link(appointment_uuid),
    )
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Why a follow-up was refused before reaching the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
  WrongStatus {
    status:   AppointmentStatus,
    eligible: AppointmentStatus,
  },
  NoPhone,
  /// The canonical phone entry has no digits in it.
  InvalidPhone,
}

impl DenialReason {
  pub fn code(&self) -> &'static str {
    match self {
      Self::WrongStatus { .. } => "wrong_status",
      Self::NoPhone => "no_phone",
      Self::InvalidPhone => "invalid_phone",
    }
  }
}

impl std::fmt::Display for DenialReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::WrongStatus { status, eligible } => write!(
        f,
        "follow-ups are only sent for {eligible} appointments; this one is {status}"
      ),
      Self::NoPhone => f.write_str("patient has no phone number on file"),
      Self::InvalidPhone => f.write_str("patient's phone number has no digits"),
    }
  }
}

/// Record of an accepted send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
  pub appointment_uuid: Uuid,
  pub to:               String,
  pub message_id:       String,
  pub delivery_status:  String,
  pub sent_at:          Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SendOutcome {
  Sent(SendReceipt),
  Denied(DenialReason),
  Failed(TransportError),
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Gates and performs follow-up sends.
///
/// Cheap to clone; the store and transport are shared.
pub struct Dispatcher<A, T> {
  appointments: Arc<A>,
  transport:    Arc<T>,
  policy:       SendPolicy,
}

impl<A, T> Clone for Dispatcher<A, T> {
  fn clone(&self) -> Self {
    Self {
      appointments: Arc::clone(&self.appointments),
      transport:    Arc::clone(&self.transport),
      policy:       self.policy.clone(),
    }
  }
}

impl<A, T> Dispatcher<A, T>
where
  A: AppointmentStore,
  T: MessagingTransport,
{
  pub fn new(appointments: Arc<A>, transport: Arc<T>, policy: SendPolicy) -> Self {
    Self { appointments, transport, policy }
  }

  pub fn policy(&self) -> &SendPolicy { &self.policy }

  /// Decide whether a send may go ahead and, if so, to which number.
  pub fn check(
    &self,
    patient: &Patient,
    status: AppointmentStatus,
  ) -> Result<String, DenialReason> {
    if status != self.policy.eligible {
      return Err(DenialReason::WrongStatus {
        status,
        eligible: self.policy.eligible,
      });
    }
    let phone = patient.canonical_phone().ok_or(DenialReason::NoPhone)?;
    let patient_number = to_e164_us(phone).map_err(|_| DenialReason::InvalidPhone)?;
    Ok(
      self
        .policy
        .test_recipient
        .clone()
        .unwrap_or(patient_number),
    )
  }

  /// Send the follow-up text for `appointment`.
  ///
  /// `Denied` and `Failed` are ordinary outcomes. `Err` is reserved for the
  /// store failing to record a send the provider already accepted.
  pub async fn attempt_send(
    &self,
    patient: &Patient,
    appointment: &Appointment,
    status: AppointmentStatus,
  ) -> Result<SendOutcome> {
    let to = match self.check(patient, status) {
      Ok(to) => to,
      Err(reason) => {
        info!(
          patient = %patient.id,
          appointment = %appointment.uuid,
          reason = reason.code(),
          "follow-up denied"
        );
        return Ok(SendOutcome::Denied(reason));
      }
    };

    let body = self
      .policy
      .message_body(&patient.first_name, appointment.uuid);

    let sent = match self.transport.send(&to, &body).await {
      Ok(sent) => sent,
      Err(e) => {
        warn!(
          patient = %patient.id,
          appointment = %appointment.uuid,
          error = %e,
          "follow-up send failed"
        );
        return Ok(SendOutcome::Failed(e));
      }
    };

    if let Err(e) = record_test_send(self.appointments.as_ref(), appointment.uuid).await {
      error!(
        appointment = %appointment.uuid,
        message_id = %sent.id,
        error = %e,
        "follow-up was sent but could not be counted"
      );
      return Err(e);
    }

    info!(
      patient = %patient.id,
      appointment = %appointment.uuid,
      message_id = %sent.id,
      status = %sent.status,
      "follow-up sent"
    );

    Ok(SendOutcome::Sent(SendReceipt {
      appointment_uuid: appointment.uuid,
      to,
      message_id: sent.id,
      delivery_status: sent.status,
      sent_at: sent.sent_at,
    }))
  }
}
