//! Upcoming/Past classification of appointments.
//!
//! A stored `scheduled_date` is read as follows:
//!
//! - with `Z` or a numeric offset: that exact instant;
//! - without an offset: a wall-clock time in the clinic's timezone.
//!
//! The appointment stays [`AppointmentStatus::Upcoming`] until the grace
//! window after its start has fully elapsed, so a visit that runs long is
//! not flipped to `Past` while the patient is still in the building.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  error::FormatError,
  format::{ParsedTimestamp, parse_timestamp},
  model::Appointment,
};

/// Default clinic timezone.
pub const DEFAULT_CLINIC_TZ: Tz = chrono_tz::America::New_York;

/// Default grace window, in minutes.
pub const DEFAULT_GRACE_MINUTES: i64 = 4 * 60;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
  Upcoming,
  Past,
}

impl AppointmentStatus {
  pub fn label(self) -> &'static str {
    match self {
      Self::Upcoming => "Upcoming",
      Self::Past => "Past",
    }
  }

  /// Presentation colour used by every UI.
  pub fn color(self) -> &'static str {
    match self {
      Self::Upcoming => "green",
      Self::Past => "red",
    }
  }
}

impl std::fmt::Display for AppointmentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
  /// Zone in which offset-less timestamps were authored.
  pub clinic_tz: Tz,
  /// Time after the scheduled start during which the appointment is still
  /// `Upcoming`.
  pub grace:     Duration,
}

impl Default for StatusPolicy {
  fn default() -> Self {
    Self {
      clinic_tz: DEFAULT_CLINIC_TZ,
      grace:     Duration::minutes(DEFAULT_GRACE_MINUTES),
    }
  }
}

impl StatusPolicy {
  /// Build a policy from configuration values.
  pub fn new(clinic_tz: &str, grace_minutes: i64) -> Result<Self, Error> {
    let clinic_tz = clinic_tz
      .parse::<Tz>()
      .map_err(|_| Error::UnknownTimezone(clinic_tz.to_owned()))?;
    Ok(Self { clinic_tz, grace: Duration::minutes(grace_minutes) })
  }

  /// The instant a stored `scheduled_date` refers to.
  pub fn scheduled_instant(&self, scheduled_date: &str) -> Result<DateTime<Utc>, FormatError> {
    Ok(match parse_timestamp(scheduled_date)? {
      ParsedTimestamp::Absolute(dt) => dt.with_timezone(&Utc),
      ParsedTimestamp::Naive(naive) => self.localise(naive),
    })
  }

  /// Resolve a clinic wall-clock time. On the fall-back day the earlier of
  /// the two instants wins; a time inside the spring-forward gap is read with
  /// the offset in force before the gap.
  fn localise(&self, naive: NaiveDateTime) -> DateTime<Utc> {
    let local = match self.clinic_tz.from_local_datetime(&naive) {
      LocalResult::Single(dt) => Some(dt),
      LocalResult::Ambiguous(earliest, _) => Some(earliest),
      LocalResult::None => self
        .clinic_tz
        .from_local_datetime(&(naive + Duration::hours(1)))
        .earliest(),
    };
    match local {
      Some(dt) => dt.with_timezone(&Utc),
      None => Utc.from_utc_datetime(&naive),
    }
  }

  /// `Upcoming` iff `now < scheduled + grace`.
  pub fn classify(
    &self,
    scheduled_date: &str,
    now: DateTime<Utc>,
  ) -> Result<AppointmentStatus, FormatError> {
    let cutoff = self.scheduled_instant(scheduled_date)? + self.grace;
    Ok(if now < cutoff {
      AppointmentStatus::Upcoming
    } else {
      AppointmentStatus::Past
    })
  }

  pub fn classify_appointment(
    &self,
    appointment: &Appointment,
    now: DateTime<Utc>,
  ) -> Result<AppointmentStatus, FormatError> {
    self.classify(&appointment.scheduled_date, now)
  }
}
