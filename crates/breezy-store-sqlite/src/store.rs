//! [`SqliteStore`] — the SQLite implementation of the Breezy store traits.

use std::path::Path;

use breezy_core::{
  model::{Appointment, Patient, Report},
  status::StatusPolicy,
  store::{AppointmentStore, Directory, ReportStore},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::info;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    APPOINTMENT_COLUMNS, PATIENT_COLUMNS, RawAppointment, RawPatient, RawReport, encode_dt,
    encode_phones, encode_uuid,
  },
  fixture::Fixture,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The clinic's records backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  /// Used to place offset-less `scheduled_date`s on the timeline at write
  /// time, so ordering queries stay in SQL.
  status: StatusPolicy,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// Writes use the default clinic zone until [`Self::with_status_policy`]
  /// is applied.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, status: StatusPolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, status: StatusPolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Resolve offset-less timestamps with `policy` instead of the default
  /// clinic zone.
  ///
  /// The zone behind the stored `scheduled_at` column is recorded in the
  /// database. When it differs from `policy.clinic_tz` every appointment is
  /// re-resolved, so ordering and the upcoming filter follow the new zone.
  pub async fn with_status_policy(mut self, policy: StatusPolicy) -> Result<Self> {
    self.status = policy;
    let zone = policy.clinic_tz.name();

    let recorded: Option<String> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM store_meta WHERE key = 'clinic_timezone'",
              [],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    if recorded.as_deref() == Some(zone) {
      return Ok(self);
    }

    let stored: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT uuid, scheduled_date FROM appointments")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let resolved = stored
      .into_iter()
      .map(|(uuid, date)| -> Result<(String, String)> {
        Ok((uuid, encode_dt(policy.scheduled_instant(&date)?)))
      })
      .collect::<Result<Vec<_>>>()?;
    let count = resolved.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt =
            tx.prepare("UPDATE appointments SET scheduled_at = ?2 WHERE uuid = ?1")?;
          for (uuid, at) in &resolved {
            stmt.execute(rusqlite::params![uuid, at])?;
          }
        }
        tx.execute(
          "INSERT INTO store_meta (key, value) VALUES ('clinic_timezone', ?1)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![zone],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!(
      from = recorded.as_deref().unwrap_or("none"),
      to = zone,
      appointments = count,
      "clinic zone recorded; schedule re-resolved"
    );
    Ok(self)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Intake-side writes ──────────────────────────────────────────────────

  /// Insert or replace a patient record.
  pub async fn upsert_patient(&self, patient: &Patient) -> Result<()> {
    let id         = patient.id.clone();
    let first_name = patient.first_name.clone();
    let last_name  = patient.last_name.clone();
    let phones     = encode_phones(&patient.phones)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO patients (patient_id, first_name, last_name, phones)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(patient_id) DO UPDATE SET
             first_name = excluded.first_name,
             last_name  = excluded.last_name,
             phones     = excluded.phones",
          rusqlite::params![id, first_name, last_name, phones],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or update an appointment.
  ///
  /// On update `test_message_counter` keeps its stored value: that column
  /// belongs to the dashboard, not to intake.
  pub async fn upsert_appointment(&self, appointment: &Appointment) -> Result<()> {
    let scheduled_at   = encode_dt(self.status.scheduled_instant(&appointment.scheduled_date)?);
    let uuid_str       = encode_uuid(appointment.uuid);
    let patient_id     = appointment.patient.clone();
    let scheduled_date = appointment.scheduled_date.clone();
    let reason         = appointment.reason.clone();
    let counter        = appointment.counter;
    let test_counter   = appointment.test_message_counter;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO appointments (
             uuid, patient_id, scheduled_date, scheduled_at,
             reason, counter, test_message_counter
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(uuid) DO UPDATE SET
             patient_id     = excluded.patient_id,
             scheduled_date = excluded.scheduled_date,
             scheduled_at   = excluded.scheduled_at,
             reason         = excluded.reason,
             counter        = excluded.counter",
          rusqlite::params![
            uuid_str,
            patient_id,
            scheduled_date,
            scheduled_at,
            reason,
            counter,
            test_counter,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace the report for an appointment.
  pub async fn upsert_report(&self, report: &Report) -> Result<()> {
    let uuid_str      = encode_uuid(report.patient_uuid);
    let upload_status = report.upload_status.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reports (patient_uuid, upload_status) VALUES (?1, ?2)
           ON CONFLICT(patient_uuid) DO UPDATE SET upload_status = excluded.upload_status",
          rusqlite::params![uuid_str, upload_status],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load every record in `fixture`.
  pub async fn import(&self, fixture: &Fixture) -> Result<()> {
    for patient in &fixture.patients {
      self.upsert_patient(patient).await?;
    }
    for appointment in &fixture.appointments {
      self.upsert_appointment(appointment).await?;
    }
    for report in &fixture.reports {
      self.upsert_report(report).await?;
    }
    info!(
      patients = fixture.patients.len(),
      appointments = fixture.appointments.len(),
      reports = fixture.reports.len(),
      "fixture imported"
    );
    Ok(())
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = crate::Error;

  async fn find_patient(&self, id: &str) -> Result<Option<Patient>> {
    let id = id.to_owned();

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?1"),
              rusqlite::params![id],
              RawPatient::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatient::into_patient).transpose()
  }

  async fn list_patients(&self) -> Result<Vec<Patient>> {
    let raws: Vec<RawPatient> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients"))?;
        let rows = stmt
          .query_map([], RawPatient::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPatient::into_patient).collect()
  }
}

// ─── AppointmentStore impl ───────────────────────────────────────────────────

impl AppointmentStore for SqliteStore {
  type Error = crate::Error;

  async fn find_latest_appointment(&self, patient_id: &str) -> Result<Option<Appointment>> {
    let patient_id = patient_id.to_owned();

    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                 WHERE patient_id = ?1
                 ORDER BY scheduled_at DESC
                 LIMIT 1"
              ),
              rusqlite::params![patient_id],
              RawAppointment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn find_appointment(&self, uuid: Uuid) -> Result<Option<Appointment>> {
    let uuid_str = encode_uuid(uuid);

    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE uuid = ?1"),
              rusqlite::params![uuid_str],
              RawAppointment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn list_upcoming(&self, after: DateTime<Utc>, limit: usize) -> Result<Vec<Appointment>> {
    let after_str = encode_dt(after);
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawAppointment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPOINTMENT_COLUMNS} FROM appointments
           WHERE scheduled_at > ?1
           ORDER BY scheduled_at ASC, uuid ASC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![after_str, limit_val], RawAppointment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAppointment::into_appointment).collect()
  }

  async fn update_counter(&self, uuid: Uuid, delta: i64) -> Result<bool> {
    let uuid_str = encode_uuid(uuid);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE appointments
           SET test_message_counter = test_message_counter + ?2
           WHERE uuid = ?1",
          rusqlite::params![uuid_str, delta],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── ReportStore impl ────────────────────────────────────────────────────────

impl ReportStore for SqliteStore {
  type Error = crate::Error;

  async fn find_report(&self, appointment_uuid: Uuid) -> Result<Option<Report>> {
    let uuid_str = encode_uuid(appointment_uuid);

    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT patient_uuid, upload_status FROM reports WHERE patient_uuid = ?1",
              rusqlite::params![uuid_str],
              |row| {
                Ok(RawReport {
                  patient_uuid:  row.get(0)?,
                  upload_status: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReport::into_report).transpose()
  }
}
