//! SQL schema for the Breezy SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS patients (
    patient_id  TEXT PRIMARY KEY,       -- external id assigned by intake
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    phones      TEXT NOT NULL DEFAULT '[]'  -- JSON array, canonical first
);

-- No foreign key on patient_id: intake may book before the patient record
-- lands, and the dashboard renders such rows as an unknown patient.
CREATE TABLE IF NOT EXISTS appointments (
    uuid                 TEXT PRIMARY KEY,
    patient_id           TEXT NOT NULL,
    scheduled_date       TEXT NOT NULL,   -- as written by intake
    scheduled_at         TEXT NOT NULL,   -- resolved UTC instant, fixed-width RFC 3339
    reason               TEXT NOT NULL DEFAULT '',
    counter              INTEGER NOT NULL DEFAULT 5,
    test_message_counter INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reports (
    patient_uuid  TEXT PRIMARY KEY,   -- appointments.uuid
    upload_status TEXT NOT NULL
);

-- clinic_timezone: the zone offset-less scheduled_date values were resolved
-- with when scheduled_at was written.
CREATE TABLE IF NOT EXISTS store_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS appointments_patient_idx   ON appointments(patient_id, scheduled_at);
CREATE INDEX IF NOT EXISTS appointments_scheduled_idx ON appointments(scheduled_at);

PRAGMA user_version = 1;
";
