//! JSON snapshots of intake data, for seeding a store.

use std::path::Path;

use breezy_core::model::{Appointment, Patient, Report};
use serde::{Deserialize, Serialize};

use crate::Result;

/// The three collections intake maintains, as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
  #[serde(default)]
  pub patients:     Vec<Patient>,
  #[serde(default)]
  pub appointments: Vec<Appointment>,
  #[serde(default)]
  pub reports:      Vec<Report>,
}

impl Fixture {
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
  }
}
