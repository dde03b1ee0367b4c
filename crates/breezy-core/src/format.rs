//! Display formatting for stored timestamps and phone numbers.
//!
//! Stored timestamps come from several generations of the intake pipeline:
//! some carry `Z`, some a numeric offset, some nothing at all. Everything here
//! goes through [`parse_timestamp`] so the formatter and the status engine
//! agree on what a string means.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::FormatError;

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// A stored `scheduled_date`, before any timezone policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
  /// Carried a `Z` or a numeric offset: an exact instant.
  Absolute(DateTime<FixedOffset>),
  /// No offset: a wall-clock reading whose zone is decided by the caller.
  Naive(NaiveDateTime),
}

impl ParsedTimestamp {
  /// The wall-clock reading as written, ignoring any offset.
  pub fn wall_clock(&self) -> NaiveDateTime {
    match self {
      Self::Absolute(dt) => dt.naive_local(),
      Self::Naive(dt) => *dt,
    }
  }
}

const OFFSET_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f%:z",
  "%Y-%m-%dT%H:%M%:z",
  "%Y-%m-%d %H:%M:%S%.f%:z",
  "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp. A trailing `Z` is read as `+00:00`; a bare
/// date is read as midnight.
pub fn parse_timestamp(input: &str) -> Result<ParsedTimestamp, FormatError> {
  let trimmed = input.trim();
  let zulu = trimmed
    .strip_suffix('Z')
    .or_else(|| trimmed.strip_suffix('z'));
  let normalised = match zulu {
    Some(rest) => format!("{rest}+00:00"),
    None => trimmed.to_owned(),
  };

  for fmt in OFFSET_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(&normalised, fmt) {
      return Ok(ParsedTimestamp::Absolute(dt));
    }
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(&normalised, fmt) {
      return Ok(ParsedTimestamp::Naive(dt));
    }
  }
  if let Ok(date) = NaiveDate::parse_from_str(&normalised, "%Y-%m-%d") {
    return Ok(ParsedTimestamp::Naive(date.and_time(chrono::NaiveTime::MIN)));
  }

  Err(FormatError::InvalidTimestamp {
    input:  input.to_owned(),
    reason: "not an ISO-8601 date-time".to_owned(),
  })
}

/// Render a stored timestamp as `"March 5, 2025 at 9:07AM"`.
///
/// The wall-clock time is shown as written; no zone conversion happens here.
/// Day and hour never carry a leading zero, minutes always have two digits.
pub fn format_date(timestamp: &str) -> Result<String, FormatError> {
  let parsed = parse_timestamp(timestamp)?;
  Ok(
    parsed
      .wall_clock()
      .format("%B %-d, %Y at %-I:%M%p")
      .to_string(),
  )
}

// ─── Phone numbers ───────────────────────────────────────────────────────────

fn digits_of(raw: &str) -> Result<String, FormatError> {
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
  if digits.is_empty() {
    return Err(FormatError::NoDigits(raw.to_owned()));
  }
  Ok(digits)
}

/// Render a stored phone number as `DDD-DDD-DDDD`.
///
/// Length is not validated: short or long digit strings are split at the same
/// positions, so `"12345"` becomes `"123-45-"`.
pub fn format_phone(raw: &str) -> Result<String, FormatError> {
  let digits = digits_of(raw)?;
  let len = digits.len();
  let (a, b) = (len.min(3), len.min(6));
  Ok(format!("{}-{}-{}", &digits[..a], &digits[a..b], &digits[b..]))
}

/// `tel:` URI for a click-to-call link.
pub fn tel_link(raw: &str) -> Result<String, FormatError> {
  Ok(format!("tel:{}", digits_of(raw)?))
}

/// E.164 form for a US number: `+1` followed by the digits.
///
/// A number already written with its leading country code (`1-404-…`) is not
/// prefixed twice.
pub fn to_e164_us(raw: &str) -> Result<String, FormatError> {
  let digits = digits_of(raw)?;
  match digits.strip_prefix('1') {
    Some(national) if digits.len() == 11 => Ok(format!("+1{national}")),
    _ => Ok(format!("+1{digits}")),
  }
}
