//! Normalisation rules shared by producers and the resolver: the
//! name-plausibility test, canonical phone ids and timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{Error, Result};

// ─── Names ───────────────────────────────────────────────────────────────────

/// Punctuation allowed in a human name besides letters and whitespace.
const NAME_PUNCTUATION: &[char] = &['.', '(', ')', '-'];

/// Whether `name` looks like a human name rather than a phone number,
/// handle or email address.
///
/// Only alphabetic characters, whitespace and `.` `(` `)` `-` are accepted;
/// the empty string is rejected.
pub fn is_plausible_name(name: &str) -> bool {
  !name.trim().is_empty()
    && name
      .chars()
      .all(|c| c.is_alphabetic() || c.is_whitespace() || NAME_PUNCTUATION.contains(&c))
}

// ─── Phones ──────────────────────────────────────────────────────────────────

/// Canonicalise a phone number to the `tel:+<digits>` form used by the
/// Google Voice export, so contacts and call logs share an `id_string`.
///
/// Ten digits are taken to be a North American number and get a `1` country
/// code. Fewer than ten digits cannot be canonicalised and yield `None`.
pub fn normalize_phone(raw: &str) -> Option<String> {
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
  match digits.len() {
    10 => Some(format!("tel:+1{digits}")),
    n if n > 10 => Some(format!("tel:+{digits}")),
    _ => None,
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
];

/// Parse a source timestamp into UTC.
///
/// Accepts RFC 3339, ISO-8601 with a space separator and numeric offset, and
/// the same forms without an offset (taken as UTC). A bare date is midnight
/// UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
  let s = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  for fmt in OFFSET_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
      return Ok(dt.with_timezone(&Utc));
    }
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Ok(dt.and_utc());
    }
  }
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
  }

  Err(Error::InvalidTimestamp(raw.to_owned()))
}
