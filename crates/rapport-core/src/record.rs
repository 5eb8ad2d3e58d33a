//! Normalised records handed over by the source producers.
//!
//! A producer reads one export format and emits a [`SourceBatch`]: the
//! identities it saw, the messages exchanged between them (by `id_string`),
//! and a tally of what it had to throw away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, normalize::parse_timestamp};

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// A point in time as the source wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SourceTime {
  /// ISO-8601 or another textual format understood by [`parse_timestamp`].
  Text(String),
  /// Milliseconds since the Unix epoch.
  EpochMillis(i64),
}

impl SourceTime {
  /// Resolve to a canonical UTC instant.
  pub fn resolve(&self) -> Result<DateTime<Utc>> {
    match self {
      SourceTime::Text(s) => parse_timestamp(s),
      SourceTime::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms)
        .ok_or(crate::Error::TimestampOutOfRange(*ms)),
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One identity as seen by a producer, on the batch's platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
  pub id_string:    String,
  pub display_name: Option<String>,
}

impl IdentityRecord {
  pub fn new(id_string: impl Into<String>, display_name: impl Into<String>) -> Self {
    let display_name: String = display_name.into();
    Self {
      id_string:    id_string.into(),
      display_name: (!display_name.is_empty()).then_some(display_name),
    }
  }
}

/// One message, addressed by the `id_string`s of its two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
  pub sender:    String,
  pub recipient: String,
  pub text:      Option<String>,
  pub timestamp: SourceTime,
}

/// One field of one contact-card row, e.g. `("Jane Doe", "phone_1",
/// "tel:+15551234567")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
  pub name:        String,
  pub field_key:   String,
  pub field_value: String,
}

impl From<ContactRecord> for IdentityRecord {
  fn from(c: ContactRecord) -> Self {
    IdentityRecord::new(c.field_value, c.name)
  }
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// What a producer discarded before anything reached the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTally {
  /// Files or rows read.
  pub files:         usize,
  /// Records missing a required field.
  pub malformed:     usize,
  /// Threads matching none of the recognised categories.
  pub unknown:       usize,
  /// Multi-party threads, not imported.
  pub group_threads: usize,
  /// Call log entries (voicemail, missed, placed, received) carry no text.
  pub call_records:  usize,
}

impl std::ops::AddAssign for SourceTally {
  fn add_assign(&mut self, rhs: Self) {
    self.files += rhs.files;
    self.malformed += rhs.malformed;
    self.unknown += rhs.unknown;
    self.group_threads += rhs.group_threads;
    self.call_records += rhs.call_records;
  }
}

/// Everything one producer extracted from one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceBatch {
  pub platform:   String,
  pub identities: Vec<IdentityRecord>,
  pub messages:   Vec<MessageRecord>,
  pub tally:      SourceTally,
}

impl SourceBatch {
  pub fn new(platform: impl Into<String>) -> Self {
    Self { platform: platform.into(), ..Default::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn epoch_millis_resolve() {
    let t = SourceTime::EpochMillis(1_583_064_000_000).resolve().unwrap();
    assert_eq!(t.to_rfc3339(), "2020-03-01T12:00:00+00:00");
  }

  #[test]
  fn contact_becomes_identity() {
    let id: IdentityRecord = ContactRecord {
      name:        "Jane Doe".into(),
      field_key:   "email_1".into(),
      field_value: "jane@example.com".into(),
    }
    .into();
    assert_eq!(id.id_string, "jane@example.com");
    assert_eq!(id.display_name.as_deref(), Some("Jane Doe"));
  }

  #[test]
  fn empty_display_name_is_none() {
    assert!(IdentityRecord::new("x", "").display_name.is_none());
  }
}
