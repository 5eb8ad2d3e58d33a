//! Encoding and decoding helpers between rapport domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use rapport_core::{
  entity::{Identity, Person, Platform},
  view::{MessageView, Party},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> { s.map(decode_uuid).transpose() }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPlatform::from_row`].
pub const PLATFORM_COLUMNS: &str = "platform_id, name, created_at";

pub struct RawPlatform {
  pub platform_id: String,
  pub name:        String,
  pub created_at:  String,
}

impl RawPlatform {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      platform_id: row.get(0)?,
      name:        row.get(1)?,
      created_at:  row.get(2)?,
    })
  }

  pub fn into_platform(self) -> Result<Platform> {
    Ok(Platform {
      platform_id: decode_uuid(&self.platform_id)?,
      name:        self.name,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawIdentity::from_row`].
pub const IDENTITY_COLUMNS: &str = "identity_id, platform_id, id_string, display_name, person_id";

pub struct RawIdentity {
  pub identity_id:  String,
  pub platform_id:  String,
  pub id_string:    String,
  pub display_name: Option<String>,
  pub person_id:    Option<String>,
}

impl RawIdentity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:  row.get(0)?,
      platform_id:  row.get(1)?,
      id_string:    row.get(2)?,
      display_name: row.get(3)?,
      person_id:    row.get(4)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:  decode_uuid(&self.identity_id)?,
      platform_id:  decode_uuid(&self.platform_id)?,
      id_string:    self.id_string,
      display_name: self.display_name,
      person_id:    decode_opt_uuid(self.person_id.as_deref())?,
    })
  }
}

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "person_id, name, is_self, created_at";

pub struct RawPerson {
  pub person_id:  String,
  pub name:       String,
  pub is_self:    bool,
  pub created_at: String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:  row.get(0)?,
      name:       row.get(1)?,
      is_self:    row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:  decode_uuid(&self.person_id)?,
      name:       self.name,
      is_self:    self.is_self,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// One side of a message as returned by the view join.
pub struct RawParty {
  pub identity_id:  String,
  pub id_string:    String,
  pub display_name: Option<String>,
  pub person_id:    Option<String>,
  pub person_name:  Option<String>,
  pub is_self:      Option<bool>,
}

impl RawParty {
  /// Read six consecutive columns starting at `at`.
  pub fn from_row(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:  row.get(at)?,
      id_string:    row.get(at + 1)?,
      display_name: row.get(at + 2)?,
      person_id:    row.get(at + 3)?,
      person_name:  row.get(at + 4)?,
      is_self:      row.get(at + 5)?,
    })
  }

  fn into_party(self) -> Result<Party> {
    Ok(Party {
      identity_id:  decode_uuid(&self.identity_id)?,
      id_string:    self.id_string,
      display_name: self.display_name,
      person_id:    decode_opt_uuid(self.person_id.as_deref())?,
      person_name:  self.person_name,
      is_self:      self.is_self.unwrap_or(false),
    })
  }
}

/// A row of the message view join.
pub struct RawMessageView {
  pub message_id: String,
  pub platform:   String,
  pub timestamp:  String,
  pub text:       Option<String>,
  pub sender:     RawParty,
  pub recipient:  RawParty,
}

impl RawMessageView {
  pub fn into_view(self) -> Result<MessageView> {
    Ok(MessageView {
      message_id: decode_uuid(&self.message_id)?,
      platform:   self.platform,
      timestamp:  decode_dt(&self.timestamp)?,
      text:       self.text,
      sender:     self.sender.into_party()?,
      recipient:  self.recipient.into_party()?,
    })
  }
}
