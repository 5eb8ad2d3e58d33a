//! The four persisted entity kinds: platforms, identities, people, messages.
//!
//! Identities are the unit of ingestion; people only exist once the
//! [`Resolver`](crate::resolver::Resolver) has linked identities to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ─── Platform ────────────────────────────────────────────────────────────────

/// A communication service or data source, e.g. "Google Voice".
///
/// Platform names are unique; a platform is never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
  pub platform_id: Uuid,
  pub name:        String,
  pub created_at:  DateTime<Utc>,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// "This person, as known on this platform": a phone number, screen name or
/// email address.
///
/// There is at most one identity per `(platform_id, id_string)`; the same
/// `id_string` may appear on several platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:  Uuid,
  pub platform_id:  Uuid,
  pub id_string:    String,
  pub display_name: Option<String>,
  /// `None` until the resolver links the identity to a [`Person`].
  pub person_id:    Option<Uuid>,
}

impl Identity {
  pub fn is_linked(&self) -> bool { self.person_id.is_some() }

  /// The display name, or `""` when none was recorded.
  pub fn display_name(&self) -> &str { self.display_name.as_deref().unwrap_or("") }
}

/// Input to [`MessageStore::add_identity`](crate::store::MessageStore::add_identity).
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub platform_id:  Uuid,
  pub id_string:    String,
  pub display_name: Option<String>,
}

impl NewIdentity {
  /// Empty or whitespace-only display names are stored as `None`.
  pub fn new(
    platform_id: Uuid,
    id_string: impl Into<String>,
    display_name: Option<String>,
  ) -> Self {
    Self {
      platform_id,
      id_string: id_string.into(),
      display_name: display_name.filter(|n| !n.trim().is_empty()),
    }
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A resolved real individual; the merge target of one or more identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:  Uuid,
  pub name:       String,
  /// Marks the archive owner.
  pub is_self:    bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPerson {
  pub name:    String,
  pub is_self: bool,
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// A directed communication event between two identities. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message_id:   Uuid,
  pub sender_id:    Uuid,
  /// Equal to `sender_id` for self-sent or single-party threads.
  pub recipient_id: Uuid,
  pub text:         Option<String>,
  pub timestamp:    DateTime<Utc>,
  pub fingerprint:  String,
}

/// Input to [`MessageStore::add_message`](crate::store::MessageStore::add_message).
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub sender_id:    Uuid,
  pub recipient_id: Uuid,
  pub text:         Option<String>,
  pub timestamp:    DateTime<Utc>,
}

impl NewMessage {
  /// SHA-256 over sender, recipient, timestamp and text, hex encoded.
  ///
  /// Two ingestions of the same export line produce the same fingerprint.
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.sender_id.as_bytes());
    hasher.update(self.recipient_id.as_bytes());
    hasher.update(self.timestamp.timestamp_millis().to_be_bytes());
    match &self.text {
      Some(text) => {
        hasher.update([1u8]);
        hasher.update(text.as_bytes());
      }
      None => hasher.update([0u8]),
    }
    hex::encode(hasher.finalize())
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn message(text: Option<&str>) -> NewMessage {
    NewMessage {
      sender_id:    Uuid::from_u128(1),
      recipient_id: Uuid::from_u128(2),
      text:         text.map(str::to_owned),
      timestamp:    Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap(),
    }
  }

  #[test]
  fn blank_display_name_is_none() {
    let id = NewIdentity::new(Uuid::nil(), "tel:+15551234567", Some("  ".into()));
    assert!(id.display_name.is_none());

    let id = NewIdentity::new(Uuid::nil(), "tel:+15551234567", Some("Jane".into()));
    assert_eq!(id.display_name.as_deref(), Some("Jane"));
  }

  #[test]
  fn fingerprint_is_stable_and_content_sensitive() {
    assert_eq!(message(Some("hi")).fingerprint(), message(Some("hi")).fingerprint());
    assert_ne!(message(Some("hi")).fingerprint(), message(Some("hey")).fingerprint());
    assert_ne!(message(None).fingerprint(), message(Some("")).fingerprint());
    assert_eq!(message(None).fingerprint().len(), 64);
  }
}
