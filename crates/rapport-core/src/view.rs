//! Read models for the export stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One side of a message, with its identity and (if resolved) person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
  pub identity_id:  Uuid,
  pub id_string:    String,
  pub display_name: Option<String>,
  pub person_id:    Option<Uuid>,
  pub person_name:  Option<String>,
  pub is_self:      bool,
}

impl Party {
  /// Best available label: person name, then display name, then id string.
  pub fn label(&self) -> &str {
    self
      .person_name
      .as_deref()
      .or(self.display_name.as_deref())
      .unwrap_or(&self.id_string)
  }
}

/// A message joined with its platform and both parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
  pub message_id: Uuid,
  pub platform:   String,
  pub timestamp:  DateTime<Utc>,
  pub text:       Option<String>,
  pub sender:     Party,
  pub recipient:  Party,
}

/// The flat per-message row handed to spreadsheet tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
  pub message_id:             Uuid,
  pub platform_name:          String,
  pub sender_display_name:    String,
  pub recipient_display_name: String,
  pub timestamp:              String,
  pub content:                String,
}

impl From<&MessageView> for ExportRecord {
  fn from(v: &MessageView) -> Self {
    Self {
      message_id:             v.message_id,
      platform_name:          v.platform.clone(),
      sender_display_name:    v.sender.display_name.clone().unwrap_or_default(),
      recipient_display_name: v.recipient.display_name.clone().unwrap_or_default(),
      timestamp:              v.timestamp.to_rfc3339(),
      content:                v.text.clone().unwrap_or_default(),
    }
  }
}
