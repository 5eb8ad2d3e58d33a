//! The conversation log: every message to or from the owner, labelled by the
//! other side.

use chrono::{DateTime, Utc};
use rapport_core::view::MessageView;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Sent,
  Received,
}

/// One message from the owner's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
  pub timestamp:    DateTime<Utc>,
  pub other_person: String,
  pub direction:    Direction,
  pub word_count:   usize,
}

fn word_count(text: Option<&str>) -> usize { text.map_or(0, |t| t.split_whitespace().count()) }

/// Classify each message as sent or received by the owner.
///
/// Messages between two non-owner parties, and owner-to-owner notes, are
/// left out.
pub fn conversation_log(views: &[MessageView]) -> Vec<ContactEvent> {
  views
    .iter()
    .filter_map(|v| {
      let (direction, other) = match (v.sender.is_self, v.recipient.is_self) {
        (true, false) => (Direction::Sent, &v.recipient),
        (false, true) => (Direction::Received, &v.sender),
        _ => return None,
      };
      Some(ContactEvent {
        timestamp: v.timestamp,
        other_person: other.label().to_owned(),
        direction,
        word_count: word_count(v.text.as_deref()),
      })
    })
    .collect()
}
