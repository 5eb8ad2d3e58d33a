//! Social reciprocity and amplitude per contact.
//!
//! Reciprocity is the owner's share of a relationship: `0.5` is balanced,
//! above it the owner does more of the talking. Amplitude is its volume.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContactEvent, Direction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reciprocity {
  pub other_person:      String,
  pub sent:              u64,
  pub received:          u64,
  pub words_sent:        u64,
  pub words_received:    u64,
  pub msg_reciprocity:   f64,
  /// `None` when neither side wrote a word (e.g. media-only threads).
  pub words_reciprocity: Option<f64>,
  pub message_amplitude: u64,
  pub word_amplitude:    u64,
  /// Earliest message with this contact over the whole log.
  pub first_contact:     DateTime<Utc>,
}

#[derive(Default)]
struct Totals {
  sent:           u64,
  received:       u64,
  words_sent:     u64,
  words_received: u64,
}

fn share(ours: u64, theirs: u64) -> Option<f64> {
  let total = ours + theirs;
  (total > 0).then(|| ours as f64 / total as f64)
}

/// Reciprocity for every contact over the events strictly after `since`
/// (all events when `None`). Contacts who have not both sent and received
/// a message in that window are left out.
pub fn reciprocity(events: &[ContactEvent], since: Option<DateTime<Utc>>) -> Vec<Reciprocity> {
  let mut first_contact: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
  for e in events {
    first_contact
      .entry(e.other_person.as_str())
      .and_modify(|t| *t = (*t).min(e.timestamp))
      .or_insert(e.timestamp);
  }

  let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();
  for e in events.iter().filter(|e| since.is_none_or(|s| e.timestamp > s)) {
    let t = totals.entry(e.other_person.as_str()).or_default();
    let words = e.word_count as u64;
    match e.direction {
      Direction::Sent => {
        t.sent += 1;
        t.words_sent += words;
      }
      Direction::Received => {
        t.received += 1;
        t.words_received += words;
      }
    }
  }

  totals
    .into_iter()
    .filter(|(_, t)| t.sent > 0 && t.received > 0)
    .filter_map(|(name, t)| {
      Some(Reciprocity {
        other_person:      name.to_owned(),
        msg_reciprocity:   share(t.sent, t.received)?,
        words_reciprocity: share(t.words_sent, t.words_received),
        message_amplitude: t.sent + t.received,
        word_amplitude:    t.words_sent + t.words_received,
        first_contact:     *first_contact.get(name)?,
        sent:              t.sent,
        received:          t.received,
        words_sent:        t.words_sent,
        words_received:    t.words_received,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::at;

  fn event(name: &str, when: DateTime<Utc>, direction: Direction, words: usize) -> ContactEvent {
    ContactEvent {
      timestamp: when,
      other_person: name.to_owned(),
      direction,
      word_count: words,
    }
  }

  #[test]
  fn balanced_and_one_sided_contacts() {
    let events = vec![
      event("Jane Doe", at(2019, 6, 1), Direction::Received, 10),
      event("Jane Doe", at(2020, 2, 1), Direction::Sent, 3),
      event("Jane Doe", at(2020, 2, 2), Direction::Received, 1),
      event("Jane Doe", at(2020, 2, 3), Direction::Sent, 0),
      event("Bob Roe", at(2020, 2, 1), Direction::Sent, 5),
    ];

    let rows = reciprocity(&events, Some(at(2020, 1, 1)));
    assert_eq!(rows.len(), 1);

    let jane = &rows[0];
    assert_eq!(jane.other_person, "Jane Doe");
    assert_eq!((jane.sent, jane.received), (2, 1));
    assert!((jane.msg_reciprocity - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(jane.words_reciprocity, Some(0.75));
    assert_eq!(jane.message_amplitude, 3);
    assert_eq!(jane.word_amplitude, 4);
    assert_eq!(jane.first_contact, at(2019, 6, 1));
  }

  #[test]
  fn wordless_exchange_has_no_word_share() {
    let events = vec![
      event("Jane Doe", at(2020, 2, 1), Direction::Sent, 0),
      event("Jane Doe", at(2020, 2, 2), Direction::Received, 0),
    ];
    let rows = reciprocity(&events, None);
    assert_eq!(rows[0].msg_reciprocity, 0.5);
    assert_eq!(rows[0].words_reciprocity, None);
  }

  #[test]
  fn since_is_exclusive() {
    let events = vec![
      event("Jane Doe", at(2020, 1, 1), Direction::Sent, 1),
      event("Jane Doe", at(2020, 2, 2), Direction::Received, 1),
    ];
    assert!(reciprocity(&events, Some(at(2020, 1, 1))).is_empty());
    assert_eq!(reciprocity(&events, None).len(), 1);
  }
}
