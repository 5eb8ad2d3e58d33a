//! Facebook Messenger JSON export (`messages/inbox/<thread>/message_*.json`).
//!
//! Participants are only known by display name, so the name doubles as the
//! `id_string`.

use std::path::Path;

use rapport_core::record::{SourceBatch, SourceTime};
use serde::Deserialize;
use tracing::warn;

use crate::{Error, MESSENGER, Result, Thread, files_with_extension, locate, subdirectories};

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Conversation {
  #[serde(default)]
  participants: Vec<Participant>,
  #[serde(default)]
  messages:     Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct Participant {
  name: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
  #[serde(default)]
  sender_name:  String,
  timestamp_ms: Option<i64>,
  content:      Option<String>,
}

/// One parsed `message_*.json` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedConversation {
  OneToOne(Thread),
  /// More than two participants; not imported.
  Group,
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse the contents of one Messenger JSON file.
///
/// Messages with an empty sender or no timestamp are counted as malformed.
/// Messages from someone not listed as a participant are kept; the ingestor
/// skips them as unresolvable.
pub fn parse_conversation(json: &str) -> Result<ParsedConversation> {
  let conversation: Conversation = serde_json::from_str(json)?;
  if conversation.participants.len() > 2 {
    return Ok(ParsedConversation::Group);
  }

  let mut thread = Thread::default();
  for p in &conversation.participants {
    thread.add_participant(&p.name, &p.name);
  }

  for message in conversation.messages {
    let Some(ms) = message.timestamp_ms else {
      thread.malformed += 1;
      continue;
    };
    if message.sender_name.is_empty() {
      thread.malformed += 1;
      continue;
    }
    thread.push_message(&message.sender_name, message.content, SourceTime::EpochMillis(ms));
  }

  Ok(ParsedConversation::OneToOne(thread))
}

/// Read every conversation under a Messenger inbox folder.
///
/// `root` may be the inbox itself or the export folder above
/// `messages/inbox`. Files that fail to parse are counted as malformed.
pub fn read_inbox(root: impl AsRef<Path>) -> Result<SourceBatch> {
  let inbox = locate(root.as_ref(), &[&["messages", "inbox"], &["inbox"]]);
  let mut batch = SourceBatch::new(MESSENGER);

  for thread_dir in subdirectories(&inbox)? {
    for path in files_with_extension(&thread_dir, "json")? {
      let json = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
      batch.tally.files += 1;

      match parse_conversation(&json) {
        Ok(ParsedConversation::OneToOne(thread)) => thread.append_to(&mut batch),
        Ok(ParsedConversation::Group) => batch.tally.group_threads += 1,
        Err(e) => {
          warn!(file = %path.display(), error = %e, "unreadable Messenger file");
          batch.tally.malformed += 1;
        }
      }
    }
  }

  Ok(batch)
}

#[cfg(test)]
mod tests {
  use super::*;

  const ONE_TO_ONE: &str = r#"{
    "participants": [{"name": "Jane Doe"}, {"name": "Sam Owner"}],
    "messages": [
      {"sender_name": "Jane Doe", "timestamp_ms": 1583064000000, "content": "hey", "type": "Generic"},
      {"sender_name": "Sam Owner", "timestamp_ms": 1583064060000, "type": "Generic"},
      {"sender_name": "", "timestamp_ms": 1583064120000, "content": "ghost"},
      {"sender_name": "Jane Doe", "content": "no time"}
    ],
    "title": "Jane Doe"
  }"#;

  #[test]
  fn one_to_one_conversation() {
    let ParsedConversation::OneToOne(thread) = parse_conversation(ONE_TO_ONE).unwrap() else {
      panic!("expected a one-to-one thread");
    };

    assert_eq!(thread.participants.len(), 2);
    assert_eq!(thread.participants[0].id_string, "Jane Doe");
    assert_eq!(thread.participants[0].display_name.as_deref(), Some("Jane Doe"));

    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[0].recipient, "Sam Owner");
    assert_eq!(thread.messages[0].timestamp, SourceTime::EpochMillis(1_583_064_000_000));
    assert_eq!(thread.messages[1].recipient, "Jane Doe");
    assert!(thread.messages[1].text.is_none());
    assert_eq!(thread.malformed, 2);
  }

  #[test]
  fn group_conversation_is_skipped() {
    let json = r#"{"participants": [{"name": "A"}, {"name": "B"}, {"name": "C"}], "messages": []}"#;
    assert_eq!(parse_conversation(json).unwrap(), ParsedConversation::Group);
  }

  #[test]
  fn solo_conversation_messages_self() {
    let json = r#"{"participants": [{"name": "Sam Owner"}],
      "messages": [{"sender_name": "Sam Owner", "timestamp_ms": 1, "content": "memo"}]}"#;
    let ParsedConversation::OneToOne(thread) = parse_conversation(json).unwrap() else {
      panic!("expected a one-to-one thread");
    };
    assert_eq!(thread.messages[0].recipient, "Sam Owner");
  }

  #[test]
  fn invalid_json_is_an_error() {
    assert!(matches!(parse_conversation("{"), Err(Error::Json(_))));
  }

  #[test]
  fn read_inbox_walks_thread_folders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inbox = dir.path().join("messages").join("inbox");
    let jane = inbox.join("janedoe_abc123");
    let group = inbox.join("thecrew_def456");
    std::fs::create_dir_all(&jane).unwrap();
    std::fs::create_dir_all(jane.join("photos")).unwrap();
    std::fs::create_dir_all(&group).unwrap();

    std::fs::write(jane.join("message_1.json"), ONE_TO_ONE).unwrap();
    std::fs::write(jane.join("message_2.json"), "not json").unwrap();
    std::fs::write(
      group.join("message_1.json"),
      r#"{"participants": [{"name": "A"}, {"name": "B"}, {"name": "C"}], "messages": []}"#,
    )
    .unwrap();

    let batch = read_inbox(dir.path()).unwrap();
    assert_eq!(batch.platform, MESSENGER);
    assert_eq!(batch.tally.files, 3);
    assert_eq!(batch.tally.group_threads, 1);
    assert_eq!(batch.tally.malformed, 3);
    assert_eq!(batch.messages.len(), 2);
  }
}
