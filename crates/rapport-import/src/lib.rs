//! Producers that turn raw export archives into normalised
//! [`SourceBatch`]es for `rapport-core`.
//!
//! Pure parsing plus directory walking; no database access. Each source has
//! a `parse_*` function over one file's contents and a `read_*` function over
//! an export directory.
//!
//! # Quick start
//!
//! ```no_run
//! use rapport_import::google_voice;
//!
//! let batch = google_voice::read_takeout("exports/google/takeout", "tel:+13195550134", None)
//!   .unwrap();
//! println!("{} messages from {} files", batch.messages.len(), batch.tally.files);
//! ```

pub mod contacts;
pub mod error;
pub mod google_voice;
pub mod messenger;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};
use rapport_core::record::{IdentityRecord, MessageRecord, SourceBatch, SourceTime};

/// Platform name for Google Voice call and text logs.
pub const GOOGLE_VOICE: &str = "Google Voice";
/// Platform name for Facebook Messenger inbox exports.
pub const MESSENGER: &str = "Facebook Messenger";
/// Platform name for the Google Contacts spreadsheet.
pub const GOOGLE_CONTACTS: &str = "Google Contacts";

// ─── Two-party threads ───────────────────────────────────────────────────────

/// A one-to-one conversation: the participants in order of appearance and
/// the messages exchanged, addressed by `id_string`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
  pub participants: Vec<IdentityRecord>,
  pub messages:     Vec<MessageRecord>,
  /// Messages dropped for missing fields.
  pub malformed:    usize,
}

impl Thread {
  /// Add a participant unless one with the same `id_string` is present.
  pub fn add_participant(&mut self, id_string: &str, display_name: &str) {
    if !self.participants.iter().any(|p| p.id_string == id_string) {
      self
        .participants
        .push(IdentityRecord::new(id_string, display_name));
    }
  }

  /// The party a message from `sender` was addressed to: the first other
  /// participant, or the sender itself when nobody else is in the thread.
  pub fn recipient_of(&self, sender: &str) -> String {
    self
      .participants
      .iter()
      .find(|p| p.id_string != sender)
      .map_or(sender, |p| p.id_string.as_str())
      .to_owned()
  }

  /// Add a message from `sender`. The recipient is fixed here, so every
  /// participant must already be added.
  pub(crate) fn push_message(&mut self, sender: &str, text: Option<String>, timestamp: SourceTime) {
    let recipient = self.recipient_of(sender);
    self.messages.push(MessageRecord {
      sender: sender.to_owned(),
      recipient,
      text,
      timestamp,
    });
  }

  /// Move this thread's records into `batch`.
  pub fn append_to(self, batch: &mut SourceBatch) {
    batch.identities.extend(self.participants);
    batch.messages.extend(self.messages);
    batch.tally.malformed += self.malformed;
  }
}

// ─── Filesystem helpers ──────────────────────────────────────────────────────

/// The first of `candidates` (relative to `root`) that is a directory, else
/// `root` itself.
pub(crate) fn locate(root: &Path, candidates: &[&[&str]]) -> PathBuf {
  candidates
    .iter()
    .map(|parts| parts.iter().fold(root.to_path_buf(), |p, part| p.join(part)))
    .find(|p| p.is_dir())
    .unwrap_or_else(|| root.to_path_buf())
}

/// Files directly inside `dir` with the given extension, sorted by name.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
    let path = entry.map_err(|e| Error::io(dir, e))?.path();
    if path.is_file()
      && path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

/// Subdirectories directly inside `dir`, sorted by name.
pub(crate) fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut dirs = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
    let path = entry.map_err(|e| Error::io(dir, e))?.path();
    if path.is_dir() {
      dirs.push(path);
    }
  }
  dirs.sort();
  Ok(dirs)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recipient_is_the_other_participant() {
    let mut t = Thread::default();
    t.add_participant("tel:+15551234567", "Jane Doe");
    t.add_participant("tel:+13195550134", "Me");
    t.add_participant("tel:+15551234567", "Jane D.");

    assert_eq!(t.participants.len(), 2);
    assert_eq!(t.participants[0].display_name.as_deref(), Some("Jane Doe"));
    assert_eq!(t.recipient_of("tel:+15551234567"), "tel:+13195550134");
    assert_eq!(t.recipient_of("tel:+13195550134"), "tel:+15551234567");
  }

  #[test]
  fn lone_participant_messages_themselves() {
    let mut t = Thread::default();
    t.add_participant("Jane Doe", "Jane Doe");
    assert_eq!(t.recipient_of("Jane Doe"), "Jane Doe");
  }
}
