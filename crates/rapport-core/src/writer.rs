//! Message Writer.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::{
  entity::{Identity, Message, NewMessage},
  store::MessageStore,
};

/// Append a message between two registered identities.
///
/// No duplicate detection: writing the same message twice stores it twice.
pub async fn record_message<S: MessageStore>(
  store: &S,
  sender: &Identity,
  recipient: &Identity,
  text: Option<String>,
  timestamp: DateTime<Utc>,
) -> Result<Message, S::Error> {
  store
    .add_message(NewMessage {
      sender_id: sender.identity_id,
      recipient_id: recipient.identity_id,
      text,
      timestamp,
    })
    .await
}

/// [`record_message`] with an optional fingerprint guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct Writer {
  /// Skip messages whose fingerprint is already in the store.
  pub dedupe: bool,
}

impl Writer {
  pub fn new(dedupe: bool) -> Self { Self { dedupe } }

  /// Write the message, or return `None` if `dedupe` is on and an identical
  /// message already exists.
  pub async fn write<S: MessageStore>(
    &self,
    store: &S,
    sender: &Identity,
    recipient: &Identity,
    text: Option<String>,
    timestamp: DateTime<Utc>,
  ) -> Result<Option<Message>, S::Error> {
    if self.dedupe {
      let fingerprint = NewMessage {
        sender_id: sender.identity_id,
        recipient_id: recipient.identity_id,
        text: text.clone(),
        timestamp,
      }
      .fingerprint();
      if store.message_exists(fingerprint).await? {
        trace!(sender = %sender.id_string, %timestamp, "duplicate message skipped");
        return Ok(None);
      }
    }

    record_message(store, sender, recipient, text, timestamp)
      .await
      .map(Some)
  }
}
