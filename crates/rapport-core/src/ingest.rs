//! Ingestion driver: pushes [`SourceBatch`]es through the registrar and the
//! writer and keeps the counts reported at the end of a run.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  record::{SourceBatch, SourceTally},
  registrar::Registrar,
  store::MessageStore,
  writer::Writer,
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
  pub platforms_created:  usize,
  pub identities_created: usize,
  pub messages_written:   usize,
  /// Sender or recipient not registered on the batch platform.
  pub messages_skipped:   usize,
  /// Dropped by the fingerprint guard.
  pub duplicates:         usize,
  /// Identity or message records missing a required field, plus whatever
  /// the producers dropped for the same reason.
  pub malformed:          usize,
  /// Producer-side counts.
  pub source:             SourceTally,
}

impl fmt::Display for IngestReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "identities created:   {}", self.identities_created)?;
    writeln!(f, "messages written:     {}", self.messages_written)?;
    writeln!(f, "messages skipped:     {}", self.messages_skipped)?;
    writeln!(f, "duplicates skipped:   {}", self.duplicates)?;
    writeln!(f, "malformed records:    {}", self.malformed)?;
    writeln!(f, "unknown threads:      {}", self.source.unknown)?;
    writeln!(f, "group threads:        {}", self.source.group_threads)?;
    write!(f, "call records:         {}", self.source.call_records)
  }
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

/// Feeds batches into a store. One ingestor per run; its identity index is
/// dropped with it.
pub struct Ingestor<'s, S> {
  store:     &'s S,
  registrar: Registrar<'s, S>,
  writer:    Writer,
  report:    IngestReport,
}

impl<'s, S: MessageStore> Ingestor<'s, S> {
  pub fn new(store: &'s S, writer: Writer) -> Self {
    Self {
      store,
      registrar: Registrar::new(store),
      writer,
      report: IngestReport::default(),
    }
  }

  /// Register the batch's identities, then write its messages.
  ///
  /// Bad records are skipped and counted; only store failures are returned.
  pub async fn ingest(&mut self, batch: SourceBatch) -> Result<(), S::Error> {
    let platform = self.registrar.get_or_create_platform(&batch.platform).await?;
    info!(
      platform = %platform.name,
      identities = batch.identities.len(),
      messages = batch.messages.len(),
      "ingesting batch"
    );

    for record in &batch.identities {
      if record.id_string.trim().is_empty() {
        self.report.malformed += 1;
        continue;
      }
      self
        .registrar
        .get_or_create_identity(&platform, &record.id_string, record.display_name.as_deref())
        .await?;
    }

    for record in batch.messages {
      let timestamp = match record.timestamp.resolve() {
        Ok(t) => t,
        Err(e) => {
          debug!(error = %e, sender = %record.sender, "malformed message skipped");
          self.report.malformed += 1;
          continue;
        }
      };

      let sender = self.registrar.lookup(&platform, &record.sender).await?;
      let recipient = self.registrar.lookup(&platform, &record.recipient).await?;
      let (Some(sender), Some(recipient)) = (sender, recipient) else {
        debug!(
          sender = %record.sender,
          recipient = %record.recipient,
          "unresolvable message skipped"
        );
        self.report.messages_skipped += 1;
        continue;
      };

      match self
        .writer
        .write(self.store, &sender, &recipient, record.text, timestamp)
        .await?
      {
        Some(_) => self.report.messages_written += 1,
        None => self.report.duplicates += 1,
      }
    }

    if batch.tally.unknown > 0 {
      warn!(
        platform = %platform.name,
        unknown = batch.tally.unknown,
        "threads of unknown type were not imported"
      );
    }
    self.report.malformed += batch.tally.malformed;
    self.report.source += batch.tally;
    Ok(())
  }

  /// Consume the ingestor and return its counters.
  pub fn finish(mut self) -> IngestReport {
    self.report.platforms_created = self.registrar.platforms_created();
    self.report.identities_created = self.registrar.identities_created();
    if self.report.messages_skipped > 0 {
      warn!(skipped = self.report.messages_skipped, "messages skipped: unresolvable parties");
    }
    self.report
  }
}
