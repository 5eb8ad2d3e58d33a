//! CSV files written by the export commands.

use std::path::Path;

use anyhow::{Context as _, Result};
use rapport_core::view::{ExportRecord, MessageView};
use rapport_metrics::{Reciprocity, TimeSeries};
use serde::Serialize;

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<usize> {
  let mut writer =
    csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
  let mut n = 0;
  for row in rows {
    writer.serialize(row)?;
    n += 1;
  }
  writer.flush()?;
  Ok(n)
}

/// One row per message.
pub fn write_messages(path: &Path, views: &[MessageView]) -> Result<usize> {
  write_rows(path, views.iter().map(ExportRecord::from))
}

/// One row per contact, one column per bucket.
pub fn write_time_series(path: &Path, series: &TimeSeries) -> Result<usize> {
  let mut writer =
    csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
  writer.write_record(series.header())?;
  for record in series.records() {
    writer.write_record(record)?;
  }
  writer.flush()?;
  Ok(series.rows.len())
}

pub fn write_reciprocity(path: &Path, rows: &[Reciprocity]) -> Result<usize> { write_rows(path, rows) }

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  #[test]
  fn reciprocity_csv_has_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reciprocity.csv");
    let rows = vec![Reciprocity {
      other_person:      "Jane Doe".into(),
      sent:              2,
      received:          2,
      words_sent:        0,
      words_received:    0,
      msg_reciprocity:   0.5,
      words_reciprocity: None,
      message_amplitude: 4,
      word_amplitude:    0,
      first_contact:     Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap(),
    }];

    assert_eq!(write_reciprocity(&path, &rows).unwrap(), 1);
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("other_person,sent,received"));
    assert!(lines.next().unwrap().starts_with("Jane Doe,2,2,0,0,0.5,,4,0,2019-06-01T00:00:00Z"));
  }
}
