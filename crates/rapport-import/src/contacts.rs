//! Google Contacts spreadsheet export (`contacts.csv`).
//!
//! Each row is a card; every e-mail and phone column becomes one
//! [`ContactRecord`] keyed `email_N` / `phone_N`. Phones are normalised to
//! the Google Voice `tel:+…` form so they meet the same person's phone
//! identities in the resolver.

use std::{collections::HashMap, io::Read, path::Path};

use rapport_core::{
  normalize::normalize_phone,
  record::{ContactRecord, IdentityRecord, SourceBatch},
};
use tracing::debug;

use crate::{Error, GOOGLE_CONTACTS, Result};

const NAME_COLUMN: &str = "Name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
  Email,
  Phone,
}

/// A value column: `E-mail N - Value` or `Phone N - Value`.
#[derive(Debug, Clone)]
struct FieldColumn {
  index: usize,
  kind:  FieldKind,
  key:   String,
}

impl FieldColumn {
  fn from_header(index: usize, header: &str) -> Option<Self> {
    let (kind, prefix) = if let Some(rest) = header.strip_prefix("E-mail ") {
      (FieldKind::Email, rest)
    } else if let Some(rest) = header.strip_prefix("Phone ") {
      (FieldKind::Phone, rest)
    } else {
      return None;
    };
    let n: u32 = prefix.strip_suffix(" - Value")?.parse().ok()?;
    let key = match kind {
      FieldKind::Email => format!("email_{n}"),
      FieldKind::Phone => format!("phone_{n}"),
    };
    Some(Self { index, kind, key })
  }
}

/// One person's collected fields, in insertion order.
#[derive(Debug, Default)]
struct Card {
  fields: Vec<(String, String)>,
}

impl Card {
  /// Empty values are ignored and a value already on the card is not added
  /// twice. A taken key gets a `_dup_N` suffix.
  fn insert(&mut self, key: &str, value: String) {
    if value.is_empty() || self.fields.iter().any(|(_, v)| *v == value) {
      return;
    }
    let mut candidate = key.to_owned();
    let mut i = 1;
    while self.fields.iter().any(|(k, _)| *k == candidate) {
      candidate = format!("{key}_dup_{i}");
      i += 1;
    }
    self.fields.push((candidate, value));
  }
}

/// The contact records of one spreadsheet plus what was thrown away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSheet {
  /// In order of each name's first row.
  pub records:        Vec<ContactRecord>,
  pub rows:           usize,
  pub unnamed_rows:   usize,
  /// Phone values with fewer than ten digits.
  pub invalid_phones: usize,
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a Google Contacts CSV. Rows sharing a name are merged into one card.
pub fn parse_contacts<R: Read>(reader: R) -> Result<ContactSheet> {
  let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

  let headers = csv.headers()?.clone();
  let name_index = headers
    .iter()
    .position(|h| h == NAME_COLUMN)
    .ok_or(Error::MissingColumn(NAME_COLUMN))?;
  let columns: Vec<FieldColumn> = headers
    .iter()
    .enumerate()
    .filter_map(|(i, h)| FieldColumn::from_header(i, h))
    .collect();
  debug!(columns = columns.len(), "contact value columns");

  let mut sheet = ContactSheet::default();
  let mut cards: Vec<(String, Card)> = Vec::new();
  let mut by_name: HashMap<String, usize> = HashMap::new();

  for row in csv.records() {
    let row = row?;
    sheet.rows += 1;

    let name = row.get(name_index).unwrap_or_default().trim();
    if name.is_empty() {
      sheet.unnamed_rows += 1;
      continue;
    }

    let card_index = *by_name.entry(name.to_owned()).or_insert_with(|| {
      cards.push((name.to_owned(), Card::default()));
      cards.len() - 1
    });

    for column in &columns {
      let raw = row.get(column.index).unwrap_or_default().trim();
      if raw.is_empty() {
        continue;
      }
      let value = match column.kind {
        FieldKind::Email => raw.to_owned(),
        FieldKind::Phone => match normalize_phone(raw) {
          Some(phone) => phone,
          None => {
            sheet.invalid_phones += 1;
            continue;
          }
        },
      };
      cards[card_index].1.insert(&column.key, value);
    }
  }

  sheet.records = cards
    .into_iter()
    .flat_map(|(name, card)| {
      card.fields.into_iter().map(move |(field_key, field_value)| ContactRecord {
        name: name.clone(),
        field_key,
        field_value,
      })
    })
    .collect();

  Ok(sheet)
}

/// Turn parsed contacts into identities on the `Google Contacts` platform.
/// Contacts carry no messages.
pub fn contacts_batch(sheet: ContactSheet) -> SourceBatch {
  let mut batch = SourceBatch::new(GOOGLE_CONTACTS);
  batch.tally.files = 1;
  batch.tally.malformed = sheet.unnamed_rows + sheet.invalid_phones;
  batch.identities = sheet.records.into_iter().map(IdentityRecord::from).collect();
  batch
}

/// Read and parse a contacts CSV file.
pub fn read_contacts(path: impl AsRef<Path>) -> Result<SourceBatch> {
  let path = path.as_ref();
  let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
  Ok(contacts_batch(parse_contacts(file)?))
}
