//! Message counts per contact per calendar bucket.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ContactEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
  /// Weeks ending on Sunday.
  Week,
  Month,
}

impl Bucket {
  /// The date labelling the bucket `date` falls in: the Sunday ending its
  /// week, or the last day of its month.
  pub fn label(self, date: NaiveDate) -> NaiveDate {
    match self {
      Bucket::Week => {
        let to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
        date + Days::new(u64::from(to_sunday))
      }
      Bucket::Month => {
        let first = date.with_day(1).unwrap_or(date);
        first
          .checked_add_months(Months::new(1))
          .and_then(|next| next.pred_opt())
          .unwrap_or(date)
      }
    }
  }

  /// The label following `label`.
  fn next(self, label: NaiveDate) -> Option<NaiveDate> {
    match self {
      Bucket::Week => label.checked_add_days(Days::new(7)),
      Bucket::Month => label.succ_opt().map(|d| self.label(d)),
    }
  }
}

/// Counts per contact, one column per bucket from the first to the last
/// bucket with any message. Buckets with no messages are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries {
  pub buckets: Vec<NaiveDate>,
  /// Sorted by contact name; `counts[i]` belongs to `buckets[i]`.
  pub rows:    Vec<(String, Vec<u64>)>,
}

impl TimeSeries {
  /// Header row for tabular output.
  pub fn header(&self) -> Vec<String> {
    std::iter::once("other_person".to_owned())
      .chain(self.buckets.iter().map(|d| d.to_string()))
      .collect()
  }

  /// Data rows matching [`TimeSeries::header`].
  pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
    self.rows.iter().map(|(name, counts)| {
      std::iter::once(name.clone())
        .chain(counts.iter().map(u64::to_string))
        .collect()
    })
  }
}

pub fn time_series(events: &[ContactEvent], bucket: Bucket) -> TimeSeries {
  let mut tallies: BTreeMap<&str, BTreeMap<NaiveDate, u64>> = BTreeMap::new();
  for e in events {
    let label = bucket.label(e.timestamp.date_naive());
    *tallies
      .entry(e.other_person.as_str())
      .or_default()
      .entry(label)
      .or_default() += 1;
  }

  let first = tallies.values().filter_map(|t| t.keys().next()).min().copied();
  let last = tallies.values().filter_map(|t| t.keys().next_back()).max().copied();

  let mut buckets = Vec::new();
  if let (Some(first), Some(last)) = (first, last) {
    let mut cursor = Some(first);
    while let Some(label) = cursor.filter(|l| *l <= last) {
      buckets.push(label);
      cursor = bucket.next(label);
    }
  }

  let rows = tallies
    .into_iter()
    .map(|(name, counts)| {
      let row = buckets
        .iter()
        .map(|b| counts.get(b).copied().unwrap_or(0))
        .collect();
      (name.to_owned(), row)
    })
    .collect();

  TimeSeries { buckets, rows }
}
