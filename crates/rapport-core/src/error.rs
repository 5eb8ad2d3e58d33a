//! Error types for `rapport-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unrecognised timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("epoch milliseconds out of range: {0}")]
  TimestampOutOfRange(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
