//! Error types for the rapport-import producers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("contacts file has no {0:?} column")]
  MissingColumn(&'static str),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Error::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
