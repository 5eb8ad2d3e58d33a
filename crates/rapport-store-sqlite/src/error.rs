//! Error type for `rapport-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("platform already exists: {0:?}")]
  DuplicatePlatform(String),

  #[error("identity not found: {0}")]
  IdentityNotFound(uuid::Uuid),

  #[error("person not found: {0}")]
  PersonNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
