//! Error type for `mythos-store-sqlite`.

use mythos_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] mythos_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A record did not serialise to a flat JSON object.
  #[error("cannot encode {0} as a row")]
  Encode(&'static str),
}

impl DomainError for Error {
  fn domain(&self) -> Option<&mythos_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
