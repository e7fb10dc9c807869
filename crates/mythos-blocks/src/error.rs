//! Error type for `mythos-blocks`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed block document: {0}")]
  Json(#[from] serde_json::Error),

  #[error("block {index} ({kind}): {reason}")]
  InvalidBlock {
    index:  usize,
    kind:   String,
    reason: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
