//! Error types for `mythos-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::kind::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("project not found: {0}")]
  ProjectNotFound(Uuid),

  #[error("{kind} not found: {id}")]
  NotFound { kind: EntityKind, id: Uuid },

  #[error("{kind} {id} does not exist in project {project_id}")]
  DanglingReference {
    kind:       EntityKind,
    id:         Uuid,
    project_id: Uuid,
  },

  #[error("{left} is already linked to {right}")]
  AlreadyLinked { left: Uuid, right: Uuid },

  #[error("invalid {field}: {reason}")]
  Validation { field: &'static str, reason: String },

  #[error("rich text error: {0}")]
  RichText(#[from] mythos_blocks::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }

  pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
    Self::NotFound { kind, id }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Access to the domain-level cause of a backend error.
///
/// Store backends wrap [`Error`] in their own error types; the API layer uses
/// this to tell "not found" and "invalid" apart from database failures.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
