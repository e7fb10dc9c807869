//! The [`Entity`] trait shared by every project-scoped record, and the
//! helpers used to build partial updates.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{kind::EntityKind, validate::Validate};

/// Anything that names the project it belongs to.
pub trait Scoped {
  fn project_id(&self) -> Uuid;
}

/// A typed pointer from one record to another in the same project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
  pub kind: EntityKind,
  pub id:   Uuid,
}

/// A flat, project-scoped record backed by one table.
///
/// The serialised field names of an implementor are its column names; both
/// backends rely on that to persist records generically.
pub trait Entity:
  Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const KIND: EntityKind;
  /// Column holding rich-text content, if the kind has one.
  const TEXT_FIELD: Option<&'static str>;

  /// Body of a create request.
  type Draft: Scoped + Validate + DeserializeOwned + Debug + Send + Sync + 'static;
  /// Body of a partial update. Absent fields are left untouched.
  type Patch: Validate + DeserializeOwned + Debug + Send + Sync + 'static;

  fn id(&self) -> Uuid;
  fn project_id(&self) -> Uuid;
  fn label(&self) -> &str;

  fn rich_text(&self) -> Option<&str> { None }

  fn image_url(&self) -> Option<&str> { None }

  /// Records this one points at. Each must exist in the same project.
  fn references(&self) -> Vec<Reference> { Vec::new() }

  /// Build a fresh record; `at` becomes both `created_at` and `updated_at`.
  fn from_draft(id: Uuid, draft: Self::Draft, at: DateTime<Utc>) -> Self;

  /// Apply a partial update and refresh `updated_at`.
  fn apply(&mut self, patch: Self::Patch, at: DateTime<Utc>);
}

// ─── Patch helpers ───────────────────────────────────────────────────────────

/// Deserialise a nullable patch field so that an explicit `null` is
/// distinguishable from an absent field.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`,
/// value → `Some(Some(v))`.
pub fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

/// Overwrite `slot` if the patch carried a value.
pub fn set<T>(slot: &mut T, value: Option<T>) {
  if let Some(v) = value {
    *slot = v;
  }
}
