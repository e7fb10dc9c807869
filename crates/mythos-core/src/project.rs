//! Projects: the top-level container isolating one story world.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  entity::{nullable, set},
  kind::EntityKind,
  validate::{self, Validate},
};

/// A named container. Every other record belongs to exactly one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub id:          Uuid,
  /// The identity provider's user id of the owner.
  pub owner_id:    String,
  pub name:        String,
  pub description: Option<String>,
  pub genre:       Option<String>,
  pub image_url:   Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Project {
  pub const KIND: EntityKind = EntityKind::Project;

  pub fn new(id: Uuid, owner_id: String, draft: NewProject, at: DateTime<Utc>) -> Self {
    Self {
      id,
      owner_id,
      name: draft.name,
      description: draft.description,
      genre: draft.genre,
      image_url: draft.image_url,
      created_at: at,
      updated_at: at,
    }
  }

  pub fn apply(&mut self, patch: ProjectPatch, at: DateTime<Utc>) {
    set(&mut self.name, patch.name);
    set(&mut self.description, patch.description);
    set(&mut self.genre, patch.genre);
    set(&mut self.image_url, patch.image_url);
    self.updated_at = at;
  }
}

/// Input to [`crate::store::WorldStore::create_project`]. The owner comes
/// from the authenticated caller, never from the body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
  pub name:        String,
  pub description: Option<String>,
  pub genre:       Option<String>,
  pub image_url:   Option<String>,
}

impl NewProject {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), description: None, genre: None, image_url: None }
  }
}

impl Validate for NewProject {
  fn validate(&self) -> Result<()> {
    validate::required("name", &self.name)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub genre:       Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub image_url:   Option<Option<String>>,
}

impl Validate for ProjectPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("name", self.name.as_ref())?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

/// Row counts for every kind a project owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
  pub project_id: Uuid,
  pub counts:     std::collections::BTreeMap<EntityKind, u64>,
}

impl ProjectStats {
  pub fn total(&self) -> u64 { self.counts.values().sum() }

  pub fn count(&self, kind: EntityKind) -> u64 {
    self.counts.get(&kind).copied().unwrap_or(0)
  }
}
