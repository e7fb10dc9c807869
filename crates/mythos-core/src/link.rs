//! Connections between records: typed junction rows (character ↔ spell,
//! event ↔ character) and free-form relationship edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{Entity, Reference, Scoped, nullable, set},
  kind::EntityKind,
  validate::{self, Validate},
};

// ─── Junctions ───────────────────────────────────────────────────────────────

/// A character knows a spell. Keyed by `(character_id, spell_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSpell {
  pub character_id: Uuid,
  pub spell_id:     Uuid,
  pub proficiency:  Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// A character took part in an event. Keyed by `(event_id, character_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCharacter {
  pub event_id:     Uuid,
  pub character_id: Uuid,
  pub role:         Option<String>,
  pub created_at:   DateTime<Utc>,
}

// ─── Relationship ────────────────────────────────────────────────────────────

/// A directed, typed edge between any two records of one project, e.g.
/// `character --rules--> location`.
///
/// Endpoints are `(kind, id)` pairs rather than foreign keys; the store
/// checks that both exist in the relationship's project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
  pub id:                Uuid,
  pub project_id:        Uuid,
  pub source_type:       EntityKind,
  pub source_id:         Uuid,
  pub target_type:       EntityKind,
  pub target_id:         Uuid,
  /// Free-text label, e.g. "sibling", "rival", "located in".
  pub relationship_type: String,
  /// 1 (faint) to 10 (defining).
  pub strength:          Option<i32>,
  pub description:       Option<String>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Relationship {
  /// Whether `(kind, id)` is either end of this edge.
  pub fn touches(&self, kind: EntityKind, id: Uuid) -> bool {
    (self.source_type == kind && self.source_id == id)
      || (self.target_type == kind && self.target_id == id)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRelationship {
  pub project_id:        Uuid,
  pub source_type:       EntityKind,
  pub source_id:         Uuid,
  pub target_type:       EntityKind,
  pub target_id:         Uuid,
  pub relationship_type: String,
  pub strength:          Option<i32>,
  pub description:       Option<String>,
}

impl NewRelationship {
  pub fn between(
    project_id: Uuid,
    source: Reference,
    target: Reference,
    relationship_type: impl Into<String>,
  ) -> Self {
    Self {
      project_id,
      source_type: source.kind,
      source_id: source.id,
      target_type: target.kind,
      target_id: target.id,
      relationship_type: relationship_type.into(),
      strength: None,
      description: None,
    }
  }
}

/// Endpoints are fixed once created; delete and recreate to re-point an edge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipPatch {
  #[serde(default)]
  pub relationship_type: Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub strength:          Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description:       Option<Option<String>>,
}

impl Scoped for NewRelationship {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewRelationship {
  fn validate(&self) -> Result<()> {
    for (field, kind) in [("source_type", self.source_type), ("target_type", self.target_type)] {
      if !kind.is_relationship_endpoint() {
        return Err(Error::invalid(field, format!("{kind} cannot be a relationship endpoint")));
      }
    }
    if self.source_type == self.target_type && self.source_id == self.target_id {
      return Err(Error::invalid("target_id", "a record cannot relate to itself"));
    }
    validate::required("relationship_type", &self.relationship_type)?;
    validate::in_range("strength", self.strength, 1, 10)
  }
}

impl Validate for RelationshipPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("relationship_type", self.relationship_type.as_ref())?;
    validate::in_range("strength", self.strength.flatten(), 1, 10)
  }
}

impl Entity for Relationship {
  type Draft = NewRelationship;
  type Patch = RelationshipPatch;

  const KIND: EntityKind = EntityKind::Relationship;
  const TEXT_FIELD: Option<&'static str> = None;

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.relationship_type }

  fn references(&self) -> Vec<Reference> {
    vec![
      Reference { kind: self.source_type, id: self.source_id },
      Reference { kind: self.target_type, id: self.target_id },
    ]
  }

  fn from_draft(id: Uuid, d: NewRelationship, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      source_type: d.source_type,
      source_id: d.source_id,
      target_type: d.target_type,
      target_id: d.target_id,
      relationship_type: d.relationship_type,
      strength: d.strength,
      description: d.description,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: RelationshipPatch, at: DateTime<Utc>) {
    set(&mut self.relationship_type, p.relationship_type);
    set(&mut self.strength, p.strength);
    set(&mut self.description, p.description);
    self.updated_at = at;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(source: EntityKind, target: EntityKind) -> NewRelationship {
    NewRelationship::between(
      Uuid::new_v4(),
      Reference { kind: source, id: Uuid::new_v4() },
      Reference { kind: target, id: Uuid::new_v4() },
      "rival",
    )
  }

  #[test]
  fn endpoints_must_be_leaf_records() {
    assert!(draft(EntityKind::Character, EntityKind::Location).validate().is_ok());
    assert!(draft(EntityKind::Project, EntityKind::Location).validate().is_err());
    assert!(draft(EntityKind::Character, EntityKind::Relationship).validate().is_err());
  }

  #[test]
  fn self_edges_are_rejected() {
    let id = Uuid::new_v4();
    let r = Reference { kind: EntityKind::Character, id };
    assert!(NewRelationship::between(Uuid::new_v4(), r, r, "self").validate().is_err());
  }

  #[test]
  fn strength_is_bounded() {
    let mut d = draft(EntityKind::Character, EntityKind::Character);
    d.strength = Some(11);
    assert!(d.validate().is_err());
    d.strength = Some(7);
    assert!(d.validate().is_ok());
  }

  #[test]
  fn touches_either_side() {
    let at = Utc::now();
    let r = Relationship::from_draft(Uuid::new_v4(), draft(EntityKind::Character, EntityKind::Race), at);
    assert!(r.touches(EntityKind::Character, r.source_id));
    assert!(r.touches(EntityKind::Race, r.target_id));
    assert!(!r.touches(EntityKind::Character, r.target_id));
  }
}
