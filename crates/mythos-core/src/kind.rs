//! The kinds of record a project owns.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Discriminant for every table in the store. Serialised in snake_case,
/// which is also the `source_type`/`target_type` form used by relationships.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Project,
  Character,
  Location,
  Event,
  MagicSystem,
  Spell,
  Lore,
  Note,
  Race,
  Relationship,
}

impl EntityKind {
  /// Every project-scoped kind, in the order a project's rows are deleted.
  pub const LEAVES: [EntityKind; 9] = [
    EntityKind::Spell,
    EntityKind::Relationship,
    EntityKind::Character,
    EntityKind::Event,
    EntityKind::MagicSystem,
    EntityKind::Location,
    EntityKind::Lore,
    EntityKind::Note,
    EntityKind::Race,
  ];

  /// Backing SQL table.
  pub fn table(self) -> &'static str {
    match self {
      Self::Project => "projects",
      Self::Character => "characters",
      Self::Location => "locations",
      Self::Event => "events",
      Self::MagicSystem => "magic_systems",
      Self::Spell => "spells",
      Self::Lore => "lore_entries",
      Self::Note => "notes",
      Self::Race => "races",
      Self::Relationship => "relationships",
    }
  }

  /// URL path segment, e.g. `magic-systems`.
  pub fn route(self) -> &'static str {
    match self {
      Self::Project => "projects",
      Self::Character => "characters",
      Self::Location => "locations",
      Self::Event => "events",
      Self::MagicSystem => "magic-systems",
      Self::Spell => "spells",
      Self::Lore => "lore",
      Self::Note => "notes",
      Self::Race => "races",
      Self::Relationship => "relationships",
    }
  }

  /// Whether a relationship edge may start or end at this kind.
  pub fn is_relationship_endpoint(self) -> bool {
    !matches!(self, Self::Project | Self::Relationship)
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn string_forms_agree() {
    for kind in EntityKind::iter() {
      let serde_form = serde_json::to_value(kind).unwrap();
      assert_eq!(serde_form.as_str(), Some(kind.to_string().as_str()));
      assert_eq!(EntityKind::from_str(&kind.to_string()).unwrap(), kind);
    }
    assert_eq!(EntityKind::MagicSystem.to_string(), "magic_system");
  }

  #[test]
  fn leaves_cover_every_scoped_kind() {
    let mut leaves = EntityKind::LEAVES.to_vec();
    leaves.sort();
    let expected: Vec<_> = EntityKind::iter().filter(|k| *k != EntityKind::Project).collect();
    assert_eq!(leaves, expected);
  }
}
