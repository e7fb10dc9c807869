//! The leaf records of a story world: characters, places, history, magic,
//! peoples, lore and notes.
//!
//! Each record is flat and belongs to exactly one project. Long-form fields
//! (`description`, `content`) hold rich text; see `mythos-blocks`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, Reference, Scoped, nullable, set},
  kind::EntityKind,
  validate::{self, Validate},
};

// ─── Character ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
  pub id:          Uuid,
  pub project_id:  Uuid,
  pub name:        String,
  pub title:       Option<String>,
  /// Narrative role, e.g. "protagonist", "mentor".
  pub role:        Option<String>,
  pub race:        Option<String>,
  pub age:         Option<String>,
  pub affiliation: Option<String>,
  pub description: Option<String>,
  pub image_url:   Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCharacter {
  pub project_id:  Uuid,
  pub name:        String,
  pub title:       Option<String>,
  pub role:        Option<String>,
  pub race:        Option<String>,
  pub age:         Option<String>,
  pub affiliation: Option<String>,
  pub description: Option<String>,
  pub image_url:   Option<String>,
}

impl NewCharacter {
  pub fn new(project_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      project_id,
      name: name.into(),
      title: None,
      role: None,
      race: None,
      age: None,
      affiliation: None,
      description: None,
      image_url: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterPatch {
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub title:       Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub role:        Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub race:        Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub age:         Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub affiliation: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub image_url:   Option<Option<String>>,
}

impl Scoped for NewCharacter {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewCharacter {
  fn validate(&self) -> Result<()> {
    validate::required("name", &self.name)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

impl Validate for CharacterPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("name", self.name.as_ref())?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

impl Entity for Character {
  type Draft = NewCharacter;
  type Patch = CharacterPatch;

  const KIND: EntityKind = EntityKind::Character;
  const TEXT_FIELD: Option<&'static str> = Some("description");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.name }

  fn rich_text(&self) -> Option<&str> { self.description.as_deref() }

  fn image_url(&self) -> Option<&str> { self.image_url.as_deref() }

  fn from_draft(id: Uuid, d: NewCharacter, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      name: d.name,
      title: d.title,
      role: d.role,
      race: d.race,
      age: d.age,
      affiliation: d.affiliation,
      description: d.description,
      image_url: d.image_url,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: CharacterPatch, at: DateTime<Utc>) {
    set(&mut self.name, p.name);
    set(&mut self.title, p.title);
    set(&mut self.role, p.role);
    set(&mut self.race, p.race);
    set(&mut self.age, p.age);
    set(&mut self.affiliation, p.affiliation);
    set(&mut self.description, p.description);
    set(&mut self.image_url, p.image_url);
    self.updated_at = at;
  }
}

// ─── Location ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub id:            Uuid,
  pub project_id:    Uuid,
  pub name:          String,
  /// City, forest, ruin…
  pub location_type: Option<String>,
  pub region:        Option<String>,
  pub climate:       Option<String>,
  pub population:    Option<String>,
  pub description:   Option<String>,
  pub image_url:     Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
  pub project_id:    Uuid,
  pub name:          String,
  pub location_type: Option<String>,
  pub region:        Option<String>,
  pub climate:       Option<String>,
  pub population:    Option<String>,
  pub description:   Option<String>,
  pub image_url:     Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationPatch {
  #[serde(default)]
  pub name:          Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub location_type: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub region:        Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub climate:       Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub population:    Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description:   Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub image_url:     Option<Option<String>>,
}

impl Scoped for NewLocation {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewLocation {
  fn validate(&self) -> Result<()> {
    validate::required("name", &self.name)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

impl Validate for LocationPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("name", self.name.as_ref())?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

impl Entity for Location {
  type Draft = NewLocation;
  type Patch = LocationPatch;

  const KIND: EntityKind = EntityKind::Location;
  const TEXT_FIELD: Option<&'static str> = Some("description");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.name }

  fn rich_text(&self) -> Option<&str> { self.description.as_deref() }

  fn image_url(&self) -> Option<&str> { self.image_url.as_deref() }

  fn from_draft(id: Uuid, d: NewLocation, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      name: d.name,
      location_type: d.location_type,
      region: d.region,
      climate: d.climate,
      population: d.population,
      description: d.description,
      image_url: d.image_url,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: LocationPatch, at: DateTime<Utc>) {
    set(&mut self.name, p.name);
    set(&mut self.location_type, p.location_type);
    set(&mut self.region, p.region);
    set(&mut self.climate, p.climate);
    set(&mut self.population, p.population);
    set(&mut self.description, p.description);
    set(&mut self.image_url, p.image_url);
    self.updated_at = at;
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A point in the world's history. `(year, month, day)` only orders and
/// groups events on the timeline; month and day are not checked against any
/// calendar, since worlds invent their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:           Uuid,
  pub project_id:   Uuid,
  pub title:        String,
  pub event_type:   Option<String>,
  pub year:         Option<i32>,
  pub month:        Option<i32>,
  pub day:          Option<i32>,
  pub significance: Option<String>,
  pub description:  Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub project_id:   Uuid,
  pub title:        String,
  pub event_type:   Option<String>,
  pub year:         Option<i32>,
  pub month:        Option<i32>,
  pub day:          Option<i32>,
  pub significance: Option<String>,
  pub description:  Option<String>,
}

impl NewEvent {
  pub fn dated(project_id: Uuid, title: impl Into<String>, year: i32, month: i32, day: i32) -> Self {
    Self {
      project_id,
      title: title.into(),
      event_type: None,
      year: Some(year),
      month: Some(month),
      day: Some(day),
      significance: None,
      description: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
  #[serde(default)]
  pub title:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub event_type:   Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub year:         Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub month:        Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub day:          Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub significance: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description:  Option<Option<String>>,
}

impl Scoped for NewEvent {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewEvent {
  fn validate(&self) -> Result<()> {
    validate::required("title", &self.title)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

impl Validate for EventPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("title", self.title.as_ref())?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

impl Entity for Event {
  type Draft = NewEvent;
  type Patch = EventPatch;

  const KIND: EntityKind = EntityKind::Event;
  const TEXT_FIELD: Option<&'static str> = Some("description");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.title }

  fn rich_text(&self) -> Option<&str> { self.description.as_deref() }

  fn from_draft(id: Uuid, d: NewEvent, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      title: d.title,
      event_type: d.event_type,
      year: d.year,
      month: d.month,
      day: d.day,
      significance: d.significance,
      description: d.description,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: EventPatch, at: DateTime<Utc>) {
    set(&mut self.title, p.title);
    set(&mut self.event_type, p.event_type);
    set(&mut self.year, p.year);
    set(&mut self.month, p.month);
    set(&mut self.day, p.day);
    set(&mut self.significance, p.significance);
    set(&mut self.description, p.description);
    self.updated_at = at;
  }
}

// ─── MagicSystem ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicSystem {
  pub id:          Uuid,
  pub project_id:  Uuid,
  pub name:        String,
  /// Where the power comes from.
  pub source:      Option<String>,
  /// What using it costs the caster.
  pub cost:        Option<String>,
  pub limitations: Option<String>,
  pub description: Option<String>,
  pub image_url:   Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMagicSystem {
  pub project_id:  Uuid,
  pub name:        String,
  pub source:      Option<String>,
  pub cost:        Option<String>,
  pub limitations: Option<String>,
  pub description: Option<String>,
  pub image_url:   Option<String>,
}

impl NewMagicSystem {
  pub fn new(project_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      project_id,
      name: name.into(),
      source: None,
      cost: None,
      limitations: None,
      description: None,
      image_url: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MagicSystemPatch {
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub source:      Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub cost:        Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub limitations: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub image_url:   Option<Option<String>>,
}

impl Scoped for NewMagicSystem {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewMagicSystem {
  fn validate(&self) -> Result<()> {
    validate::required("name", &self.name)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

impl Validate for MagicSystemPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("name", self.name.as_ref())?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

impl Entity for MagicSystem {
  type Draft = NewMagicSystem;
  type Patch = MagicSystemPatch;

  const KIND: EntityKind = EntityKind::MagicSystem;
  const TEXT_FIELD: Option<&'static str> = Some("description");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.name }

  fn rich_text(&self) -> Option<&str> { self.description.as_deref() }

  fn image_url(&self) -> Option<&str> { self.image_url.as_deref() }

  fn from_draft(id: Uuid, d: NewMagicSystem, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      name: d.name,
      source: d.source,
      cost: d.cost,
      limitations: d.limitations,
      description: d.description,
      image_url: d.image_url,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: MagicSystemPatch, at: DateTime<Utc>) {
    set(&mut self.name, p.name);
    set(&mut self.source, p.source);
    set(&mut self.cost, p.cost);
    set(&mut self.limitations, p.limitations);
    set(&mut self.description, p.description);
    set(&mut self.image_url, p.image_url);
    self.updated_at = at;
  }
}

// ─── Spell ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
  pub id:              Uuid,
  pub project_id:      Uuid,
  /// The system this spell belongs to; must be in the same project.
  pub magic_system_id: Option<Uuid>,
  pub name:            String,
  pub school:          Option<String>,
  pub level:           Option<i32>,
  pub casting_time:    Option<String>,
  pub range:           Option<String>,
  pub components:      Option<String>,
  pub effect:          Option<String>,
  pub description:     Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSpell {
  pub project_id:      Uuid,
  pub magic_system_id: Option<Uuid>,
  pub name:            String,
  pub school:          Option<String>,
  pub level:           Option<i32>,
  pub casting_time:    Option<String>,
  pub range:           Option<String>,
  pub components:      Option<String>,
  pub effect:          Option<String>,
  pub description:     Option<String>,
}

impl NewSpell {
  pub fn new(project_id: Uuid, name: impl Into<String>, magic_system_id: Option<Uuid>) -> Self {
    Self {
      project_id,
      magic_system_id,
      name: name.into(),
      school: None,
      level: None,
      casting_time: None,
      range: None,
      components: None,
      effect: None,
      description: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpellPatch {
  #[serde(default, deserialize_with = "nullable")]
  pub magic_system_id: Option<Option<Uuid>>,
  #[serde(default)]
  pub name:            Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub school:          Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub level:           Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub casting_time:    Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub range:           Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub components:      Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub effect:          Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description:     Option<Option<String>>,
}

impl Scoped for NewSpell {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewSpell {
  fn validate(&self) -> Result<()> {
    validate::required("name", &self.name)?;
    validate::in_range("level", self.level, 0, 99)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

impl Validate for SpellPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("name", self.name.as_ref())?;
    validate::in_range("level", self.level.flatten(), 0, 99)?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

impl Entity for Spell {
  type Draft = NewSpell;
  type Patch = SpellPatch;

  const KIND: EntityKind = EntityKind::Spell;
  const TEXT_FIELD: Option<&'static str> = Some("description");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.name }

  fn rich_text(&self) -> Option<&str> { self.description.as_deref() }

  fn references(&self) -> Vec<Reference> {
    self
      .magic_system_id
      .map(|id| Reference { kind: EntityKind::MagicSystem, id })
      .into_iter()
      .collect()
  }

  fn from_draft(id: Uuid, d: NewSpell, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      magic_system_id: d.magic_system_id,
      name: d.name,
      school: d.school,
      level: d.level,
      casting_time: d.casting_time,
      range: d.range,
      components: d.components,
      effect: d.effect,
      description: d.description,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: SpellPatch, at: DateTime<Utc>) {
    set(&mut self.magic_system_id, p.magic_system_id);
    set(&mut self.name, p.name);
    set(&mut self.school, p.school);
    set(&mut self.level, p.level);
    set(&mut self.casting_time, p.casting_time);
    set(&mut self.range, p.range);
    set(&mut self.components, p.components);
    set(&mut self.effect, p.effect);
    set(&mut self.description, p.description);
    self.updated_at = at;
  }
}

// ─── Lore ────────────────────────────────────────────────────────────────────

/// A piece of in-world knowledge: myths, histories, customs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreEntry {
  pub id:         Uuid,
  pub project_id: Uuid,
  pub title:      String,
  pub category:   Option<String>,
  pub content:    Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLoreEntry {
  pub project_id: Uuid,
  pub title:      String,
  pub category:   Option<String>,
  pub content:    Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoreEntryPatch {
  #[serde(default)]
  pub title:    Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub category: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub content:  Option<Option<String>>,
}

impl Scoped for NewLoreEntry {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewLoreEntry {
  fn validate(&self) -> Result<()> {
    validate::required("title", &self.title)?;
    validate::rich_text("content", self.content.as_deref())
  }
}

impl Validate for LoreEntryPatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("title", self.title.as_ref())?;
    validate::rich_text_patch("content", self.content.as_ref())
  }
}

impl Entity for LoreEntry {
  type Draft = NewLoreEntry;
  type Patch = LoreEntryPatch;

  const KIND: EntityKind = EntityKind::Lore;
  const TEXT_FIELD: Option<&'static str> = Some("content");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.title }

  fn rich_text(&self) -> Option<&str> { self.content.as_deref() }

  fn from_draft(id: Uuid, d: NewLoreEntry, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      title: d.title,
      category: d.category,
      content: d.content,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: LoreEntryPatch, at: DateTime<Utc>) {
    set(&mut self.title, p.title);
    set(&mut self.category, p.category);
    set(&mut self.content, p.content);
    self.updated_at = at;
  }
}

// ─── Note ────────────────────────────────────────────────────────────────────

/// An out-of-world note from the author to themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
  pub id:         Uuid,
  pub project_id: Uuid,
  pub title:      String,
  pub category:   Option<String>,
  pub content:    Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
  pub project_id: Uuid,
  pub title:      String,
  pub category:   Option<String>,
  pub content:    Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePatch {
  #[serde(default)]
  pub title:    Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub category: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub content:  Option<Option<String>>,
}

impl Scoped for NewNote {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewNote {
  fn validate(&self) -> Result<()> {
    validate::required("title", &self.title)?;
    validate::rich_text("content", self.content.as_deref())
  }
}

impl Validate for NotePatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("title", self.title.as_ref())?;
    validate::rich_text_patch("content", self.content.as_ref())
  }
}

impl Entity for Note {
  type Draft = NewNote;
  type Patch = NotePatch;

  const KIND: EntityKind = EntityKind::Note;
  const TEXT_FIELD: Option<&'static str> = Some("content");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.title }

  fn rich_text(&self) -> Option<&str> { self.content.as_deref() }

  fn from_draft(id: Uuid, d: NewNote, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      title: d.title,
      category: d.category,
      content: d.content,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: NotePatch, at: DateTime<Utc>) {
    set(&mut self.title, p.title);
    set(&mut self.category, p.category);
    set(&mut self.content, p.content);
    self.updated_at = at;
  }
}

// ─── Race ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
  pub id:          Uuid,
  pub project_id:  Uuid,
  pub name:        String,
  pub lifespan:    Option<String>,
  pub homeland:    Option<String>,
  pub traits:      Option<String>,
  pub description: Option<String>,
  pub image_url:   Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRace {
  pub project_id:  Uuid,
  pub name:        String,
  pub lifespan:    Option<String>,
  pub homeland:    Option<String>,
  pub traits:      Option<String>,
  pub description: Option<String>,
  pub image_url:   Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RacePatch {
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub lifespan:    Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub homeland:    Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub traits:      Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub image_url:   Option<Option<String>>,
}

impl Scoped for NewRace {
  fn project_id(&self) -> Uuid { self.project_id }
}

impl Validate for NewRace {
  fn validate(&self) -> Result<()> {
    validate::required("name", &self.name)?;
    validate::rich_text("description", self.description.as_deref())
  }
}

impl Validate for RacePatch {
  fn validate(&self) -> Result<()> {
    validate::required_if_present("name", self.name.as_ref())?;
    validate::rich_text_patch("description", self.description.as_ref())
  }
}

impl Entity for Race {
  type Draft = NewRace;
  type Patch = RacePatch;

  const KIND: EntityKind = EntityKind::Race;
  const TEXT_FIELD: Option<&'static str> = Some("description");

  fn id(&self) -> Uuid { self.id }

  fn project_id(&self) -> Uuid { self.project_id }

  fn label(&self) -> &str { &self.name }

  fn rich_text(&self) -> Option<&str> { self.description.as_deref() }

  fn image_url(&self) -> Option<&str> { self.image_url.as_deref() }

  fn from_draft(id: Uuid, d: NewRace, at: DateTime<Utc>) -> Self {
    Self {
      id,
      project_id: d.project_id,
      name: d.name,
      lifespan: d.lifespan,
      homeland: d.homeland,
      traits: d.traits,
      description: d.description,
      image_url: d.image_url,
      created_at: at,
      updated_at: at,
    }
  }

  fn apply(&mut self, p: RacePatch, at: DateTime<Utc>) {
    set(&mut self.name, p.name);
    set(&mut self.lifespan, p.lifespan);
    set(&mut self.homeland, p.homeland);
    set(&mut self.traits, p.traits);
    set(&mut self.description, p.description);
    set(&mut self.image_url, p.image_url);
    self.updated_at = at;
  }
}
