//! [`MemoryStore`]: an in-memory implementation of [`WorldStore`].

use std::{
  collections::{BTreeMap, HashSet},
  sync::Arc,
};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use mythos_core::{
  Entity, EntityKind, Error, Reference, Result,
  activity::{ActivityEntry, NewActivity},
  link::{CharacterSpell, EventCharacter, Relationship},
  project::{NewProject, Project, ProjectPatch, ProjectStats},
  store::WorldStore,
  validate::Validate as _,
  world::Character,
};

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Records are held in their serialised form, one insertion-ordered table
/// per kind, so generic operations can read `id` and `project_id` without
/// knowing the concrete type.
#[derive(Default)]
struct World {
  projects:         Vec<Project>,
  tables:           BTreeMap<EntityKind, Vec<Value>>,
  character_spells: Vec<CharacterSpell>,
  event_characters: Vec<EventCharacter>,
  activity:         Vec<ActivityEntry>,
  /// `(file name, owner id)` upload claims.
  uploads:          HashSet<(String, String)>,
}

fn field<'a>(row: &'a Value, name: &str) -> Option<&'a str> {
  row.get(name).and_then(Value::as_str)
}

fn is(row: &Value, name: &str, id: Uuid) -> bool {
  field(row, name).and_then(|s| Uuid::parse_str(s).ok()) == Some(id)
}

fn row_id(row: &Value) -> Option<Uuid> {
  field(row, "id").and_then(|s| Uuid::parse_str(s).ok())
}

impl World {
  fn rows(&self, kind: EntityKind) -> &[Value] {
    self.tables.get(&kind).map(Vec::as_slice).unwrap_or_default()
  }

  fn find(&self, kind: EntityKind, id: Uuid) -> Option<&Value> {
    self.rows(kind).iter().find(|r| is(r, "id", id))
  }

  fn project_of(&self, kind: EntityKind, id: Uuid) -> Option<Uuid> {
    self
      .find(kind, id)
      .and_then(|r| field(r, "project_id"))
      .and_then(|s| Uuid::parse_str(s).ok())
  }

  fn has_project(&self, id: Uuid) -> bool {
    self.projects.iter().any(|p| p.id == id)
  }

  fn check_scope(&self, project_id: Uuid, refs: &[Reference]) -> Result<()> {
    if !self.has_project(project_id) {
      return Err(Error::ProjectNotFound(project_id));
    }
    for r in refs {
      if self.project_of(r.kind, r.id) != Some(project_id) {
        return Err(Error::DanglingReference { kind: r.kind, id: r.id, project_id });
      }
    }
    Ok(())
  }

  fn check_pair(&self, left: Reference, right: Reference) -> Result<()> {
    let l = self.project_of(left.kind, left.id).ok_or(Error::not_found(left.kind, left.id))?;
    let r = self.project_of(right.kind, right.id).ok_or(Error::not_found(right.kind, right.id))?;
    if l != r {
      return Err(Error::invalid(
        "project_id",
        format!("{} and {} belong to different projects", left.kind, right.kind),
      ));
    }
    Ok(())
  }

  fn purge_relationships(&mut self, kind: EntityKind, id: Uuid) {
    let kind = kind.to_string();
    if let Some(rows) = self.tables.get_mut(&EntityKind::Relationship) {
      rows.retain(|r| {
        let source = field(r, "source_type") == Some(kind.as_str()) && is(r, "source_id", id);
        let target = field(r, "target_type") == Some(kind.as_str()) && is(r, "target_id", id);
        !(source || target)
      });
    }
  }

  /// Remove a record and everything that depends on it.
  fn delete_cascade(&mut self, kind: EntityKind, id: Uuid) -> Option<Value> {
    let rows = self.tables.get_mut(&kind)?;
    let at = rows.iter().position(|r| is(r, "id", id))?;
    let row = rows.remove(at);

    match kind {
      EntityKind::Character => {
        self.character_spells.retain(|l| l.character_id != id);
        self.event_characters.retain(|l| l.character_id != id);
      }
      EntityKind::Spell => self.character_spells.retain(|l| l.spell_id != id),
      EntityKind::Event => self.event_characters.retain(|l| l.event_id != id),
      EntityKind::MagicSystem => {
        let spells: Vec<Uuid> = self
          .rows(EntityKind::Spell)
          .iter()
          .filter(|r| is(r, "magic_system_id", id))
          .filter_map(row_id)
          .collect();
        for spell in spells {
          self.delete_cascade(EntityKind::Spell, spell);
        }
      }
      _ => {}
    }
    if kind != EntityKind::Relationship {
      self.purge_relationships(kind, id);
    }
    Some(row)
  }

  /// Whether any project or row mentions `name` in an image URL or rich text.
  fn mentions_image(&self, name: &str) -> bool {
    let mentions = |s: Option<&str>| s.is_some_and(|s| s.contains(name));
    self
      .projects
      .iter()
      .any(|p| mentions(p.image_url.as_deref()) || mentions(p.description.as_deref()))
      || self.tables.iter().any(|(kind, rows)| {
        *kind != EntityKind::Relationship
          && rows.iter().any(|r| {
            ["image_url", "description", "content"].into_iter().any(|f| mentions(field(r, f)))
          })
      })
  }

  fn delete_project(&mut self, id: Uuid) -> bool {
    let before = self.projects.len();
    self.projects.retain(|p| p.id != id);
    if self.projects.len() == before {
      return false;
    }

    let mut gone = HashSet::new();
    for rows in self.tables.values_mut() {
      rows.retain(|r| {
        if is(r, "project_id", id) {
          gone.extend(row_id(r));
          false
        } else {
          true
        }
      });
    }
    self.character_spells.retain(|l| !gone.contains(&l.character_id));
    self.event_characters.retain(|l| !gone.contains(&l.event_id));
    true
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A world store that lives in process memory.
///
/// Cloning is cheap and clones share the same data. Every mutation,
/// cascades included, runs under a single write lock.
#[derive(Clone, Default)]
pub struct MemoryStore {
  world: Arc<RwLock<World>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

fn decode<T: serde::de::DeserializeOwned>(row: Value) -> Result<T> {
  Ok(serde_json::from_value(row)?)
}

impl WorldStore for MemoryStore {
  type Error = Error;

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, owner_id: String, input: NewProject) -> Result<Project> {
    input.validate()?;
    let project = Project::new(Uuid::new_v4(), owner_id, input, Utc::now());
    self.world.write().await.projects.push(project.clone());
    Ok(project)
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    let world = self.world.read().await;
    Ok(world.projects.iter().find(|p| p.id == id).cloned())
  }

  async fn list_projects<'a>(&'a self, owner_id: &'a str) -> Result<Vec<Project>> {
    let world = self.world.read().await;
    Ok(world.projects.iter().filter(|p| p.owner_id == owner_id).cloned().collect())
  }

  async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> Result<Option<Project>> {
    patch.validate()?;
    let mut world = self.world.write().await;
    let Some(project) = world.projects.iter_mut().find(|p| p.id == id) else {
      return Ok(None);
    };
    project.apply(patch, Utc::now());
    Ok(Some(project.clone()))
  }

  async fn delete_project(&self, id: Uuid) -> Result<bool> {
    Ok(self.world.write().await.delete_project(id))
  }

  async fn project_stats(&self, id: Uuid) -> Result<ProjectStats> {
    let world = self.world.read().await;
    if !world.has_project(id) {
      return Err(Error::ProjectNotFound(id));
    }
    let counts = EntityKind::LEAVES
      .into_iter()
      .map(|kind| {
        let n = world.rows(kind).iter().filter(|r| is(r, "project_id", id)).count();
        (kind, n as u64)
      })
      .collect();
    Ok(ProjectStats { project_id: id, counts })
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn create<E: Entity>(&self, draft: E::Draft) -> Result<E> {
    draft.validate()?;
    let record = E::from_draft(Uuid::new_v4(), draft, Utc::now());
    let row = serde_json::to_value(&record)?;

    let mut world = self.world.write().await;
    world.check_scope(record.project_id(), &record.references())?;
    world.tables.entry(E::KIND).or_default().push(row);
    Ok(record)
  }

  async fn get<E: Entity>(&self, id: Uuid) -> Result<Option<E>> {
    let world = self.world.read().await;
    world.find(E::KIND, id).cloned().map(decode).transpose()
  }

  async fn list<E: Entity>(&self, project_id: Uuid) -> Result<Vec<E>> {
    let world = self.world.read().await;
    world
      .rows(E::KIND)
      .iter()
      .filter(|r| is(r, "project_id", project_id))
      .cloned()
      .map(decode)
      .collect()
  }

  async fn update<E: Entity>(&self, id: Uuid, patch: E::Patch) -> Result<Option<E>> {
    patch.validate()?;
    let mut world = self.world.write().await;
    let Some(row) = world.find(E::KIND, id).cloned() else {
      return Ok(None);
    };
    let mut record: E = decode(row)?;
    record.apply(patch, Utc::now());
    world.check_scope(record.project_id(), &record.references())?;

    let row = serde_json::to_value(&record)?;
    if let Some(slot) = world
      .tables
      .get_mut(&E::KIND)
      .and_then(|rows| rows.iter_mut().find(|r| is(r, "id", id)))
    {
      *slot = row;
    }
    Ok(Some(record))
  }

  async fn delete<E: Entity>(&self, id: Uuid) -> Result<Option<E>> {
    let row = self.world.write().await.delete_cascade(E::KIND, id);
    row.map(decode).transpose()
  }

  // ── Junctions ─────────────────────────────────────────────────────────────

  async fn link_spell(
    &self,
    character_id: Uuid,
    spell_id:     Uuid,
    proficiency:  Option<String>,
  ) -> Result<CharacterSpell> {
    let mut world = self.world.write().await;
    world.check_pair(
      Reference { kind: EntityKind::Character, id: character_id },
      Reference { kind: EntityKind::Spell, id: spell_id },
    )?;
    if world
      .character_spells
      .iter()
      .any(|l| l.character_id == character_id && l.spell_id == spell_id)
    {
      return Err(Error::AlreadyLinked { left: character_id, right: spell_id });
    }
    let link = CharacterSpell { character_id, spell_id, proficiency, created_at: Utc::now() };
    world.character_spells.push(link.clone());
    Ok(link)
  }

  async fn unlink_spell(&self, character_id: Uuid, spell_id: Uuid) -> Result<bool> {
    let mut world = self.world.write().await;
    let before = world.character_spells.len();
    world
      .character_spells
      .retain(|l| !(l.character_id == character_id && l.spell_id == spell_id));
    Ok(world.character_spells.len() < before)
  }

  async fn spells_of_character(&self, character_id: Uuid) -> Result<Vec<CharacterSpell>> {
    let world = self.world.read().await;
    Ok(
      world
        .character_spells
        .iter()
        .filter(|l| l.character_id == character_id)
        .cloned()
        .collect(),
    )
  }

  async fn link_event_character(
    &self,
    event_id:     Uuid,
    character_id: Uuid,
    role:         Option<String>,
  ) -> Result<EventCharacter> {
    let mut world = self.world.write().await;
    world.check_pair(
      Reference { kind: EntityKind::Event, id: event_id },
      Reference { kind: EntityKind::Character, id: character_id },
    )?;
    if world
      .event_characters
      .iter()
      .any(|l| l.event_id == event_id && l.character_id == character_id)
    {
      return Err(Error::AlreadyLinked { left: event_id, right: character_id });
    }
    let link = EventCharacter { event_id, character_id, role, created_at: Utc::now() };
    world.event_characters.push(link.clone());
    Ok(link)
  }

  async fn unlink_event_character(&self, event_id: Uuid, character_id: Uuid) -> Result<bool> {
    let mut world = self.world.write().await;
    let before = world.event_characters.len();
    world
      .event_characters
      .retain(|l| !(l.event_id == event_id && l.character_id == character_id));
    Ok(world.event_characters.len() < before)
  }

  async fn characters_of_event(&self, event_id: Uuid) -> Result<Vec<EventCharacter>> {
    let world = self.world.read().await;
    Ok(world.event_characters.iter().filter(|l| l.event_id == event_id).cloned().collect())
  }

  async fn events_of_character(&self, character_id: Uuid) -> Result<Vec<EventCharacter>> {
    let world = self.world.read().await;
    Ok(
      world
        .event_characters
        .iter()
        .filter(|l| l.character_id == character_id)
        .cloned()
        .collect(),
    )
  }

  async fn characters_using_magic_system(&self, magic_system_id: Uuid) -> Result<Vec<Character>> {
    let world = self.world.read().await;
    let spells: HashSet<Uuid> = world
      .rows(EntityKind::Spell)
      .iter()
      .filter(|r| is(r, "magic_system_id", magic_system_id))
      .filter_map(row_id)
      .collect();
    let users: HashSet<Uuid> = world
      .character_spells
      .iter()
      .filter(|l| spells.contains(&l.spell_id))
      .map(|l| l.character_id)
      .collect();
    world
      .rows(EntityKind::Character)
      .iter()
      .filter(|r| row_id(r).is_some_and(|id| users.contains(&id)))
      .cloned()
      .map(decode)
      .collect()
  }

  async fn relationships_of(&self, kind: EntityKind, id: Uuid) -> Result<Vec<Relationship>> {
    let world = self.world.read().await;
    let mut out = Vec::new();
    for row in world.rows(EntityKind::Relationship) {
      let edge: Relationship = decode(row.clone())?;
      if edge.touches(kind, id) {
        out.push(edge);
      }
    }
    Ok(out)
  }

  // ── Activity ──────────────────────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<ActivityEntry> {
    let entry = ActivityEntry::new(Uuid::new_v4(), input, Utc::now());
    self.world.write().await.activity.push(entry.clone());
    Ok(entry)
  }

  async fn list_activity(&self, project_id: Uuid, limit: usize) -> Result<Vec<ActivityEntry>> {
    let world = self.world.read().await;
    Ok(
      world
        .activity
        .iter()
        .rev()
        .filter(|a| a.project_id == Some(project_id))
        .take(limit)
        .cloned()
        .collect(),
    )
  }

  // ── Uploads ───────────────────────────────────────────────────────────────

  async fn claim_upload(&self, owner_id: String, name: String) -> Result<()> {
    self.world.write().await.uploads.insert((name, owner_id));
    Ok(())
  }

  async fn release_upload<'a>(&'a self, owner_id: &'a str, name: &'a str) -> Result<bool> {
    let mut world = self.world.write().await;
    Ok(world.uploads.remove(&(name.to_owned(), owner_id.to_owned())))
  }

  async fn upload_claimed<'a>(&'a self, name: &'a str) -> Result<bool> {
    let world = self.world.read().await;
    Ok(world.uploads.iter().any(|(n, _)| n == name))
  }

  async fn image_referenced<'a>(&'a self, name: &'a str) -> Result<bool> {
    Ok(self.world.read().await.mentions_image(name))
  }
}
