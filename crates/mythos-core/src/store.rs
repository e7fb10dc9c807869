//! The `WorldStore` trait.
//!
//! Implemented by storage backends (`mythos-store-sqlite`,
//! `mythos-store-memory`). The API layer depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  activity::{ActivityEntry, NewActivity},
  entity::Entity,
  kind::EntityKind,
  link::{CharacterSpell, EventCharacter, Relationship},
  project::{NewProject, Project, ProjectPatch, ProjectStats},
  search::{self, SearchHit, SearchQuery},
  world::{Character, Event, Location, LoreEntry, MagicSystem, Note, Race, Spell},
};

/// Abstraction over a Mythos store backend.
///
/// Ownership is not checked here; callers authorise against
/// [`Project::owner_id`] before touching a project's records.
///
/// Backends must uphold:
///
/// - every record's `project_id` names an existing project, and every
///   [`Entity::references`] target exists in that same project;
/// - deletes cascade: a project takes all of its records with it, a record
///   takes its junction rows and any relationship touching it, and a magic
///   system takes its spells;
/// - a cascade is all-or-nothing;
/// - lists come back in insertion order.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait WorldStore: Send + Sync {
  type Error: std::error::Error + crate::DomainError + Send + Sync + 'static;

  // ── Projects ──────────────────────────────────────────────────────────

  fn create_project(
    &self,
    owner_id: String,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn get_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Projects owned by `owner_id`, oldest first.
  fn list_projects<'a>(
    &'a self,
    owner_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + 'a;

  /// Returns `None` if the project does not exist.
  fn update_project(
    &self,
    id: Uuid,
    patch: ProjectPatch,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Delete a project and everything it owns. Returns `false` if it did not
  /// exist.
  fn delete_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Errors with [`crate::Error::ProjectNotFound`] for an unknown project.
  fn project_stats(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<ProjectStats, Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  /// Persist a new record. The draft's project and references must exist.
  fn create<E: Entity>(
    &self,
    draft: E::Draft,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  fn get<E: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Every record of kind `E` in a project, oldest first.
  fn list<E: Entity>(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Apply a partial update. Returns `None` if the record does not exist.
  fn update<E: Entity>(
    &self,
    id: Uuid,
    patch: E::Patch,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Delete a record and its dependents. Returns the deleted record, or
  /// `None` if it did not exist.
  fn delete<E: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  // ── Junctions ─────────────────────────────────────────────────────────

  /// Errors with [`crate::Error::AlreadyLinked`] if the pair exists, and
  /// with a validation error if the two records are in different projects.
  fn link_spell(
    &self,
    character_id: Uuid,
    spell_id: Uuid,
    proficiency: Option<String>,
  ) -> impl Future<Output = Result<CharacterSpell, Self::Error>> + Send + '_;

  fn unlink_spell(
    &self,
    character_id: Uuid,
    spell_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Links for a character, oldest first.
  fn spells_of_character(
    &self,
    character_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CharacterSpell>, Self::Error>> + Send + '_;

  fn link_event_character(
    &self,
    event_id: Uuid,
    character_id: Uuid,
    role: Option<String>,
  ) -> impl Future<Output = Result<EventCharacter, Self::Error>> + Send + '_;

  fn unlink_event_character(
    &self,
    event_id: Uuid,
    character_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn characters_of_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EventCharacter>, Self::Error>> + Send + '_;

  fn events_of_character(
    &self,
    character_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EventCharacter>, Self::Error>> + Send + '_;

  /// Distinct characters who know at least one spell of the system.
  fn characters_using_magic_system(
    &self,
    magic_system_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Character>, Self::Error>> + Send + '_;

  /// Relationship edges with `(kind, id)` at either end.
  fn relationships_of(
    &self,
    kind: EntityKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Ranked text search across a project's records.
  ///
  /// The default scans every wanted kind and matches in memory; rich text
  /// has to be reduced to plain text before matching, so a SQL `LIKE` over
  /// the raw column cannot stand in for it.
  fn search<'a>(
    &'a self,
    project_id: Uuid,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a {
    async move {
      let mut hits = Vec::new();
      if query.needle().is_none() {
        return Ok(hits);
      }
      gather::<_, Character>(self, project_id, query, &mut hits).await?;
      gather::<_, Location>(self, project_id, query, &mut hits).await?;
      gather::<_, Event>(self, project_id, query, &mut hits).await?;
      gather::<_, MagicSystem>(self, project_id, query, &mut hits).await?;
      gather::<_, Spell>(self, project_id, query, &mut hits).await?;
      gather::<_, LoreEntry>(self, project_id, query, &mut hits).await?;
      gather::<_, Note>(self, project_id, query, &mut hits).await?;
      gather::<_, Race>(self, project_id, query, &mut hits).await?;
      gather::<_, Relationship>(self, project_id, query, &mut hits).await?;
      Ok(search::rank(hits, query))
    }
  }

  // ── Activity ──────────────────────────────────────────────────────────

  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<ActivityEntry, Self::Error>> + Send + '_;

  /// Most recent first.
  fn list_activity(
    &self,
    project_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ActivityEntry>, Self::Error>> + Send + '_;

  // ── Uploads ───────────────────────────────────────────────────────────
  //
  // Stored image files are content-addressed, so one file can back uploads
  // from several users and be referenced from any project.

  /// Remember that `owner_id` uploaded the stored file `name`. Idempotent.
  fn claim_upload(
    &self,
    owner_id: String,
    name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Drop `owner_id`'s claim on `name`. Returns `false` if there was none.
  fn release_upload<'a>(
    &'a self,
    owner_id: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Whether any user still claims `name`.
  fn upload_claimed<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Whether any project or record, across every owner, mentions the stored
  /// file `name` in its image URL or rich text.
  fn image_referenced<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

async fn gather<S: WorldStore + ?Sized, E: Entity>(
  store: &S,
  project_id: Uuid,
  query: &SearchQuery,
  hits: &mut Vec<SearchHit>,
) -> Result<(), S::Error> {
  if query.wants(E::KIND) {
    let records = store.list::<E>(project_id).await?;
    search::collect(&records, query, hits);
  }
  Ok(())
}
