//! Integration tests for `SqliteStore` against an in-memory database.

use mythos_core::{
  DomainError as _, EntityKind, Error as CoreError, Reference,
  activity::{Action, NewActivity},
  link::{NewRelationship, Relationship},
  project::{NewProject, ProjectPatch},
  search::SearchQuery,
  store::WorldStore,
  world::{
    Character, CharacterPatch, Event, Location, MagicSystem, NewCharacter, NewEvent,
    NewLocation, NewMagicSystem, NewSpell, Spell,
  },
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn project(s: &SqliteStore) -> Uuid {
  s.create_project("user-1".into(), NewProject::named("Ashfall"))
    .await
    .unwrap()
    .id
}

fn location(project_id: Uuid, name: &str) -> NewLocation {
  NewLocation {
    project_id,
    name: name.into(),
    location_type: None,
    region: None,
    climate: None,
    population: None,
    description: None,
    image_url: None,
  }
}

fn domain(e: &Error) -> &CoreError {
  e.domain().expect("domain error")
}

// ─── Projects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn projects_are_listed_per_owner_in_creation_order() {
  let s = store().await;
  let a = s.create_project("user-1".into(), NewProject::named("First")).await.unwrap();
  s.create_project("user-2".into(), NewProject::named("Theirs")).await.unwrap();
  let b = s.create_project("user-1".into(), NewProject::named("Second")).await.unwrap();

  let mine = s.list_projects("user-1").await.unwrap();
  assert_eq!(mine.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id, b.id]);
  assert!(s.list_projects("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn project_patch_touches_only_supplied_fields() {
  let s = store().await;
  let p = s
    .create_project(
      "user-1".into(),
      NewProject { genre: Some("grimdark".into()), ..NewProject::named("Ashfall") },
    )
    .await
    .unwrap();

  let patch: ProjectPatch = serde_json::from_str(r#"{"name": "Ashfall Rising"}"#).unwrap();
  let updated = s.update_project(p.id, patch).await.unwrap().unwrap();
  assert_eq!(updated.name, "Ashfall Rising");
  assert_eq!(updated.genre.as_deref(), Some("grimdark"));
  assert!(updated.updated_at >= p.updated_at);
  assert_eq!(updated.created_at, p.created_at);

  let fetched = s.get_project(p.id).await.unwrap().unwrap();
  assert_eq!(fetched, updated);

  assert!(s.update_project(Uuid::new_v4(), ProjectPatch::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn project_delete_leaves_no_orphans() {
  let s = store().await;
  let p = project(&s).await;

  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let system: MagicSystem = s.create(NewMagicSystem::new(p, "Emberwork")).await.unwrap();
  let spell: Spell = s.create(NewSpell::new(p, "Kindle", Some(system.id))).await.unwrap();
  let event: Event = s.create(NewEvent::dated(p, "The Burning", 1, 2, 3)).await.unwrap();
  let town: Location = s.create(location(p, "Cinderholm")).await.unwrap();
  s.link_spell(mara.id, spell.id, None).await.unwrap();
  s.link_event_character(event.id, mara.id, None).await.unwrap();
  let _: Relationship = s
    .create(NewRelationship::between(
      p,
      Reference { kind: EntityKind::Character, id: mara.id },
      Reference { kind: EntityKind::Location, id: town.id },
      "born in",
    ))
    .await
    .unwrap();

  assert!(s.delete_project(p).await.unwrap());
  assert!(!s.delete_project(p).await.unwrap());

  assert!(s.get_project(p).await.unwrap().is_none());
  assert!(s.get::<Character>(mara.id).await.unwrap().is_none());
  assert!(s.get::<Spell>(spell.id).await.unwrap().is_none());
  assert!(s.list::<Relationship>(p).await.unwrap().is_empty());
  assert!(s.spells_of_character(mara.id).await.unwrap().is_empty());
  assert!(s.characters_of_event(event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn stats_count_every_kind() {
  let s = store().await;
  let p = project(&s).await;
  for name in ["Mara", "Tomas", "Wren"] {
    s.create::<Character>(NewCharacter::new(p, name)).await.unwrap();
  }
  s.create::<Location>(location(p, "Cinderholm")).await.unwrap();

  let stats = s.project_stats(p).await.unwrap();
  assert_eq!(stats.count(EntityKind::Character), 3);
  assert_eq!(stats.count(EntityKind::Location), 1);
  assert_eq!(stats.count(EntityKind::Race), 0);
  assert_eq!(stats.total(), 4);

  let err = s.project_stats(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::ProjectNotFound(_)));
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_requires_an_existing_project() {
  let s = store().await;
  let err = s
    .create::<Character>(NewCharacter::new(Uuid::new_v4(), "Nobody"))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::ProjectNotFound(_)));
}

#[tokio::test]
async fn create_rejects_invalid_drafts() {
  let s = store().await;
  let p = project(&s).await;
  let err = s.create::<Character>(NewCharacter::new(p, "  ")).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation { field: "name", .. }));
}

#[tokio::test]
async fn references_must_stay_inside_the_project() {
  let s = store().await;
  let home = project(&s).await;
  let other = project(&s).await;
  let foreign: MagicSystem = s.create(NewMagicSystem::new(other, "Elsewhere")).await.unwrap();

  let err = s
    .create::<Spell>(NewSpell::new(home, "Stray", Some(foreign.id)))
    .await
    .unwrap_err();
  assert!(matches!(
    domain(&err),
    CoreError::DanglingReference { kind: EntityKind::MagicSystem, .. }
  ));
}

#[tokio::test]
async fn list_is_scoped_and_ordered() {
  let s = store().await;
  let p = project(&s).await;
  let q = project(&s).await;
  for name in ["Zed", "Abel", "Mara"] {
    s.create::<Character>(NewCharacter::new(p, name)).await.unwrap();
  }
  s.create::<Character>(NewCharacter::new(q, "Elsewhere")).await.unwrap();

  let names: Vec<_> = s
    .list::<Character>(p)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, vec!["Zed", "Abel", "Mara"]);
}

#[tokio::test]
async fn update_applies_patch_semantics() {
  let s = store().await;
  let p = project(&s).await;
  let c: Character = s
    .create(NewCharacter { title: Some("Captain".into()), ..NewCharacter::new(p, "Mara") })
    .await
    .unwrap();

  let patch: CharacterPatch =
    serde_json::from_str(r#"{"title": null, "role": "mentor"}"#).unwrap();
  let updated = s.update::<Character>(c.id, patch).await.unwrap().unwrap();
  assert_eq!(updated.name, "Mara");
  assert_eq!(updated.title, None);
  assert_eq!(updated.role.as_deref(), Some("mentor"));

  let fetched = s.get::<Character>(c.id).await.unwrap().unwrap();
  assert_eq!(fetched, updated);

  let missing = s
    .update::<Character>(Uuid::new_v4(), CharacterPatch::default())
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn deleting_a_character_cascades() {
  let s = store().await;
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let tomas: Character = s.create(NewCharacter::new(p, "Tomas")).await.unwrap();
  let spell: Spell = s.create(NewSpell::new(p, "Kindle", None)).await.unwrap();
  let event: Event = s.create(NewEvent::dated(p, "Duel", 1, 1, 1)).await.unwrap();
  s.link_spell(mara.id, spell.id, Some("adept".into())).await.unwrap();
  s.link_event_character(event.id, mara.id, Some("victor".into())).await.unwrap();
  let rivals: Relationship = s
    .create(NewRelationship::between(
      p,
      Reference { kind: EntityKind::Character, id: tomas.id },
      Reference { kind: EntityKind::Character, id: mara.id },
      "rival",
    ))
    .await
    .unwrap();

  let deleted = s.delete::<Character>(mara.id).await.unwrap().unwrap();
  assert_eq!(deleted.id, mara.id);

  assert!(s.spells_of_character(mara.id).await.unwrap().is_empty());
  assert!(s.characters_of_event(event.id).await.unwrap().is_empty());
  assert!(s.get::<Relationship>(rivals.id).await.unwrap().is_none());
  // The other ends survive.
  assert!(s.get::<Spell>(spell.id).await.unwrap().is_some());
  assert!(s.get::<Character>(tomas.id).await.unwrap().is_some());

  assert!(s.delete::<Character>(mara.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_magic_system_takes_its_spells() {
  let s = store().await;
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let system: MagicSystem = s.create(NewMagicSystem::new(p, "Emberwork")).await.unwrap();
  let spell: Spell = s.create(NewSpell::new(p, "Kindle", Some(system.id))).await.unwrap();
  let loose: Spell = s.create(NewSpell::new(p, "Whisper", None)).await.unwrap();
  s.link_spell(mara.id, spell.id, None).await.unwrap();
  let edge: Relationship = s
    .create(NewRelationship::between(
      p,
      Reference { kind: EntityKind::Character, id: mara.id },
      Reference { kind: EntityKind::Spell, id: spell.id },
      "invented",
    ))
    .await
    .unwrap();

  s.delete::<MagicSystem>(system.id).await.unwrap().unwrap();

  assert!(s.get::<Spell>(spell.id).await.unwrap().is_none());
  assert!(s.get::<Spell>(loose.id).await.unwrap().is_some());
  assert!(s.spells_of_character(mara.id).await.unwrap().is_empty());
  assert!(s.get::<Relationship>(edge.id).await.unwrap().is_none());
}

// ─── Junctions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_links_conflict() {
  let s = store().await;
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let spell: Spell = s.create(NewSpell::new(p, "Kindle", None)).await.unwrap();

  s.link_spell(mara.id, spell.id, None).await.unwrap();
  let err = s.link_spell(mara.id, spell.id, None).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::AlreadyLinked { .. }));

  assert!(s.unlink_spell(mara.id, spell.id).await.unwrap());
  assert!(!s.unlink_spell(mara.id, spell.id).await.unwrap());
  s.link_spell(mara.id, spell.id, None).await.unwrap();
}

#[tokio::test]
async fn links_cannot_cross_projects() {
  let s = store().await;
  let p = project(&s).await;
  let q = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let event: Event = s.create(NewEvent::dated(q, "Elsewhere", 1, 1, 1)).await.unwrap();

  let err = s.link_event_character(event.id, mara.id, None).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation { .. }));

  let err = s.link_event_character(Uuid::new_v4(), mara.id, None).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { kind: EntityKind::Event, .. }));
}

#[tokio::test]
async fn magic_system_users_are_distinct() {
  let s = store().await;
  let p = project(&s).await;
  let system: MagicSystem = s.create(NewMagicSystem::new(p, "Emberwork")).await.unwrap();
  let kindle: Spell = s.create(NewSpell::new(p, "Kindle", Some(system.id))).await.unwrap();
  let smother: Spell = s.create(NewSpell::new(p, "Smother", Some(system.id))).await.unwrap();
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let tomas: Character = s.create(NewCharacter::new(p, "Tomas")).await.unwrap();
  s.create::<Character>(NewCharacter::new(p, "Wren")).await.unwrap();

  s.link_spell(mara.id, kindle.id, None).await.unwrap();
  s.link_spell(mara.id, smother.id, None).await.unwrap();
  s.link_spell(tomas.id, smother.id, None).await.unwrap();

  let users: Vec<_> = s
    .characters_using_magic_system(system.id)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(users, vec!["Mara", "Tomas"]);
}

#[tokio::test]
async fn relationships_are_found_from_either_end() {
  let s = store().await;
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let town: Location = s.create(location(p, "Cinderholm")).await.unwrap();
  let mara_ref = Reference { kind: EntityKind::Character, id: mara.id };
  let town_ref = Reference { kind: EntityKind::Location, id: town.id };
  s.create::<Relationship>(NewRelationship::between(p, mara_ref, town_ref, "rules"))
    .await
    .unwrap();

  assert_eq!(s.relationships_of(EntityKind::Character, mara.id).await.unwrap().len(), 1);
  assert_eq!(s.relationships_of(EntityKind::Location, town.id).await.unwrap().len(), 1);
  // Same id under the wrong kind matches nothing.
  assert!(s.relationships_of(EntityKind::Race, town.id).await.unwrap().is_empty());
}

// ─── Search & activity ───────────────────────────────────────────────────────

#[tokio::test]
async fn search_spans_kinds_and_ranks_labels_first() {
  let s = store().await;
  let p = project(&s).await;
  s.create::<Character>(NewCharacter {
    description: Some("Keeper of the ember vaults.".into()),
    ..NewCharacter::new(p, "Mara")
  })
  .await
  .unwrap();
  s.create::<MagicSystem>(NewMagicSystem::new(p, "Emberwork")).await.unwrap();
  s.create::<Location>(location(p, "Cinderholm")).await.unwrap();

  let hits = s.search(p, &SearchQuery::new("ember")).await.unwrap();
  let kinds: Vec<_> = hits.iter().map(|h| h.kind).collect();
  assert_eq!(kinds, vec![EntityKind::MagicSystem, EntityKind::Character]);

  let only_characters = SearchQuery { kinds: vec![EntityKind::Character], ..SearchQuery::new("ember") };
  assert_eq!(s.search(p, &only_characters).await.unwrap().len(), 1);
}

#[tokio::test]
async fn activity_is_newest_first_and_outlives_its_project() {
  let s = store().await;
  let p = project(&s).await;
  for summary in ["one", "two", "three"] {
    s.record_activity(NewActivity {
      user_id:     "user-1".into(),
      project_id:  Some(p),
      action:      Action::Created,
      entity_kind: Some(EntityKind::Note),
      entity_id:   Some(Uuid::new_v4()),
      summary:     summary.into(),
    })
    .await
    .unwrap();
  }

  let recent = s.list_activity(p, 2).await.unwrap();
  assert_eq!(recent.iter().map(|a| a.summary.as_str()).collect::<Vec<_>>(), vec!["three", "two"]);

  s.delete_project(p).await.unwrap();
  assert_eq!(s.list_activity(p, 10).await.unwrap().len(), 3);
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_claims_are_per_owner() {
  let s = store().await;
  let file = "ab12.png";

  s.claim_upload("user-1".into(), file.into()).await.unwrap();
  s.claim_upload("user-1".into(), file.into()).await.unwrap();
  s.claim_upload("user-2".into(), file.into()).await.unwrap();
  assert!(s.release_upload("user-1", file).await.unwrap());
  assert!(!s.release_upload("user-1", file).await.unwrap());
  assert!(s.upload_claimed(file).await.unwrap());
  assert!(s.release_upload("user-2", file).await.unwrap());
  assert!(!s.upload_claimed(file).await.unwrap());
}

#[tokio::test]
async fn image_mentions_span_every_owner() {
  let s = store().await;
  let file = "ab12.png";
  assert!(!s.image_referenced(file).await.unwrap());

  let theirs = s.create_project("user-2".into(), NewProject::named("Elsewhere")).await.unwrap();
  let loc: Location = s
    .create(NewLocation {
      image_url: Some(format!("http://x/uploads/{file}")),
      ..location(theirs.id, "Gallery")
    })
    .await
    .unwrap();
  assert!(s.image_referenced(file).await.unwrap());
  assert!(!s.image_referenced("cd34.png").await.unwrap());

  s.delete::<Location>(loc.id).await.unwrap();
  assert!(!s.image_referenced(file).await.unwrap());

  let patch = ProjectPatch {
    description: Some(Some(format!("see http://x/uploads/{file}"))),
    ..Default::default()
  };
  s.update_project(theirs.id, patch).await.unwrap();
  assert!(s.image_referenced(file).await.unwrap());
}
