//! Behavioural tests for `MemoryStore`; these mirror the SQLite suite so the
//! two backends stay interchangeable.

use mythos_core::{
  EntityKind, Error, Reference,
  link::{NewRelationship, Relationship},
  project::NewProject,
  search::SearchQuery,
  store::WorldStore,
  timeline,
  world::{
    Character, CharacterPatch, Event, LoreEntry, MagicSystem, NewCharacter, NewEvent,
    NewLoreEntry, NewMagicSystem, NewSpell, Spell,
  },
};
use uuid::Uuid;

use crate::{MemoryStore, fixtures};

async fn project(s: &MemoryStore) -> Uuid {
  s.create_project("user-1".into(), NewProject::named("Ashfall"))
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn crud_round_trip() {
  let s = MemoryStore::new();
  let p = project(&s).await;

  let c: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  assert_eq!(s.get::<Character>(c.id).await.unwrap(), Some(c.clone()));
  assert_eq!(s.list::<Character>(p).await.unwrap().len(), 1);

  let patch: CharacterPatch = serde_json::from_str(r#"{"age": "31"}"#).unwrap();
  let updated = s.update::<Character>(c.id, patch).await.unwrap().unwrap();
  assert_eq!(updated.age.as_deref(), Some("31"));
  assert_eq!(updated.name, "Mara");

  assert!(s.delete::<Character>(c.id).await.unwrap().is_some());
  assert!(s.get::<Character>(c.id).await.unwrap().is_none());
}

#[tokio::test]
async fn character_delete_purges_links_on_both_sides() {
  let s = MemoryStore::new();
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let tomas: Character = s.create(NewCharacter::new(p, "Tomas")).await.unwrap();
  let spell: Spell = s.create(NewSpell::new(p, "Kindle", None)).await.unwrap();
  let event: Event = s.create(NewEvent::dated(p, "Duel", 1, 1, 1)).await.unwrap();
  s.link_spell(mara.id, spell.id, None).await.unwrap();
  s.link_event_character(event.id, mara.id, None).await.unwrap();
  let mara_ref = Reference { kind: EntityKind::Character, id: mara.id };
  let tomas_ref = Reference { kind: EntityKind::Character, id: tomas.id };
  s.create::<Relationship>(NewRelationship::between(p, mara_ref, tomas_ref, "rival"))
    .await
    .unwrap();
  s.create::<Relationship>(NewRelationship::between(p, tomas_ref, mara_ref, "owes"))
    .await
    .unwrap();

  s.delete::<Character>(mara.id).await.unwrap().unwrap();

  assert!(s.spells_of_character(mara.id).await.unwrap().is_empty());
  assert!(s.characters_of_event(event.id).await.unwrap().is_empty());
  assert!(s.list::<Relationship>(p).await.unwrap().is_empty());
  assert!(s.get::<Character>(tomas.id).await.unwrap().is_some());
}

#[tokio::test]
async fn magic_system_delete_takes_spells_and_their_links() {
  let s = MemoryStore::new();
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let system: MagicSystem = s.create(NewMagicSystem::new(p, "Emberwork")).await.unwrap();
  let spell: Spell = s.create(NewSpell::new(p, "Kindle", Some(system.id))).await.unwrap();
  s.link_spell(mara.id, spell.id, None).await.unwrap();

  assert_eq!(s.characters_using_magic_system(system.id).await.unwrap().len(), 1);
  s.delete::<MagicSystem>(system.id).await.unwrap().unwrap();

  assert!(s.get::<Spell>(spell.id).await.unwrap().is_none());
  assert!(s.spells_of_character(mara.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn project_delete_empties_every_table() {
  let s = MemoryStore::new();
  let project = fixtures::seed(&s, "user-1").await.unwrap();
  let keep = fixtures::seed(&s, "user-2").await.unwrap();

  let before = s.project_stats(project.id).await.unwrap();
  assert!(before.total() > 0);

  assert!(s.delete_project(project.id).await.unwrap());
  assert!(matches!(
    s.project_stats(project.id).await.unwrap_err(),
    Error::ProjectNotFound(_)
  ));
  for kind in EntityKind::LEAVES {
    assert_eq!(
      s.project_stats(keep.id).await.unwrap().count(kind),
      before.count(kind),
      "{kind} rows of the other project must survive"
    );
  }
  assert!(s.list::<Character>(project.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cross_project_references_are_rejected() {
  let s = MemoryStore::new();
  let home = project(&s).await;
  let away = project(&s).await;
  let foreign: MagicSystem = s.create(NewMagicSystem::new(away, "Elsewhere")).await.unwrap();

  let err = s
    .create::<Spell>(NewSpell::new(home, "Stray", Some(foreign.id)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DanglingReference { .. }));

  let spell: Spell = s.create(NewSpell::new(home, "Homebound", None)).await.unwrap();
  let patch = serde_json::from_value(serde_json::json!({ "magic_system_id": foreign.id })).unwrap();
  let err = s.update::<Spell>(spell.id, patch).await.unwrap_err();
  assert!(matches!(err, Error::DanglingReference { .. }));
  // The failed update left the record untouched.
  assert_eq!(s.get::<Spell>(spell.id).await.unwrap().unwrap().magic_system_id, None);
}

#[tokio::test]
async fn duplicate_links_are_rejected() {
  let s = MemoryStore::new();
  let p = project(&s).await;
  let mara: Character = s.create(NewCharacter::new(p, "Mara")).await.unwrap();
  let event: Event = s.create(NewEvent::dated(p, "Duel", 1, 1, 1)).await.unwrap();

  s.link_event_character(event.id, mara.id, None).await.unwrap();
  let err = s.link_event_character(event.id, mara.id, None).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyLinked { .. }));
  assert_eq!(s.events_of_character(mara.id).await.unwrap().len(), 1);

  assert!(s.unlink_event_character(event.id, mara.id).await.unwrap());
  assert!(s.events_of_character(mara.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn seeded_world_is_searchable_and_has_a_timeline() {
  let s = MemoryStore::new();
  let project = fixtures::seed(&s, "user-1").await.unwrap();

  let hits = s.search(project.id, &SearchQuery::new("bell")).await.unwrap();
  assert_eq!(hits[0].kind, EntityKind::Lore);
  assert_eq!(hits[0].label, "The Drowned Bell");

  // Only the markup-free text is matched.
  assert!(s.search(project.id, &SearchQuery::new("unordered")).await.unwrap().is_empty());

  let lore = s.list::<LoreEntry>(project.id).await.unwrap();
  assert_eq!(lore.len(), 1);

  let events = s.list::<Event>(project.id).await.unwrap();
  let groups = timeline::group_events(&events);
  assert_eq!(groups.len(), 2);
  assert_eq!(groups[0].events[0].title, "The Long Eruption");
}

#[tokio::test]
async fn upload_claims_and_image_mentions() {
  let s = MemoryStore::new();
  let file = "ab12.png";

  s.claim_upload("user-1".into(), file.into()).await.unwrap();
  s.claim_upload("user-1".into(), file.into()).await.unwrap();
  s.claim_upload("user-2".into(), file.into()).await.unwrap();
  assert!(s.release_upload("user-1", file).await.unwrap());
  assert!(!s.release_upload("user-1", file).await.unwrap());
  assert!(s.upload_claimed(file).await.unwrap());
  assert!(s.release_upload("user-2", file).await.unwrap());
  assert!(!s.upload_claimed(file).await.unwrap());

  assert!(!s.image_referenced(file).await.unwrap());
  let theirs = s.create_project("user-2".into(), NewProject::named("Elsewhere")).await.unwrap();
  let lore: LoreEntry = s
    .create(NewLoreEntry {
      project_id: theirs.id,
      title:      "Gallery".into(),
      category:   None,
      content:    Some(format!(
        r#"{{"blocks":[{{"type":"image","data":{{"file":{{"url":"http://x/uploads/{file}"}}}}}}]}}"#
      )),
    })
    .await
    .unwrap();
  assert!(s.image_referenced(file).await.unwrap());
  s.delete::<LoreEntry>(lore.id).await.unwrap();
  assert!(!s.image_referenced(file).await.unwrap());
}
