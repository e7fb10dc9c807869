//! A small sample world for demos and manual testing.
//!
//! Works against any [`WorldStore`], so the server can seed either backend.

use mythos_core::{
  EntityKind, Reference,
  link::{NewRelationship, Relationship},
  project::{NewProject, Project},
  store::WorldStore,
  world::{
    Character, Event, LoreEntry, MagicSystem, NewCharacter, NewEvent, NewLoreEntry,
    NewMagicSystem, NewSpell, Spell,
  },
};
use tracing::info;

const SEA_LORE: &str = r#"{"time":1700000000000,"version":"2.28.0","blocks":[
  {"type":"header","data":{"text":"The Drowned Bell","level":2}},
  {"type":"paragraph","data":{"text":"Fishers swear the bell still <b>tolls</b> beneath the bay on storm nights."}},
  {"type":"list","data":{"style":"unordered","items":["Heard before every great flood","Never heard by the same person twice"]}}
]}"#;

/// Create the "Ashfall" sample project owned by `owner_id`.
pub async fn seed<S: WorldStore>(store: &S, owner_id: &str) -> Result<Project, S::Error> {
  let project = store
    .create_project(
      owner_id.to_owned(),
      NewProject {
        description: Some("A city rebuilt on the cooling flank of a volcano.".into()),
        genre:       Some("fantasy".into()),
        ..NewProject::named("Ashfall")
      },
    )
    .await?;
  let p = project.id;

  let mara: Character = store
    .create(NewCharacter {
      title: Some("Warden of the Ember Gate".into()),
      role: Some("protagonist".into()),
      description: Some("Raised in the ash wastes; trusts fire more than people.".into()),
      ..NewCharacter::new(p, "Mara Vell")
    })
    .await?;
  let tomas: Character = store
    .create(NewCharacter { role: Some("rival".into()), ..NewCharacter::new(p, "Tomas Reed") })
    .await?;

  let emberwork: MagicSystem = store
    .create(NewMagicSystem {
      source: Some("Heat drawn from living stone".into()),
      cost: Some("The caster's own warmth".into()),
      ..NewMagicSystem::new(p, "Emberwork")
    })
    .await?;
  let kindle: Spell = store
    .create(NewSpell { level: Some(1), ..NewSpell::new(p, "Kindle", Some(emberwork.id)) })
    .await?;

  let eruption: Event = store.create(NewEvent::dated(p, "The Long Eruption", 1, 2, 15)).await?;
  let _: Event = store.create(NewEvent::dated(p, "The Ember Pact", 12, 6, 1)).await?;
  let _: LoreEntry = store
    .create(NewLoreEntry {
      project_id: p,
      title:      "The Drowned Bell".into(),
      category:   Some("myth".into()),
      content:    Some(SEA_LORE.into()),
    })
    .await?;

  store.link_spell(mara.id, kindle.id, Some("adept".into())).await?;
  store.link_event_character(eruption.id, mara.id, Some("survivor".into())).await?;
  let _: Relationship = store
    .create(NewRelationship {
      strength: Some(8),
      ..NewRelationship::between(
        p,
        Reference { kind: EntityKind::Character, id: mara.id },
        Reference { kind: EntityKind::Character, id: tomas.id },
        "rival",
      )
    })
    .await?;

  info!(project = %p, owner = owner_id, "seeded sample world");
  Ok(project)
}
