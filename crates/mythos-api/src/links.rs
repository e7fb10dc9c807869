//! Handlers for the junction tables.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/characters/{id}/spells` | |
//! | `POST`   | `/characters/{id}/spells` | Body: `{"spell_id": ..., "proficiency": ...}`; 409 if linked |
//! | `DELETE` | `/characters/{id}/spells/{spell_id}` | |
//! | `GET`    | `/characters/{id}/events` | |
//! | `GET`    | `/events/{id}/characters` | |
//! | `POST`   | `/events/{id}/characters` | Body: `{"character_id": ..., "role": ...}` |
//! | `DELETE` | `/events/{id}/characters/{character_id}` | |
//! | `GET`    | `/magic-systems/{id}/characters` | Characters knowing any of its spells |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use mythos_core::{
  EntityKind, Result as CoreResult,
  activity::Action,
  link::{CharacterSpell, EventCharacter},
  store::WorldStore,
  validate::{self, Validate},
  world::{Character, Event, MagicSystem},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  access::owned_record,
  activity::{self, Subject},
  auth::CurrentUser,
  error::ApiError,
  extract::ValidJson,
};

// ─── Character ↔ spell ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkSpell {
  pub spell_id:    Uuid,
  pub proficiency: Option<String>,
}

impl Validate for LinkSpell {
  fn validate(&self) -> CoreResult<()> {
    validate::required_if_present("proficiency", self.proficiency.as_ref())
  }
}

/// `GET /characters/{id}/spells`
pub async fn spells_of_character<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<CharacterSpell>>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_record::<S, Character>(state.store.as_ref(), &user, id).await?;
  let links = state
    .store
    .spells_of_character(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(links))
}

/// `POST /characters/{id}/spells`
pub async fn link_spell<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  ValidJson(body): ValidJson<LinkSpell>,
) -> Result<(StatusCode, Json<CharacterSpell>), ApiError>
where
  S: WorldStore + 'static,
{
  let character = owned_record::<S, Character>(state.store.as_ref(), &user, id).await?;
  // The store confines the spell to the character's project.
  let link = state
    .store
    .link_spell(id, body.spell_id, body.proficiency)
    .await
    .map_err(ApiError::from_store)?;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Linked,
    Subject::record(character.project_id, EntityKind::Character, id, &character.name),
  )
  .await;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /characters/{id}/spells/{spell_id}`
pub async fn unlink_spell<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path((id, spell_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: WorldStore + 'static,
{
  let character = owned_record::<S, Character>(state.store.as_ref(), &user, id).await?;
  if !state
    .store
    .unlink_spell(id, spell_id)
    .await
    .map_err(ApiError::from_store)?
  {
    return Err(ApiError::not_found(format!("link {id} -> {spell_id}")));
  }

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Unlinked,
    Subject::record(character.project_id, EntityKind::Character, id, &character.name),
  )
  .await;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /characters/{id}/events`
pub async fn events_of_character<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<EventCharacter>>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_record::<S, Character>(state.store.as_ref(), &user, id).await?;
  let links = state
    .store
    .events_of_character(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(links))
}

// ─── Event ↔ character ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkCharacter {
  pub character_id: Uuid,
  pub role:         Option<String>,
}

impl Validate for LinkCharacter {
  fn validate(&self) -> CoreResult<()> {
    validate::required_if_present("role", self.role.as_ref())
  }
}

/// `GET /events/{id}/characters`
pub async fn characters_of_event<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<EventCharacter>>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_record::<S, Event>(state.store.as_ref(), &user, id).await?;
  let links = state
    .store
    .characters_of_event(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(links))
}

/// `POST /events/{id}/characters`
pub async fn link_character<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  ValidJson(body): ValidJson<LinkCharacter>,
) -> Result<(StatusCode, Json<EventCharacter>), ApiError>
where
  S: WorldStore + 'static,
{
  let event = owned_record::<S, Event>(state.store.as_ref(), &user, id).await?;
  let link = state
    .store
    .link_event_character(id, body.character_id, body.role)
    .await
    .map_err(ApiError::from_store)?;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Linked,
    Subject::record(event.project_id, EntityKind::Event, id, &event.title),
  )
  .await;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /events/{id}/characters/{character_id}`
pub async fn unlink_character<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path((id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: WorldStore + 'static,
{
  let event = owned_record::<S, Event>(state.store.as_ref(), &user, id).await?;
  if !state
    .store
    .unlink_event_character(id, character_id)
    .await
    .map_err(ApiError::from_store)?
  {
    return Err(ApiError::not_found(format!("link {id} -> {character_id}")));
  }

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Unlinked,
    Subject::record(event.project_id, EntityKind::Event, id, &event.title),
  )
  .await;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Magic system ────────────────────────────────────────────────────────────

/// `GET /magic-systems/{id}/characters`
pub async fn characters_of_magic_system<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Character>>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_record::<S, MagicSystem>(state.store.as_ref(), &user, id).await?;
  let characters = state
    .store
    .characters_using_magic_system(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(characters))
}
