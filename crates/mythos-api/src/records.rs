//! Generic handlers for the project-scoped record kinds.
//!
//! Each kind `K` (characters, locations, events, magic-systems, spells, lore,
//! notes, races, relationships) gets the same routes:
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/projects/{id}/K` | Oldest first |
//! | `POST`   | `/K` | Body carries `project_id`; 201 |
//! | `GET`    | `/K/{id}` | |
//! | `PATCH`  | `/K/{id}` | Absent fields untouched, `null` clears |
//! | `DELETE` | `/K/{id}` | 204; cascades |
//! | `GET`    | `/K/{id}/relationships` | Not for relationships themselves |
//! | `GET`    | `/K/{id}/render` | `{html, text}`, kinds with rich text only |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use mythos_core::{
  Entity, Scoped, activity::Action, link::Relationship, store::WorldStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AppState,
  access::{owned_project, owned_record},
  activity::{self, Subject},
  auth::CurrentUser,
  error::ApiError,
  extract::ValidJson,
  uploads,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /projects/{id}/K`
pub async fn list<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<E>>, ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  owned_project(state.store.as_ref(), &user, project_id).await?;
  let records = state
    .store
    .list::<E>(project_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /K`
pub async fn create<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  ValidJson(draft): ValidJson<E::Draft>,
) -> Result<(StatusCode, Json<E>), ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  owned_project(state.store.as_ref(), &user, draft.project_id()).await?;
  let record = state
    .store
    .create::<E>(draft)
    .await
    .map_err(ApiError::from_store)?;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Created,
    Subject::record(record.project_id(), E::KIND, record.id(), record.label()),
  )
  .await;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /K/{id}`
pub async fn get_one<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<E>, ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  let record = owned_record::<S, E>(state.store.as_ref(), &user, id).await?;
  Ok(Json(record))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /K/{id}`
pub async fn update<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  ValidJson(patch): ValidJson<E::Patch>,
) -> Result<Json<E>, ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  let before = owned_record::<S, E>(state.store.as_ref(), &user, id).await?;
  let record = state
    .store
    .update::<E>(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(format!("{} {id}", E::KIND)))?;

  let stale = uploads::dropped(uploads::referenced(&before), &uploads::referenced(&record));
  uploads::discard(state.store.as_ref(), state.images.as_ref(), &user, stale).await;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Updated,
    Subject::record(record.project_id(), E::KIND, record.id(), record.label()),
  )
  .await;
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /K/{id}`
pub async fn delete<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  owned_record::<S, E>(state.store.as_ref(), &user, id).await?;
  let record = state
    .store
    .delete::<E>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(format!("{} {id}", E::KIND)))?;

  let urls = uploads::referenced(&record);
  uploads::discard(state.store.as_ref(), state.images.as_ref(), &user, urls).await;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Deleted,
    Subject::record(record.project_id(), E::KIND, record.id(), record.label()),
  )
  .await;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Relationships ────────────────────────────────────────────────────────────

/// `GET /K/{id}/relationships`: edges with the record at either end.
pub async fn relationships<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  owned_record::<S, E>(state.store.as_ref(), &user, id).await?;
  let edges = state
    .store
    .relationships_of(E::KIND, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edges))
}

// ─── Render ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Rendered {
  pub html: String,
  pub text: String,
}

/// `GET /K/{id}/render`: the record's rich text as sanitised HTML and as
/// plain text. Empty strings when the field is unset.
pub async fn render<S, E>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Rendered>, ApiError>
where
  S: WorldStore + 'static,
  E: Entity,
{
  let record = owned_record::<S, E>(state.store.as_ref(), &user, id).await?;
  let Some(raw) = record.rich_text() else {
    return Ok(Json(Rendered { html: String::new(), text: String::new() }));
  };
  let doc = mythos_blocks::parse_field(raw).map_err(mythos_core::Error::from)?;
  Ok(Json(Rendered {
    html: mythos_blocks::render_html(&doc),
    text: mythos_blocks::plain_text(&doc),
  }))
}
