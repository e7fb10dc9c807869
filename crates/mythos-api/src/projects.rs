//! Handlers for `/projects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/projects` | The caller's projects |
//! | `POST`   | `/projects` | Owner is the caller; 201 |
//! | `GET`    | `/projects/{id}` | 403 for another user's project |
//! | `PATCH`  | `/projects/{id}` | |
//! | `DELETE` | `/projects/{id}` | 204; takes every record with it |
//! | `GET`    | `/projects/{id}/stats` | Row counts per kind |
//! | `GET`    | `/projects/{id}/search` | `?q=&kinds=a,b&limit=` |
//! | `GET`    | `/projects/{id}/timeline` | `?width=` in pixels |
//! | `GET`    | `/projects/{id}/activity` | `?limit=`, newest first |

use std::str::FromStr as _;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use mythos_core::{
  Entity, EntityKind,
  activity::{Action, ActivityEntry},
  link::Relationship,
  project::{NewProject, Project, ProjectPatch, ProjectStats},
  search::{SearchHit, SearchQuery},
  store::WorldStore,
  timeline::{self, TimelineLayout},
  world::{Character, Event, Location, LoreEntry, MagicSystem, Note, Race, Spell},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  access::owned_project,
  activity::{self, Subject},
  auth::CurrentUser,
  error::ApiError,
  extract::ValidJson,
  uploads,
};

/// Upper bound for `limit` query parameters.
pub const MAX_LIMIT: usize = 200;

/// Viewport width assumed when a timeline request names none.
pub const DEFAULT_TIMELINE_WIDTH: f64 = 1280.0;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

// ─── CRUD ─────────────────────────────────────────────────────────────────────

/// `GET /projects`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Project>>, ApiError>
where
  S: WorldStore + 'static,
{
  let projects = state
    .store
    .list_projects(&user.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(projects))
}

/// `POST /projects`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  ValidJson(body): ValidJson<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError>
where
  S: WorldStore + 'static,
{
  let project = state
    .store
    .create_project(user.user_id.clone(), body)
    .await
    .map_err(ApiError::from_store)?;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Created,
    Subject::record(project.id, EntityKind::Project, project.id, &project.name),
  )
  .await;
  Ok((StatusCode::CREATED, Json(project)))
}

/// `GET /projects/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: WorldStore + 'static,
{
  Ok(Json(owned_project(state.store.as_ref(), &user, id).await?))
}

/// `PATCH /projects/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  ValidJson(patch): ValidJson<ProjectPatch>,
) -> Result<Json<Project>, ApiError>
where
  S: WorldStore + 'static,
{
  let before = owned_project(state.store.as_ref(), &user, id).await?;
  let project = state
    .store
    .update_project(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(format!("project {id}")))?;

  let stale = uploads::dropped(
    uploads::referenced_by_project(&before),
    &uploads::referenced_by_project(&project),
  );
  uploads::discard(state.store.as_ref(), state.images.as_ref(), &user, stale).await;

  activity::record(
    state.store.as_ref(),
    &user,
    Action::Updated,
    Subject::record(project.id, EntityKind::Project, project.id, &project.name),
  )
  .await;
  Ok(Json(project))
}

async fn images_of<S: WorldStore, E: Entity>(
  store: &S,
  project_id: Uuid,
  urls: &mut Vec<String>,
) -> Result<(), ApiError> {
  let records = store.list::<E>(project_id).await.map_err(ApiError::from_store)?;
  urls.extend(records.iter().flat_map(uploads::referenced));
  Ok(())
}

/// `DELETE /projects/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: WorldStore + 'static,
{
  let project = owned_project(state.store.as_ref(), &user, id).await?;

  // Collected up front; the rows are gone once the delete commits.
  let store = state.store.as_ref();
  let mut urls = uploads::referenced_by_project(&project);
  images_of::<S, Character>(store, id, &mut urls).await?;
  images_of::<S, Location>(store, id, &mut urls).await?;
  images_of::<S, Event>(store, id, &mut urls).await?;
  images_of::<S, MagicSystem>(store, id, &mut urls).await?;
  images_of::<S, Spell>(store, id, &mut urls).await?;
  images_of::<S, LoreEntry>(store, id, &mut urls).await?;
  images_of::<S, Note>(store, id, &mut urls).await?;
  images_of::<S, Race>(store, id, &mut urls).await?;
  images_of::<S, Relationship>(store, id, &mut urls).await?;

  if !store.delete_project(id).await.map_err(ApiError::from_store)? {
    return Err(ApiError::not_found(format!("project {id}")));
  }
  uploads::discard(store, state.images.as_ref(), &user, urls).await;

  activity::record(
    store,
    &user,
    Action::Deleted,
    Subject::record(id, EntityKind::Project, id, &project.name),
  )
  .await;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Aggregates ───────────────────────────────────────────────────────────────

/// `GET /projects/{id}/stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ProjectStats>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_project(state.store.as_ref(), &user, id).await?;
  let stats = state.store.project_stats(id).await.map_err(ApiError::from_store)?;
  Ok(Json(stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q:     String,
  /// Comma-separated kinds, e.g. `character,lore`.
  pub kinds: Option<String>,
  pub limit: Option<usize>,
}

impl SearchParams {
  fn into_query(self) -> Result<SearchQuery, ApiError> {
    let kinds = self
      .kinds
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|k| !k.is_empty())
      .map(|k| {
        EntityKind::from_str(k).map_err(|_| ApiError::BadRequest(format!("unknown kind `{k}`")))
      })
      .collect::<Result<Vec<_>, _>>()?;
    Ok(SearchQuery {
      text: self.q,
      kinds,
      limit: self.limit.map(|l| l.min(MAX_LIMIT)),
    })
  }
}

/// `GET /projects/{id}/search`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError>
where
  S: WorldStore + 'static,
{
  let query = params.into_query()?;
  owned_project(state.store.as_ref(), &user, id).await?;
  let hits = state.store.search(id, &query).await.map_err(ApiError::from_store)?;
  Ok(Json(hits))
}

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
  pub width: Option<f64>,
}

/// `GET /projects/{id}/timeline`: the serpentine layout of the project's
/// dated events.
pub async fn timeline<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<TimelineParams>,
) -> Result<Json<TimelineLayout>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_project(state.store.as_ref(), &user, id).await?;
  let events = state.store.list::<Event>(id).await.map_err(ApiError::from_store)?;
  let width = params
    .width
    .filter(|w| w.is_finite())
    .unwrap_or(DEFAULT_TIMELINE_WIDTH);
  Ok(Json(timeline::layout(timeline::group_events(&events), width)))
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
  pub limit: Option<usize>,
}

/// `GET /projects/{id}/activity`
pub async fn activity<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError>
where
  S: WorldStore + 'static,
{
  owned_project(state.store.as_ref(), &user, id).await?;
  let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).min(MAX_LIMIT);
  let entries = state
    .store
    .list_activity(id, limit)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}
