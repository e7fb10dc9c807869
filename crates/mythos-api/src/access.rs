//! Ownership checks.
//!
//! Every record hangs off a project, and a project belongs to one user. A
//! missing row is 404; a row in somebody else's project is 403.

use mythos_core::{Entity, project::Project, store::WorldStore};
use uuid::Uuid;

use crate::{auth::Identity, error::ApiError};

pub async fn owned_project<S: WorldStore>(
  store: &S,
  user: &Identity,
  project_id: Uuid,
) -> Result<Project, ApiError> {
  let project = store
    .get_project(project_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(format!("project {project_id}")))?;
  if project.owner_id != user.user_id {
    return Err(ApiError::Forbidden);
  }
  Ok(project)
}

/// Load a record and check that the caller owns its project.
pub async fn owned_record<S: WorldStore, E: Entity>(
  store: &S,
  user: &Identity,
  id: Uuid,
) -> Result<E, ApiError> {
  let record = store
    .get::<E>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(format!("{} {id}", E::KIND)))?;
  owned_project(store, user, record.project_id()).await?;
  Ok(record)
}
