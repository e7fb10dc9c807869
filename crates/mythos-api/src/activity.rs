//! Best-effort activity logging for mutating handlers.

use mythos_core::{
  EntityKind,
  activity::{Action, NewActivity},
  store::WorldStore,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::Identity;

/// What a mutation touched.
pub struct Subject<'a> {
  pub project_id: Option<Uuid>,
  pub kind:       Option<EntityKind>,
  pub id:         Option<Uuid>,
  pub summary:    &'a str,
}

impl<'a> Subject<'a> {
  pub fn record(project_id: Uuid, kind: EntityKind, id: Uuid, summary: &'a str) -> Self {
    Self { project_id: Some(project_id), kind: Some(kind), id: Some(id), summary }
  }
}

/// Append an entry to the activity log. A failure is logged and swallowed;
/// the mutation it describes has already happened.
pub async fn record<S: WorldStore>(store: &S, user: &Identity, action: Action, subject: Subject<'_>) {
  let input = NewActivity {
    user_id:     user.user_id.clone(),
    project_id:  subject.project_id,
    action,
    entity_kind: subject.kind,
    entity_id:   subject.id,
    summary:     subject.summary.to_owned(),
  };
  if let Err(e) = store.record_activity(input).await {
    warn!(error = %e, %action, "failed to record activity");
  }
}
