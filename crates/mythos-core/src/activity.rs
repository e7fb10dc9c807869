//! The activity log: a best-effort audit trail of mutations.
//!
//! Entries carry no foreign keys, so the trail outlives the records (and
//! projects) it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::kind::EntityKind;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Created,
  Updated,
  Deleted,
  Linked,
  Unlinked,
  Uploaded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub id:          Uuid,
  pub user_id:     String,
  pub project_id:  Option<Uuid>,
  pub action:      Action,
  /// `None` for actions not tied to a record (e.g. an image upload).
  pub entity_kind: Option<EntityKind>,
  pub entity_id:   Option<Uuid>,
  /// Human-readable one-liner, e.g. the record's label.
  pub summary:     String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::WorldStore::record_activity`].
#[derive(Debug, Clone)]
pub struct NewActivity {
  pub user_id:     String,
  pub project_id:  Option<Uuid>,
  pub action:      Action,
  pub entity_kind: Option<EntityKind>,
  pub entity_id:   Option<Uuid>,
  pub summary:     String,
}

impl ActivityEntry {
  pub fn new(id: Uuid, input: NewActivity, at: DateTime<Utc>) -> Self {
    Self {
      id,
      user_id: input.user_id,
      project_id: input.project_id,
      action: input.action,
      entity_kind: input.entity_kind,
      entity_id: input.entity_id,
      summary: input.summary,
      created_at: at,
    }
  }
}
